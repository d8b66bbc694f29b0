// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The upload engine: a pool of caches plus the backend they write through.

An [Uploader] does no locking and starts no threads.  The host drives it by calling
[Uploader::advance] once per frame for each cache it wants to make progress on.
*/

use crate::cache::{Advance, ExternalTexture, UploadCache};
use crate::config::UploaderConfig;
use crate::error::Error;
use crate::imp::{Backend, TextureHandle};
use crate::pending::PendingBytes;
use crate::pixel_formats::PixelsMeta;
use crate::pool::SlotPool;

#[derive(Debug)]
pub struct Uploader<B: Backend> {
    backend: B,
    pool: SlotPool<B>,
    config: UploaderConfig,
}

impl<B: Backend> Uploader<B> {
    /// An uploader with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, UploaderConfig::default())
    }

    pub fn with_config(backend: B, config: UploaderConfig) -> Self {
        logwise::info_sync!(
            "Uploader created with {capacity} caches",
            capacity = config.capacity()
        );
        Self {
            backend,
            pool: SlotPool::new(config.capacity(), config.default_row_budget()),
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    pub fn pool(&self) -> &SlotPool<B> {
        &self.pool
    }

    pub fn cache(&self, index: usize) -> Result<&UploadCache<B>, Error> {
        self.pool.get(index)
    }

    /**
    Allocates a cache that writes into `texture`, which the caller keeps owning.

    `handle` is what [Self::texture_handle] gives back for this cache.
    */
    pub fn allocate_bound(
        &mut self,
        handle: TextureHandle,
        texture: B::External,
        meta: PixelsMeta,
    ) -> Result<usize, Error> {
        let index = self.pool.allocate_bound(ExternalTexture::new(handle, texture), meta)?;
        logwise::info_sync!(
            "Allocated cache {index} for existing texture {meta}",
            index = index,
            meta = logwise::privacy::LogIt(&meta)
        );
        Ok(index)
    }

    /**
    Allocates a cache that creates its own texture.

    The texture is created by the first [Self::advance], so this works before the
    graphics API is up.
    */
    pub fn allocate_owned(&mut self, meta: PixelsMeta, enable_mips: bool) -> Result<usize, Error> {
        let index = self.pool.allocate_owned(meta, enable_mips)?;
        logwise::info_sync!(
            "Allocated cache {index} for new texture {meta} (mips: {mips})",
            index = index,
            meta = logwise::privacy::LogIt(&meta),
            mips = enable_mips
        );
        Ok(index)
    }

    pub fn release(&mut self, index: usize) -> Result<(), Error> {
        self.pool.release(index)?;
        logwise::info_sync!("Released cache {index}", index = index);
        Ok(())
    }

    /// Queues `bytes` on a cache, replacing anything queued before.  Progress restarts at row 0.
    pub fn queue(&mut self, index: usize, bytes: PendingBytes) -> Result<(), Error> {
        self.pool.get_mut(index)?.queue(bytes);
        Ok(())
    }

    /// Copies `bytes` and queues the copy.
    pub fn queue_bytes(&mut self, index: usize, bytes: impl Into<Box<[u8]>>) -> Result<(), Error> {
        self.queue(index, PendingBytes::owned(bytes))
    }

    /**
    Writes the next chunk of rows for one cache.

    On error the cache is left as it was, so the same call can be retried on a later frame
    (which is the point of [Error::NoDeviceContext]).
    */
    pub fn advance(&mut self, index: usize) -> Result<Advance, Error> {
        let _interval = logwise::perfwarn_begin!("Uploader::advance");
        let mode = self.config.texture_mode();
        let cache = self.pool.get_mut(index)?;
        cache.write_pixels(&self.backend, mode)
    }

    pub fn rows_written(&self, index: usize) -> Result<usize, Error> {
        Ok(self.pool.get(index)?.rows_written())
    }

    pub fn has_finished(&self, index: usize) -> Result<bool, Error> {
        Ok(self.pool.get(index)?.has_finished())
    }

    /// Rows per advance from now on.  0 is treated as 1.
    pub fn set_row_budget(&mut self, index: usize, rows: usize) -> Result<(), Error> {
        self.pool.get_mut(index)?.set_row_budget(rows);
        Ok(())
    }

    /// `Ok(None)` for an owned texture that hasn't been created yet.
    pub fn texture_handle(&self, index: usize) -> Result<Option<TextureHandle>, Error> {
        Ok(self.pool.get(index)?.texture_handle())
    }
}
