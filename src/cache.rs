// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
One upload job: a target texture, the bytes still to be written into it, and a row cursor.

A cache writes at most `row_budget` rows per [UploadCache::write_pixels] call, so a large
image trickles into the texture over several frames instead of stalling one.
*/

use crate::error::Error;
use crate::imp::{Backend, BackendTexture, TextureHandle, TextureMode};
use crate::pending::PendingBytes;
use crate::pixel_formats::{PixelRows, PixelsMeta};
use std::fmt::{Debug, Formatter};

/// A caller-supplied texture and the handle the caller knows it by.
#[derive(Debug)]
pub struct ExternalTexture<T> {
    handle: TextureHandle,
    texture: T,
}

impl<T> ExternalTexture<T> {
    pub fn new(handle: TextureHandle, texture: T) -> Self {
        Self { handle, texture }
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn texture(&self) -> &T {
        &self.texture
    }
}

/// What one [UploadCache::write_pixels] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// First row written by this call.
    pub row_first: usize,
    /// Rows written by this call.  0 once the image is complete.
    pub row_count: usize,
    /// Rows written so far, including this call.
    pub rows_written: usize,
    /// Whether every row of the image has now been written.
    pub finished: bool,
}

pub struct UploadCache<B: Backend> {
    index: usize,
    row_budget: usize,
    enable_mips: bool,
    creating_new_texture: bool,
    owned: Option<B::Texture>,
    external: Option<ExternalTexture<B::External>>,
    meta: PixelsMeta,
    pending: Option<PendingBytes>,
}

impl<B: Backend> UploadCache<B> {
    pub(crate) fn unused(index: usize, row_budget: usize) -> Self {
        Self {
            index,
            row_budget,
            enable_mips: false,
            creating_new_texture: false,
            owned: None,
            external: None,
            meta: PixelsMeta::default(),
            pending: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// A cache is in use while it has a texture, or is waiting to create one.
    pub fn is_used(&self) -> bool {
        self.external.is_some() || self.owned.is_some() || self.creating_new_texture
    }

    pub(crate) fn bind_external(&mut self, external: ExternalTexture<B::External>, meta: PixelsMeta, row_budget: usize) {
        self.external = Some(external);
        self.meta = meta;
        self.enable_mips = false;
        self.row_budget = row_budget;
    }

    /// The texture itself is created on the first write, when a device context is sure to exist.
    pub(crate) fn create_owned(&mut self, meta: PixelsMeta, enable_mips: bool, row_budget: usize) {
        self.creating_new_texture = true;
        self.meta = meta;
        self.enable_mips = enable_mips;
        self.row_budget = row_budget;
    }

    /**
    Drops the owned texture, forgets the external one and discards pending bytes.

    Returns `false` if the cache still reports itself used afterwards.
    */
    #[must_use]
    pub(crate) fn release(&mut self) -> bool {
        self.external = None;
        self.creating_new_texture = false;
        self.owned = None;
        self.pending = None;

        //verify logic
        !self.is_used()
    }

    pub fn meta(&self) -> &PixelsMeta {
        &self.meta
    }

    pub fn row_budget(&self) -> usize {
        self.row_budget
    }

    /// Takes effect from the next write.  0 is treated as 1.
    pub fn set_row_budget(&mut self, rows: usize) {
        self.row_budget = rows.max(1);
    }

    pub fn mips_enabled(&self) -> bool {
        self.enable_mips
    }

    pub fn is_pending_creation(&self) -> bool {
        self.creating_new_texture && self.owned.is_none()
    }

    pub fn owned_texture(&self) -> Option<&B::Texture> {
        self.owned.as_ref()
    }

    pub fn external_texture(&self) -> Option<&ExternalTexture<B::External>> {
        self.external.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingBytes> {
        self.pending.as_ref()
    }

    /// Rows written of the queued bytes.  0 while nothing is queued.
    pub fn rows_written(&self) -> usize {
        self.pending.as_ref().map_or(0, PendingBytes::rows_written)
    }

    pub fn has_finished(&self) -> bool {
        self.rows_written() >= self.meta.height() as usize
    }

    /// The caller's texture, or else our texture's display view, or else nothing yet.
    pub fn texture_handle(&self) -> Option<TextureHandle> {
        if let Some(external) = &self.external {
            return Some(external.handle);
        }
        self.owned.as_ref().map(BackendTexture::display_view)
    }

    /// Replaces any queued bytes and restarts from row 0.
    pub(crate) fn queue(&mut self, bytes: PendingBytes) {
        if let Some(previous) = &self.pending
            && previous.rows_written() < self.meta.height() as usize
        {
            logwise::info_sync!(
                "Cache {index} requeued at row {row}; previous bytes discarded",
                index = self.index,
                row = previous.rows_written()
            );
        }
        self.pending = Some(bytes);
    }

    /**
    Writes the next `row_budget` rows of the queued bytes.

    Creates the owned texture first if this is the cache's first write.  Once every row has
    been written this is a successful no-op.
    */
    pub(crate) fn write_pixels(&mut self, backend: &B, mode: TextureMode) -> Result<Advance, Error> {
        let index = self.index;
        let pending = self.pending.as_mut().ok_or(Error::NoPendingWrite(index))?;
        let context = backend.current_context().ok_or(Error::NoDeviceContext)?;

        //create a new texture if there isn't one
        if self.owned.is_none() && self.external.is_none() {
            logwise::info_sync!(
                "Cache {index} creating {width}x{height} texture",
                index = index,
                width = self.meta.width(),
                height = self.meta.height()
            );
            self.owned = Some(backend.create_texture(&context, &self.meta, mode, self.enable_mips)?);
            self.creating_new_texture = false;
        }

        let row_first = pending.rows_written();
        let row_last = row_first.saturating_add(self.row_budget).min(self.meta.height() as usize);
        let row_count = row_last - row_first;
        if row_count == 0 {
            return Ok(Advance {
                row_first,
                row_count,
                rows_written: row_last,
                finished: true,
            });
        }

        let bytes_per_row = self.meta.bytes_per_row();
        let source = pending.as_slice();
        let needed = row_last.checked_mul(bytes_per_row).unwrap_or(usize::MAX);
        if source.len() < needed {
            return Err(Error::BufferTooShort {
                len: source.len(),
                row_last,
                needed,
            });
        }
        let rows = PixelRows::new(self.meta, row_first, row_count, &source[row_first * bytes_per_row..needed])
            .ok_or(Error::InternalInconsistency(index))?;

        if let Some(texture) = self.owned.as_mut() {
            texture.write_rows(&context, &rows)?;
            if self.enable_mips {
                backend.generate_mips(&context, texture)?;
            }
        } else if let Some(external) = &self.external {
            backend.write_external(&context, &external.texture, &rows)?;
        } else {
            return Err(Error::InternalInconsistency(index));
        }

        pending.advance_to(row_last);
        logwise::trace_sync!(
            "Cache {index} wrote rows {first}..{last} of {height}",
            index = index,
            first = row_first,
            last = row_last,
            height = self.meta.height()
        );
        Ok(Advance {
            row_first,
            row_count,
            rows_written: row_last,
            finished: row_last == self.meta.height() as usize,
        })
    }
}

impl<B: Backend> Debug for UploadCache<B> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCache")
            .field("index", &self.index)
            .field("meta", &self.meta)
            .field("row_budget", &self.row_budget)
            .field("enable_mips", &self.enable_mips)
            .field("creating_new_texture", &self.creating_new_texture)
            .field("owned", &self.owned.is_some())
            .field("external", &self.external.as_ref().map(|e| e.handle))
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::SoftwareBackend;
    use crate::pixel_formats::PixelFormat;

    fn owned_cache(height: u32, budget: usize) -> UploadCache<SoftwareBackend> {
        let mut cache = UploadCache::unused(0, budget);
        cache.create_owned(PixelsMeta::new(2, height, PixelFormat::R8Unorm), false, budget);
        cache
    }

    #[test]
    fn used_predicate_tracks_all_three_fields() {
        let backend = SoftwareBackend::new();
        let mut cache: UploadCache<SoftwareBackend> = UploadCache::unused(3, 256);
        assert!(!cache.is_used());
        cache.create_owned(PixelsMeta::new(1, 1, PixelFormat::R8Unorm), false, 256);
        assert!(cache.is_used());
        assert!(cache.is_pending_creation());

        cache.queue(PendingBytes::owned(vec![1]));
        cache.write_pixels(&backend, TextureMode::default()).unwrap();
        assert!(cache.is_used());
        assert!(!cache.is_pending_creation());
        assert!(cache.owned_texture().is_some());

        assert!(cache.release());
        assert!(!cache.is_used());
        assert!(cache.pending().is_none());
    }

    #[test]
    fn chunk_sizes() {
        let backend = SoftwareBackend::new();
        let mut cache = owned_cache(5, 2);
        cache.queue(PendingBytes::owned(vec![7; 10]));
        let counts: Vec<usize> = (0..4)
            .map(|_| cache.write_pixels(&backend, TextureMode::default()).unwrap().row_count)
            .collect();
        assert_eq!(counts, vec![2, 2, 1, 0]);
        assert!(cache.has_finished());
    }

    #[test]
    fn short_buffer_does_not_move_cursor() {
        let backend = SoftwareBackend::new();
        let mut cache = owned_cache(4, 4);
        cache.queue(PendingBytes::owned(vec![0; 6]));
        assert!(matches!(
            cache.write_pixels(&backend, TextureMode::default()),
            Err(Error::BufferTooShort { needed: 8, .. })
        ));
        assert_eq!(cache.rows_written(), 0);
    }

    #[test]
    fn oversized_image_is_a_short_buffer() {
        let backend = SoftwareBackend::new();
        let meta = PixelsMeta::new(u32::MAX, u32::MAX, PixelFormat::Rgba32Float);
        let mut cache: UploadCache<SoftwareBackend> = UploadCache::unused(0, usize::MAX);
        cache.bind_external(
            ExternalTexture::new(
                TextureHandle::from_raw(std::num::NonZeroUsize::MIN),
                backend.create_shared(PixelsMeta::new(1, 1, PixelFormat::R8Unorm)),
            ),
            meta,
            usize::MAX,
        );
        cache.queue(PendingBytes::owned(vec![0u8; 16]));
        assert!(matches!(
            cache.write_pixels(&backend, TextureMode::default()),
            Err(Error::BufferTooShort {
                needed: usize::MAX,
                ..
            })
        ));
        assert_eq!(cache.rows_written(), 0);
    }

    #[test]
    fn texture_handle_prefers_external() {
        let backend = SoftwareBackend::new();
        let meta = PixelsMeta::new(1, 1, PixelFormat::R8Unorm);
        let shared = backend.create_shared(meta);
        let handle = TextureHandle::from_ref(&*shared);
        let mut cache: UploadCache<SoftwareBackend> = UploadCache::unused(0, 256);
        cache.bind_external(ExternalTexture::new(handle, shared), meta, 256);
        assert_eq!(cache.texture_handle(), Some(handle));
    }
}
