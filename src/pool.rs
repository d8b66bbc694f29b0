// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A fixed number of upload caches, addressed by index.

The pool never grows.  Allocation is first-fit, so released low indices are handed out again
before higher ones.
*/

use crate::cache::{ExternalTexture, UploadCache};
use crate::error::Error;
use crate::imp::Backend;
use crate::pixel_formats::PixelsMeta;

#[derive(Debug)]
pub struct SlotPool<B: Backend> {
    caches: Vec<UploadCache<B>>,
    default_row_budget: usize,
}

impl<B: Backend> SlotPool<B> {
    pub fn new(capacity: usize, default_row_budget: usize) -> Self {
        Self {
            caches: (0..capacity)
                .map(|index| UploadCache::unused(index, default_row_budget))
                .collect(),
            default_row_budget,
        }
    }

    pub fn capacity(&self) -> usize {
        self.caches.len()
    }

    /**
    Finds the lowest unused cache.

    The cache only counts as used once the caller has bound or marked a texture on it, so
    this must be followed directly by that assignment.
    */
    fn allocate(&mut self) -> Result<(usize, &mut UploadCache<B>), Error> {
        let capacity = self.caches.len();
        self.caches
            .iter_mut()
            .enumerate()
            .find(|(_, cache)| !cache.is_used())
            .ok_or(Error::PoolExhausted { capacity })
    }

    /// Allocates a cache that writes into a texture the caller already has.
    pub fn allocate_bound(&mut self, external: ExternalTexture<B::External>, meta: PixelsMeta) -> Result<usize, Error> {
        let row_budget = self.default_row_budget;
        let (index, cache) = self.allocate()?;
        cache.bind_external(external, meta, row_budget);
        Ok(index)
    }

    /// Allocates a cache that creates its own texture on first write.
    pub fn allocate_owned(&mut self, meta: PixelsMeta, enable_mips: bool) -> Result<usize, Error> {
        let row_budget = self.default_row_budget;
        let (index, cache) = self.allocate()?;
        cache.create_owned(meta, enable_mips, row_budget);
        Ok(index)
    }

    fn check_index(&self, index: usize) -> Result<(), Error> {
        if index >= self.caches.len() {
            return Err(Error::InvalidIndex(index as i64));
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&UploadCache<B>, Error> {
        self.check_index(index)?;
        let cache = &self.caches[index];
        if !cache.is_used() {
            return Err(Error::NotAllocated(index));
        }
        Ok(cache)
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut UploadCache<B>, Error> {
        self.check_index(index)?;
        let cache = &mut self.caches[index];
        if !cache.is_used() {
            return Err(Error::NotAllocated(index));
        }
        Ok(cache)
    }

    /**
    Releases a cache, dropping any texture it created.

    Releasing an unused cache is allowed and changes nothing.
    */
    pub fn release(&mut self, index: usize) -> Result<(), Error> {
        self.check_index(index)?;
        let cache = &mut self.caches[index];
        if !cache.is_used() {
            logwise::warn_sync!("Releasing cache {index} which is not allocated", index = index);
        }
        if !cache.release() {
            return Err(Error::InternalInconsistency(index));
        }
        cache.set_row_budget(self.default_row_budget);
        Ok(())
    }

    pub fn in_use_count(&self) -> usize {
        self.caches.iter().filter(|cache| cache.is_used()).count()
    }

    /// Indices of allocated caches, ascending.
    pub fn allocated(&self) -> impl Iterator<Item = usize> + '_ {
        self.caches
            .iter()
            .filter(|cache| cache.is_used())
            .map(UploadCache::index)
    }
}
