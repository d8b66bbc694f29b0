// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The surface a host calls into.

Hosts speak in plain integers: cache indices are `i32`, failures come back as sentinels
(`-1`, `false`, `None` or nothing at all).  Every operation here logs its failure, names the
operation, and never lets a panic escape.
*/

use crate::config::UploaderConfig;
use crate::error::Error;
use crate::imp::{Backend, TextureHandle};
use crate::pending::PendingBytes;
use crate::pixel_formats::{PixelFormat, PixelsMeta};
use crate::uploader::Uploader;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/**
An [Uploader] behind sentinel-returning, panic-safe operations.
*/
#[derive(Debug)]
pub struct HostInterface<B: Backend> {
    uploader: Uploader<B>,
    poisoned: bool,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn host_meta(width: i32, height: i32, format_code: i32) -> Result<PixelsMeta, Error> {
    if width <= 0 || height <= 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    let format = PixelFormat::from_host_code(format_code).ok_or(Error::UnsupportedFormat(format_code))?;
    let meta = PixelsMeta::new(width as u32, height as u32, format);
    if meta.checked_data_size().is_none() {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(meta)
}

fn host_index(index: i32) -> Result<usize, Error> {
    usize::try_from(index).map_err(|_| Error::InvalidIndex(i64::from(index)))
}

impl<B: Backend> HostInterface<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, UploaderConfig::default())
    }

    pub fn with_config(backend: B, config: UploaderConfig) -> Self {
        Self {
            uploader: Uploader::with_config(backend, config),
            poisoned: false,
        }
    }

    pub fn uploader(&self) -> &Uploader<B> {
        &self.uploader
    }

    pub fn uploader_mut(&mut self) -> &mut Uploader<B> {
        &mut self.uploader
    }

    /// Whether an internal inconsistency has shut this interface down.  Only happens when hardened.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /**
    Runs `f`, turning errors and panics into `sentinel`.
    */
    fn call<T>(
        &mut self,
        name: &'static str,
        sentinel: T,
        f: impl FnOnce(&mut Uploader<B>) -> Result<T, Error>,
    ) -> T {
        let _interval = logwise::perfwarn_begin!("HostInterface::call");
        let result = if self.poisoned {
            Err(Error::PoolPoisoned)
        } else {
            let uploader = &mut self.uploader;
            catch_unwind(AssertUnwindSafe(|| f(uploader)))
                .unwrap_or_else(|payload| Err(Error::Panicked(panic_message(payload.as_ref()))))
        };
        match result {
            Ok(value) => value,
            Err(error) => {
                self.report(name, &error);
                sentinel
            }
        }
    }

    fn report(&mut self, name: &'static str, error: &Error) {
        if error.is_internal() {
            logwise::error_sync!(
                "{name} internal inconsistency: {error}",
                name = name,
                error = logwise::privacy::LogIt(error)
            );
            if self.uploader.config().is_hardened() {
                logwise::error_sync!("Refusing further calls after internal inconsistency");
                self.poisoned = true;
            }
        } else if error.is_transient() {
            logwise::warn_sync!(
                "{name} exception: {error}",
                name = name,
                error = logwise::privacy::LogIt(error)
            );
        } else {
            logwise::error_sync!(
                "{name} exception: {error}",
                name = name,
                error = logwise::privacy::LogIt(error)
            );
        }
    }

    /// Index of a new cache writing into `texture`, or -1.
    pub fn allocate_bound(
        &mut self,
        handle: TextureHandle,
        texture: B::External,
        width: i32,
        height: i32,
        format_code: i32,
    ) -> i32 {
        self.call("allocate_bound", -1, |uploader| {
            let meta = host_meta(width, height, format_code)?;
            let index = uploader.allocate_bound(handle, texture, meta)?;
            Ok(index as i32)
        })
    }

    /// Index of a new cache that creates its own texture, or -1.
    pub fn allocate_owned(&mut self, width: i32, height: i32, format_code: i32, enable_mips: bool) -> i32 {
        self.call("allocate_owned", -1, |uploader| {
            let meta = host_meta(width, height, format_code)?;
            let index = uploader.allocate_owned(meta, enable_mips)?;
            Ok(index as i32)
        })
    }

    pub fn release(&mut self, index: i32) {
        self.call("release", (), |uploader| uploader.release(host_index(index)?))
    }

    /// Copies `bytes` onto a cache.
    pub fn queue_bytes(&mut self, index: i32, bytes: &[u8]) -> bool {
        self.call("queue_bytes", false, |uploader| {
            uploader.queue(host_index(index)?, PendingBytes::owned(bytes))?;
            Ok(true)
        })
    }

    /**
    Queues `len` bytes at `ptr` on a cache without copying.

    A negative `len` is treated as 0.

    # Safety

    As [PendingBytes::borrowed].
    */
    pub unsafe fn queue_bytes_borrowed(&mut self, index: i32, ptr: *const u8, len: i32) -> bool {
        let len = usize::try_from(len).unwrap_or(0);
        //safe per this function's contract
        let bytes = unsafe { PendingBytes::borrowed(ptr, len) };
        self.call("queue_bytes", false, |uploader| {
            uploader.queue(host_index(index)?, bytes)?;
            Ok(true)
        })
    }

    /// Writes the next chunk of rows.  Failures are only logged.
    pub fn advance(&mut self, index: i32) {
        self.call("advance", (), |uploader| {
            uploader.advance(host_index(index)?)?;
            Ok(())
        })
    }

    /// Rows written so far, or -1.
    pub fn rows_written(&mut self, index: i32) -> i32 {
        self.call("rows_written", -1, |uploader| {
            let rows = uploader.rows_written(host_index(index)?)?;
            Ok(i32::try_from(rows).unwrap_or(i32::MAX))
        })
    }

    pub fn has_finished(&mut self, index: i32) -> bool {
        self.call("has_finished", false, |uploader| uploader.has_finished(host_index(index)?))
    }

    /// Values below 1 are treated as 1.
    pub fn set_row_budget(&mut self, index: i32, rows: i32) {
        let rows = usize::try_from(rows).unwrap_or(0);
        self.call("set_row_budget", (), |uploader| {
            uploader.set_row_budget(host_index(index)?, rows)
        })
    }

    pub fn texture_handle(&mut self, index: i32) -> Option<TextureHandle> {
        self.call("texture_handle", None, |uploader| {
            uploader.texture_handle(host_index(index)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imp::SoftwareBackend;

    #[test]
    fn host_meta_validation() {
        assert!(matches!(host_meta(0, 4, 4), Err(Error::InvalidDimensions { width: 0, height: 4 })));
        assert!(matches!(host_meta(4, -1, 4), Err(Error::InvalidDimensions { .. })));
        assert!(matches!(host_meta(4, 4, 999), Err(Error::UnsupportedFormat(999))));
        assert!(matches!(
            host_meta(i32::MAX, i32::MAX, 20),
            Err(Error::InvalidDimensions { .. })
        ));
        let meta = host_meta(3, 2, 4).unwrap();
        assert_eq!(meta.format(), PixelFormat::Rgba8Unorm);
        assert_eq!(meta.bytes_per_row(), 12);
    }

    #[test]
    fn negative_index_is_invalid() {
        assert!(matches!(host_index(-3), Err(Error::InvalidIndex(-3))));
        assert_eq!(host_index(7).unwrap(), 7);
    }

    #[test]
    fn panic_message_extraction() {
        fn boom() -> u8 {
            panic!("boom")
        }
        let payload = catch_unwind(boom).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload = catch_unwind(|| -> u8 { panic!("{} left", 3) }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "3 left");
    }

    #[test]
    fn sentinels() {
        let mut host = HostInterface::new(SoftwareBackend::new());
        assert_eq!(host.allocate_owned(0, 0, 4, false), -1);
        assert_eq!(host.rows_written(-1), -1);
        assert!(!host.queue_bytes(5, &[1]));
        assert!(!host.has_finished(5));
        assert_eq!(host.texture_handle(5), None);
        assert!(!host.is_poisoned());
    }
}
