// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
C ABI for hosts that load this crate as a native plugin.

All exports share one process-wide [HostInterface] over a [WgpuBackend].  It is created on
the first call, with no device context, so caches can be allocated and queued before the
host's graphics API is up.  Until a context is attached (with [attach_context] or
[install]) every write fails with "no device context" and is retried on a later frame.

Cache indices are `i32`.  Functions returning an index or a count return -1 on failure,
functions returning `bool` return `false`, and [wp_get_cache_texture] returns null.
*/

use crate::boundary::HostInterface;
use crate::config::UploaderConfig;
use crate::imp::{TextureHandle, WgpuBackend, WgpuContext};
use std::ffi::c_void;
use std::sync::{Mutex, PoisonError};

static HOST: Mutex<Option<HostInterface<WgpuBackend>>> = Mutex::new(None);

fn with_host<T>(f: impl FnOnce(&mut HostInterface<WgpuBackend>) -> T) -> T {
    let mut guard = HOST.lock().unwrap_or_else(PoisonError::into_inner);
    let host = guard.get_or_insert_with(|| {
        logwise::info_sync!("Creating process-wide interface without a device context");
        HostInterface::new(WgpuBackend::new())
    });
    f(host)
}

/// Installs a process-wide interface with the default configuration.
pub fn install(context: WgpuContext) {
    install_with_config(context, UploaderConfig::default())
}

/**
Installs a process-wide interface.

Replaces any interface created before, releasing all of its caches.  To keep existing
caches, use [attach_context] instead.
*/
pub fn install_with_config(context: WgpuContext, config: UploaderConfig) {
    let host = HostInterface::with_config(WgpuBackend::with_context(context), config);
    let previous = HOST.lock().unwrap_or_else(PoisonError::into_inner).replace(host);
    if previous.is_some() {
        logwise::warn_sync!("Replaced the process-wide interface; its caches were released");
    }
}

/**
Makes `context` current for the process-wide interface, keeping its caches.

Returns whether a context was attached before.
*/
pub fn attach_context(context: WgpuContext) -> bool {
    with_host(|host| host.uploader().backend().attach(context).is_some())
}

/// Detaches the current context, as on device loss.  Returns whether one was attached.
pub fn detach_context() -> bool {
    with_host(|host| host.uploader().backend().detach().is_some())
}

/// Drops the process-wide interface and all of its caches.  Returns whether one existed.
pub fn shutdown() -> bool {
    HOST.lock().unwrap_or_else(PoisonError::into_inner).take().is_some()
}

/**
Allocates a cache writing into an existing texture.

A null `texture` allocates a cache that creates its own texture instead, without mips.

# Safety

Unless null, `texture` must point to a live `wgpu::Texture`.  The returned index stays
valid after the pointee is dropped, but the pointer is only read during this call.
*/
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wp_alloc_cache_texture2d(texture: *const c_void, width: i32, height: i32, format: i32) -> i32 {
    let Some(handle) = TextureHandle::from_ptr(texture) else {
        return with_host(|host| host.allocate_owned(width, height, format, false));
    };
    //safe per this function's contract
    let texture = unsafe { &*texture.cast::<wgpu::Texture>() }.clone();
    with_host(|host| host.allocate_bound(handle, texture, width, height, format))
}

/// Allocates a cache that creates its own texture on first write.
#[unsafe(no_mangle)]
pub extern "C" fn wp_alloc_cache_texture(width: i32, height: i32, format: i32, enable_mips: bool) -> i32 {
    with_host(|host| host.allocate_owned(width, height, format, enable_mips))
}

#[unsafe(no_mangle)]
pub extern "C" fn wp_release_cache(index: i32) {
    with_host(|host| host.release(index))
}

/**
Queues `len` bytes at `data` on a cache without copying them.

# Safety

Unless null, `data..data+len` must be readable, and must stay valid and unmodified until
the cache reports it has finished, is queued again, or is released.
*/
#[unsafe(no_mangle)]
pub unsafe extern "C" fn wp_queue_write_pixels(index: i32, data: *const u8, len: i32) -> bool {
    with_host(|host| {
        //safe per this function's contract
        unsafe { host.queue_bytes_borrowed(index, data, len) }
    })
}

/// Writes the next chunk of rows for a cache.  Also the render-thread callback.
#[unsafe(no_mangle)]
pub extern "C" fn wp_write_pixels_to_cache(index: i32) {
    with_host(|host| host.advance(index))
}

#[unsafe(no_mangle)]
pub extern "C" fn wp_get_rows_written(index: i32) -> i32 {
    with_host(|host| host.rows_written(index))
}

#[unsafe(no_mangle)]
pub extern "C" fn wp_has_cache_written_bytes(index: i32) -> bool {
    with_host(|host| host.has_finished(index))
}

#[unsafe(no_mangle)]
pub extern "C" fn wp_set_write_rows_per_frame(index: i32, rows: i32) {
    with_host(|host| host.set_row_budget(index, rows))
}

/// The texture the host should display for a cache, or null if it doesn't exist yet.
#[unsafe(no_mangle)]
pub extern "C" fn wp_get_cache_texture(index: i32) -> *mut c_void {
    with_host(|host| host.texture_handle(index))
        .map_or(std::ptr::null_mut(), TextureHandle::as_ptr)
}

/// For hosts that advance caches through a render-event callback taking the cache index.
#[unsafe(no_mangle)]
pub extern "C" fn wp_get_write_pixels_to_cache_func() -> extern "C" fn(i32) {
    wp_write_pixels_to_cache
}


#[cfg(test)]
mod tests {
    use super::*;

    //the exports share one global, so tests touching it take turns
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> std::sync::MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn context() -> Option<WgpuContext> {
        test_executors::spin_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .ok()?;
            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()?;
            Some(WgpuContext::new(device, queue))
        })
    }

    #[test]
    fn allocates_before_any_context() {
        let _serial = serial();
        shutdown();
        let index = wp_alloc_cache_texture(4, 4, 4, false);
        assert_eq!(index, 0);
        let fallback = unsafe { wp_alloc_cache_texture2d(std::ptr::null(), 4, 4, 4) };
        assert_eq!(fallback, 1);

        let bytes = [7u8; 64];
        assert!(unsafe { wp_queue_write_pixels(index, bytes.as_ptr(), bytes.len() as i32) });
        wp_write_pixels_to_cache(index);
        //no device context: nothing created, nothing written
        assert_eq!(wp_get_rows_written(index), 0);
        assert!(!wp_has_cache_written_bytes(index));
        assert!(wp_get_cache_texture(index).is_null());
        assert!(!detach_context());

        wp_release_cache(index);
        wp_release_cache(fallback);
        assert_eq!(wp_get_rows_written(index), -1);
        assert_eq!(wp_alloc_cache_texture(4, 4, 4, false), 0);
        assert!(shutdown());
    }

    #[test]
    fn invalid_calls_return_sentinels() {
        let _serial = serial();
        shutdown();
        assert_eq!(wp_alloc_cache_texture(0, 4, 4, false), -1);
        assert_eq!(wp_alloc_cache_texture(4, 4, 12345, false), -1);
        assert_eq!(wp_get_rows_written(0), -1);
        assert_eq!(wp_get_rows_written(-2), -1);
        assert!(!wp_has_cache_written_bytes(0));
        assert!(wp_get_cache_texture(0).is_null());
        assert!(!unsafe { wp_queue_write_pixels(0, std::ptr::null(), 0) });
        wp_release_cache(0);
        wp_set_write_rows_per_frame(0, 8);
        wp_get_write_pixels_to_cache_func()(0);
        assert!(shutdown());
        assert!(!shutdown());
    }

    #[test]
    fn callback_drives_upload_once_attached() {
        let _serial = serial();
        shutdown();
        let index = wp_alloc_cache_texture(4, 4, 4, true);
        assert_eq!(index, 0);
        wp_set_write_rows_per_frame(index, 3);
        let bytes: Vec<u8> = (0..64).collect();
        assert!(unsafe { wp_queue_write_pixels(index, bytes.as_ptr(), bytes.len() as i32) });

        let Some(context) = context() else {
            println!("no wgpu adapter; skipping");
            shutdown();
            return;
        };
        assert!(!attach_context(context));

        let callback = wp_get_write_pixels_to_cache_func();
        callback(index);
        assert_eq!(wp_get_rows_written(index), 3);
        assert!(!wp_has_cache_written_bytes(index));
        assert!(!wp_get_cache_texture(index).is_null());
        callback(index);
        assert_eq!(wp_get_rows_written(index), 4);
        assert!(wp_has_cache_written_bytes(index));
        callback(index);
        assert_eq!(wp_get_rows_written(index), 4);

        wp_release_cache(index);
        assert!(wp_get_cache_texture(index).is_null());
        assert!(detach_context());
        assert!(shutdown());
    }

    #[test]
    fn install_replaces_the_interface() {
        let _serial = serial();
        shutdown();
        assert_eq!(wp_alloc_cache_texture(2, 2, 4, false), 0);
        let Some(context) = context() else {
            println!("no wgpu adapter; skipping");
            shutdown();
            return;
        };
        install_with_config(context, UploaderConfig::new().with_capacity(1));
        //earlier caches are gone and the new capacity applies
        assert_eq!(wp_get_rows_written(0), -1);
        assert_eq!(wp_alloc_cache_texture(2, 2, 4, false), 0);
        assert_eq!(wp_alloc_cache_texture(2, 2, 4, false), -1);

        let bytes = [1u8; 16];
        assert!(unsafe { wp_queue_write_pixels(0, bytes.as_ptr(), bytes.len() as i32) });
        wp_write_pixels_to_cache(0);
        assert!(wp_has_cache_written_bytes(0));
        assert!(shutdown());
    }
}
