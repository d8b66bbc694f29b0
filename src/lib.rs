// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! write_pixels uploads large images into GPU textures a few rows at a time, so that no single
frame of the host application pays for the whole upload.

A host hands over pixel bytes once, then calls one entry point per frame.  Each call writes at
most a configurable number of rows (256 unless told otherwise) and moves a cursor forward,
until the progress query reports the whole image is in the texture.

# Caches

Upload jobs live in a fixed pool of *caches*, addressed by small integer indices:

| Step     | [Uploader]                  | [HostInterface]           |
|----------|-----------------------------|---------------------------|
| Allocate | [Uploader::allocate_bound], [Uploader::allocate_owned] | index or -1 |
| Queue    | [Uploader::queue]           | `true` / `false`          |
| Advance  | [Uploader::advance]         | logged, nothing returned  |
| Progress | [Uploader::rows_written]    | count or -1               |
| Release  | [Uploader::release]         | nothing returned          |

A cache either writes into a texture the caller already has, or creates (and owns) its own
texture lazily on the first advance.  Owned textures can carry a mip chain that is rebuilt
after every chunk, so a partially uploaded image already looks right at a distance.

The pool never grows.  Running out of caches is an error the host is expected to notice.

# Backends

The engine talks to the GPU through [imp::Backend].  Two implementations ship with the crate:

* [SoftwareBackend] keeps textures in main memory.  It is always compiled, and it is what the
  tests run against.
* [WgpuBackend] (feature `backend_wgpu`, on by default) writes with
  [wgpu::Queue::write_texture] through a device and queue the host attaches at runtime.

# Native plugin

With the `ffi` feature the crate exports a C ABI (`wp_*` functions) over one process-wide
[HostInterface], for hosts that load it as a shared library.
*/

pub mod boundary;
pub mod cache;
pub mod config;
pub mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod imp;
mod mips;
pub mod pending;
pub mod pixel_formats;
pub mod pool;
pub mod uploader;

pub use boundary::HostInterface;
pub use cache::{Advance, ExternalTexture, UploadCache};
pub use config::UploaderConfig;
pub use error::Error;
pub use imp::{Backend, BackendError, SoftwareBackend, TextureHandle, TextureMode};
#[cfg(feature = "backend_wgpu")]
pub use imp::{WgpuBackend, WgpuContext};
pub use pending::PendingBytes;
pub use pixel_formats::{PixelFormat, PixelsMeta};
pub use pool::SlotPool;
pub use uploader::Uploader;
