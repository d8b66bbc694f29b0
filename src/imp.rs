// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Graphics backends.

The upload engine only ever talks to a GPU through [Backend] and [BackendTexture].  The
software backend is always available (it is what the tests run against); the wgpu backend
is behind the `backend_wgpu` feature.
*/

use crate::pixel_formats::{PixelFormat, PixelRows, PixelsMeta};
use std::ffi::c_void;
use std::num::NonZeroUsize;

mod software;
pub use software::{SharedTexture, SoftwareBackend, SoftwareContext, SoftwareTexture};

#[cfg(feature = "backend_wgpu")]
mod wgpu;
#[cfg(feature = "backend_wgpu")]
pub use self::wgpu::{WgpuBackend, WgpuContext, WgpuTexture};

/// How an owned texture will be used once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureMode {
    /// Sampled by shaders, written only by uploads.
    WriteOnly,
    /// Sampled, and may also be rendered into.
    #[default]
    RenderTarget,
    /// Sampled, and may be the source of GPU-side copies.
    GpuOnly,
}

/**
An opaque, pointer-sized handle to a texture or texture view, as passed to and from the host.

The core never dereferences a handle; it only stores and returns it.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TextureHandle(NonZeroUsize);

impl TextureHandle {
    /// `None` for a null pointer.
    pub fn from_ptr(ptr: *const c_void) -> Option<Self> {
        NonZeroUsize::new(ptr.expose_provenance()).map(TextureHandle)
    }

    /// The address of `value`, which must stay put for as long as the handle is handed out.
    pub fn from_ref<T>(value: &T) -> Self {
        let address = std::ptr::from_ref(value).expose_provenance();
        TextureHandle(NonZeroUsize::new(address).unwrap_or(NonZeroUsize::MIN))
    }

    pub const fn from_raw(value: NonZeroUsize) -> Self {
        TextureHandle(value)
    }

    pub const fn get(self) -> usize {
        self.0.get()
    }

    pub fn as_ptr(self) -> *mut c_void {
        std::ptr::with_exposed_provenance_mut(self.0.get())
    }
}

/// Failures reported by a backend while creating or writing a texture.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("Pixel format {0:?} is not supported by this backend")]
    UnsupportedFormat(PixelFormat),
    #[error("Rows {row_first}..{row_last} are outside a texture of height {height}")]
    RowsOutOfBounds {
        row_first: usize,
        row_last: usize,
        height: u32,
    },
    #[error("Texture is {actual:?} but the upload describes {expected:?}")]
    TextureMismatch {
        expected: PixelsMeta,
        actual: PixelsMeta,
    },
    #[error("Texture of {width}x{height} exceeds the device limit of {limit}")]
    ExceedsLimits { width: u32, height: u32, limit: u32 },
}

/**
A texture created and exclusively owned by an upload cache.
*/
pub trait BackendTexture {
    type Context;

    /// Writes `rows` into mip level 0.
    fn write_rows(&mut self, context: &Self::Context, rows: &PixelRows<'_>) -> Result<(), BackendError>;

    /// The handle a host uses to display this texture.  Stable for the texture's lifetime.
    fn display_view(&self) -> TextureHandle;
}

/**
The graphics API as seen by the upload engine.
*/
pub trait Backend {
    /// Whatever the backend needs at hand to touch the GPU.
    type Context;
    /// Textures the engine creates and owns.
    type Texture: BackendTexture<Context = Self::Context>;
    /// Textures supplied by the caller.  The engine writes into them but never destroys them.
    type External;

    /// The current device context, or `None` if the graphics API isn't ready yet.
    fn current_context(&self) -> Option<Self::Context>;

    fn create_texture(
        &self,
        context: &Self::Context,
        meta: &PixelsMeta,
        mode: TextureMode,
        enable_mips: bool,
    ) -> Result<Self::Texture, BackendError>;

    fn write_external(
        &self,
        context: &Self::Context,
        external: &Self::External,
        rows: &PixelRows<'_>,
    ) -> Result<(), BackendError>;

    /// Rebuilds every level below the base from the base level's current contents.
    fn generate_mips(&self, context: &Self::Context, texture: &mut Self::Texture) -> Result<(), BackendError>;
}
