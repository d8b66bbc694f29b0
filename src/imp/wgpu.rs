// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::{Backend, BackendError, TextureMode};
use crate::pixel_formats::{PixelRows, PixelsMeta};

mod context;
mod pixel_format;
mod texture;

pub use context::WgpuContext;
pub use texture::WgpuTexture;

use context::ContextSlot;

/**
Backend that uploads through a host-supplied wgpu device and queue.

The host attaches its context once its graphics API is up (and may detach it on device
loss).  Row writes go through `Queue::write_texture`, so they land with the host's next
submit.
*/
#[derive(Debug, Default)]
pub struct WgpuBackend {
    context: ContextSlot,
}

impl WgpuBackend {
    /// A backend with no context attached yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: WgpuContext) -> Self {
        Self {
            context: ContextSlot::new(Some(context)),
        }
    }

    /// Makes `context` current.  Returns the previous one.
    pub fn attach(&self, context: WgpuContext) -> Option<WgpuContext> {
        logwise::info_sync!("wgpu context attached");
        self.context.replace(Some(context))
    }

    pub fn detach(&self) -> Option<WgpuContext> {
        logwise::info_sync!("wgpu context detached");
        self.context.replace(None)
    }
}

impl Backend for WgpuBackend {
    type Context = WgpuContext;
    type Texture = WgpuTexture;
    type External = wgpu::Texture;

    fn current_context(&self) -> Option<WgpuContext> {
        self.context.current()
    }

    fn create_texture(
        &self,
        context: &WgpuContext,
        meta: &PixelsMeta,
        mode: TextureMode,
        enable_mips: bool,
    ) -> Result<WgpuTexture, BackendError> {
        WgpuTexture::new(context, meta, mode, enable_mips)
    }

    fn write_external(
        &self,
        context: &WgpuContext,
        external: &wgpu::Texture,
        rows: &PixelRows<'_>,
    ) -> Result<(), BackendError> {
        texture::check_rows(external, rows)?;
        texture::write_level_rows(
            context.queue(),
            external,
            0,
            rows.meta(),
            rows.row_first(),
            rows.row_count(),
            rows.bytes(),
        );
        Ok(())
    }

    fn generate_mips(&self, context: &WgpuContext, texture: &mut WgpuTexture) -> Result<(), BackendError> {
        texture.regenerate_mips(context);
        Ok(())
    }
}
