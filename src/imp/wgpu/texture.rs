// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::wgpu::context::WgpuContext;
use crate::imp::wgpu::pixel_format::{required_features, wgpu_format};
use crate::imp::{BackendError, BackendTexture, TextureHandle, TextureMode};
use crate::mips;
use crate::pixel_formats::{PixelRows, PixelsMeta};
use std::fmt::Debug;
use wgpu::{Extent3d, TexelCopyBufferLayout, TexelCopyTextureInfo};

impl TextureMode {
    /// Converts this mode to the corresponding wgpu texture usage flags.
    pub const fn wgpu_usage(&self) -> wgpu::TextureUsages {
        let base = wgpu::TextureUsages::TEXTURE_BINDING.union(wgpu::TextureUsages::COPY_DST);
        match self {
            TextureMode::WriteOnly => base,
            TextureMode::RenderTarget => base.union(wgpu::TextureUsages::RENDER_ATTACHMENT),
            TextureMode::GpuOnly => base.union(wgpu::TextureUsages::COPY_SRC),
        }
    }
}

/// Writes a run of rows into `level` of `texture` with `Queue::write_texture`.
pub(super) fn write_level_rows(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    level: u32,
    meta: &PixelsMeta,
    row_first: usize,
    row_count: usize,
    data: &[u8],
) {
    logwise::trace_sync!(
        "write_texture level {level} rows {first}+{count}",
        level = level,
        first = row_first,
        count = row_count
    );
    queue.write_texture(
        TexelCopyTextureInfo {
            texture,
            mip_level: level,
            origin: wgpu::Origin3d {
                x: 0,
                y: row_first as u32,
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        TexelCopyBufferLayout {
            offset: 0,
            //write_texture has no row alignment requirement, only copy_buffer_to_texture does
            bytes_per_row: Some(meta.bytes_per_row() as u32),
            rows_per_image: Some(row_count as u32),
        },
        Extent3d {
            width: meta.width(),
            height: row_count as u32,
            depth_or_array_layers: 1,
        },
    );
}

/// Checks that `rows` can be written into `texture` without tripping wgpu validation.
pub(super) fn check_rows(texture: &wgpu::Texture, rows: &PixelRows<'_>) -> Result<(), BackendError> {
    let source = rows.meta();
    let actual = PixelsMeta::new(texture.width(), texture.height(), source.format());
    if texture.width() != source.width() || Some(texture.format()) != wgpu_format(source.format()) {
        return Err(BackendError::TextureMismatch {
            expected: *source,
            actual,
        });
    }
    if rows.row_last() > texture.height() as usize {
        return Err(BackendError::RowsOutOfBounds {
            row_first: rows.row_first(),
            row_last: rows.row_last(),
            height: texture.height(),
        });
    }
    Ok(())
}

/**
A texture created and owned by an upload cache.

When mips are enabled we also keep a CPU copy of the base level, since every chunk
rebuilds the mip chain from whatever has been written so far.
*/
pub struct WgpuTexture {
    texture: wgpu::Texture,
    //boxed so the handle we give out survives moves
    view: Box<wgpu::TextureView>,
    meta: PixelsMeta,
    shadow: Option<Box<[u8]>>,
}

impl Debug for WgpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuTexture")
            .field("texture", &self.texture)
            .field("meta", &self.meta)
            .field("shadow_len", &self.shadow.as_ref().map(|s| s.len()))
            .finish()
    }
}

impl WgpuTexture {
    pub(super) fn new(
        context: &WgpuContext,
        meta: &PixelsMeta,
        mode: TextureMode,
        enable_mips: bool,
    ) -> Result<Self, BackendError> {
        let format = wgpu_format(meta.format()).ok_or(BackendError::UnsupportedFormat(meta.format()))?;
        let device = context.device();
        if !device.features().contains(required_features(format)) {
            return Err(BackendError::UnsupportedFormat(meta.format()));
        }
        let limit = device.limits().max_texture_dimension_2d;
        if meta.width() > limit || meta.height() > limit || meta.width() == 0 || meta.height() == 0 {
            return Err(BackendError::ExceedsLimits {
                width: meta.width(),
                height: meta.height(),
                limit,
            });
        }
        let mip_level_count = if enable_mips { meta.mip_level_count() } else { 1 };
        logwise::info_sync!(
            "Creating {width}x{height} texture with {mips} mip levels",
            width = meta.width(),
            height = meta.height(),
            mips = mip_level_count
        );
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("write_pixels cache texture"),
            size: Extent3d {
                width: meta.width(),
                height: meta.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: mode.wgpu_usage(),
            view_formats: &[],
        });
        let view = Box::new(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        Ok(Self {
            texture,
            view,
            meta: *meta,
            shadow: enable_mips.then(|| vec![0u8; meta.data_size()].into_boxed_slice()),
        })
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(super) fn regenerate_mips(&self, context: &WgpuContext) {
        let Some(shadow) = &self.shadow else {
            return;
        };
        let _interval = logwise::perfwarn_begin!("regenerate mip chain");
        for (level, (meta, data)) in mips::mip_chain(&self.meta, shadow).iter().enumerate() {
            write_level_rows(
                context.queue(),
                &self.texture,
                level as u32 + 1,
                meta,
                0,
                meta.height() as usize,
                data,
            );
        }
    }
}

impl BackendTexture for WgpuTexture {
    type Context = WgpuContext;

    fn write_rows(&mut self, context: &WgpuContext, rows: &PixelRows<'_>) -> Result<(), BackendError> {
        check_rows(&self.texture, rows)?;
        write_level_rows(
            context.queue(),
            &self.texture,
            0,
            rows.meta(),
            rows.row_first(),
            rows.row_count(),
            rows.bytes(),
        );
        if let Some(shadow) = self.shadow.as_mut() {
            let start = rows.row_first() * self.meta.bytes_per_row();
            shadow[start..start + rows.bytes().len()].copy_from_slice(rows.bytes());
        }
        Ok(())
    }

    fn display_view(&self) -> TextureHandle {
        TextureHandle::from_ref(&*self.view)
    }
}
