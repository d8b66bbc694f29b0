// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::pixel_formats::PixelFormat;

/// The wgpu format with the same byte layout, if there is one.
pub(crate) const fn wgpu_format(format: PixelFormat) -> Option<wgpu::TextureFormat> {
    match format {
        PixelFormat::R8Unorm => Some(wgpu::TextureFormat::R8Unorm),
        PixelFormat::Rg8Unorm => Some(wgpu::TextureFormat::Rg8Unorm),
        PixelFormat::Rgba8Unorm => Some(wgpu::TextureFormat::Rgba8Unorm),
        PixelFormat::Bgra8Unorm => Some(wgpu::TextureFormat::Bgra8Unorm),
        PixelFormat::R16Unorm => Some(wgpu::TextureFormat::R16Unorm),
        PixelFormat::R16Float => Some(wgpu::TextureFormat::R16Float),
        PixelFormat::Rg16Float => Some(wgpu::TextureFormat::Rg16Float),
        PixelFormat::Rgba16Float => Some(wgpu::TextureFormat::Rgba16Float),
        PixelFormat::R32Float => Some(wgpu::TextureFormat::R32Float),
        PixelFormat::Rg32Float => Some(wgpu::TextureFormat::Rg32Float),
        PixelFormat::Rgba32Float => Some(wgpu::TextureFormat::Rgba32Float),
        //no 24-bit or alpha-first layouts in wgpu
        PixelFormat::Rgb8Unorm | PixelFormat::Argb8Unorm => None,
    }
}

/// Device features a format needs beyond the defaults.
pub(crate) const fn required_features(format: wgpu::TextureFormat) -> wgpu::Features {
    match format {
        wgpu::TextureFormat::R16Unorm => wgpu::Features::TEXTURE_FORMAT_16BIT_NORM,
        _ => wgpu::Features::empty(),
    }
}
