// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::pixel_formats::{PixelFormat, PixelsMeta};
use png::{BitDepth, ColorType};

fn png_layout(format: PixelFormat) -> Option<(ColorType, BitDepth)> {
    match format {
        PixelFormat::R8Unorm => Some((ColorType::Grayscale, BitDepth::Eight)),
        PixelFormat::Rg8Unorm => Some((ColorType::GrayscaleAlpha, BitDepth::Eight)),
        PixelFormat::Rgb8Unorm => Some((ColorType::Rgb, BitDepth::Eight)),
        PixelFormat::Rgba8Unorm | PixelFormat::Bgra8Unorm | PixelFormat::Argb8Unorm => {
            Some((ColorType::Rgba, BitDepth::Eight))
        }
        PixelFormat::R16Unorm => Some((ColorType::Grayscale, BitDepth::Sixteen)),
        _ => None,
    }
}

/// Reorders a tightly packed image into the byte order png expects.
fn png_bytes(meta: &PixelsMeta, data: &[u8]) -> Vec<u8> {
    match meta.format() {
        PixelFormat::Bgra8Unorm => data
            .chunks_exact(4)
            .flat_map(|p| [p[2], p[1], p[0], p[3]])
            .collect(),
        PixelFormat::Argb8Unorm => data
            .chunks_exact(4)
            .flat_map(|p| [p[1], p[2], p[3], p[0]])
            .collect(),
        //png is big endian
        PixelFormat::R16Unorm => data.chunks_exact(2).flat_map(|p| [p[1], p[0]]).collect(),
        _ => data.to_vec(),
    }
}

/**
Encodes a tightly packed image as png.

Returns `Ok(None)` for formats png can't represent losslessly (floats).
*/
pub(crate) fn encode(meta: &PixelsMeta, data: &[u8]) -> Result<Option<Vec<u8>>, png::EncodingError> {
    let Some((color_type, bit_depth)) = png_layout(meta.format()) else {
        return Ok(None);
    };
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, meta.width(), meta.height());
        encoder.set_color(color_type);
        encoder.set_depth(bit_depth);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&png_bytes(meta, data))?;
        writer.finish()?;
    }
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_rgba() {
        let meta = PixelsMeta::new(2, 2, PixelFormat::Rgba8Unorm);
        let data = [255u8; 16];
        let png = encode(&meta, &data).unwrap().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn bgra_is_swizzled() {
        let meta = PixelsMeta::new(1, 1, PixelFormat::Bgra8Unorm);
        assert_eq!(png_bytes(&meta, &[1, 2, 3, 4]), vec![3, 2, 1, 4]);
    }

    #[test]
    fn floats_are_skipped() {
        let meta = PixelsMeta::new(1, 1, PixelFormat::R32Float);
        assert!(encode(&meta, &[0; 4]).unwrap().is_none());
    }
}
