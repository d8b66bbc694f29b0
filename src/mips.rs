// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
CPU mip chain generation.

Each level is a 2x2 box filter of the level above.  Odd edges clamp to the last
row/column, so a 1-pixel-wide level keeps halving along the other axis only.
*/

use crate::pixel_formats::{ChannelType, PixelsMeta};
use half::f16;

/// Average four pixels channel by channel into `dst`.
fn average_into(channel: ChannelType, samples: [&[u8]; 4], dst: &mut [u8]) {
    let size = channel.byte_size();
    for (c, out) in dst.chunks_exact_mut(size).enumerate() {
        let at = c * size;
        match channel {
            ChannelType::Unorm8 => {
                let sum: u32 = samples.iter().map(|s| s[at] as u32).sum();
                out[0] = (sum / 4) as u8;
            }
            ChannelType::Unorm16 => {
                let sum: u32 = samples
                    .iter()
                    .map(|s| u16::from_le_bytes([s[at], s[at + 1]]) as u32)
                    .sum();
                out.copy_from_slice(&((sum / 4) as u16).to_le_bytes());
            }
            ChannelType::Float16 => {
                let sum: f32 = samples
                    .iter()
                    .map(|s| f16::from_le_bytes([s[at], s[at + 1]]).to_f32())
                    .sum();
                out.copy_from_slice(&f16::from_f32(sum / 4.0).to_le_bytes());
            }
            ChannelType::Float32 => {
                let sum: f32 = samples
                    .iter()
                    .map(|s| f32::from_le_bytes([s[at], s[at + 1], s[at + 2], s[at + 3]]))
                    .sum();
                out.copy_from_slice(&(sum / 4.0).to_le_bytes());
            }
        }
    }
}

/// Produces the next mip level of `src`, which must be a complete image of `meta`.
pub(crate) fn downsample(meta: &PixelsMeta, src: &[u8]) -> (PixelsMeta, Vec<u8>) {
    let next = meta.mip_level(1);
    let bytes_per_pixel = meta.format().bytes_per_pixel();
    let src_width = meta.width().max(1) as usize;
    let src_height = meta.height().max(1) as usize;
    let src_row = meta.bytes_per_row();
    let channel = meta.format().channel_type();

    let mut dst = vec![0u8; next.data_size()];
    if src.len() < meta.data_size() || bytes_per_pixel == 0 {
        return (next, dst);
    }
    let dst_row = next.bytes_per_row();
    for y in 0..next.height() as usize {
        let y0 = (y * 2).min(src_height - 1);
        let y1 = (y * 2 + 1).min(src_height - 1);
        for x in 0..next.width() as usize {
            let x0 = (x * 2).min(src_width - 1);
            let x1 = (x * 2 + 1).min(src_width - 1);
            let pixel = |px: usize, py: usize| {
                let offset = py * src_row + px * bytes_per_pixel;
                &src[offset..offset + bytes_per_pixel]
            };
            let samples = [pixel(x0, y0), pixel(x1, y0), pixel(x0, y1), pixel(x1, y1)];
            let offset = y * dst_row + x * bytes_per_pixel;
            average_into(channel, samples, &mut dst[offset..offset + bytes_per_pixel]);
        }
    }
    (next, dst)
}

/// Every level below the base, largest first.
pub(crate) fn mip_chain(meta: &PixelsMeta, base: &[u8]) -> Vec<(PixelsMeta, Vec<u8>)> {
    let levels = meta.mip_level_count() as usize;
    let mut chain: Vec<(PixelsMeta, Vec<u8>)> = Vec::with_capacity(levels.saturating_sub(1));
    for _ in 1..levels {
        let next = match chain.last() {
            Some((prev_meta, prev)) => downsample(prev_meta, prev),
            None => downsample(meta, base),
        };
        chain.push(next);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_formats::PixelFormat;

    #[test]
    fn rgba_box_filter() {
        let meta = PixelsMeta::new(2, 2, PixelFormat::Rgba8Unorm);
        let src = [
            0, 0, 0, 255, 100, 0, 0, 255, //row 0
            0, 200, 0, 255, 0, 0, 40, 255, //row 1
        ];
        let (next, dst) = downsample(&meta, &src);
        assert_eq!(next, PixelsMeta::new(1, 1, PixelFormat::Rgba8Unorm));
        assert_eq!(dst, vec![25, 50, 10, 255]);
    }

    #[test]
    fn odd_edges_clamp() {
        let meta = PixelsMeta::new(1, 4, PixelFormat::R8Unorm);
        let (next, dst) = downsample(&meta, &[10, 20, 30, 50]);
        assert_eq!(next, PixelsMeta::new(1, 2, PixelFormat::R8Unorm));
        assert_eq!(dst, vec![15, 40]);
    }

    #[test]
    fn half_float_average() {
        let meta = PixelsMeta::new(2, 1, PixelFormat::R16Float);
        let mut src = Vec::new();
        src.extend_from_slice(&f16::from_f32(1.0).to_le_bytes());
        src.extend_from_slice(&f16::from_f32(3.0).to_le_bytes());
        let (_, dst) = downsample(&meta, &src);
        assert_eq!(f16::from_le_bytes([dst[0], dst[1]]).to_f32(), 2.0);
    }

    #[test]
    fn chain_reaches_one_by_one() {
        let meta = PixelsMeta::new(8, 2, PixelFormat::Rgba32Float);
        let base = vec![0u8; meta.data_size()];
        let chain = mip_chain(&meta, &base);
        let sizes: Vec<(u32, u32)> = chain.iter().map(|(m, _)| (m.width(), m.height())).collect();
        assert_eq!(sizes, vec![(4, 1), (2, 1), (1, 1)]);
        for (m, data) in &chain {
            assert_eq!(data.len(), m.data_size());
        }
    }
}
