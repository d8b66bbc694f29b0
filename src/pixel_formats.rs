// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Runtime pixel format descriptions.
//!
//! Uploads arrive from a host as raw bytes plus a width, a height and an integer format
//! code, so unlike a compile-time pixel type the format here is a plain value.  Each
//! [`PixelFormat`] encodes:
//!
//! - Number of channels (R, RG, RGB, RGBA and the swizzled BGRA/ARGB orders)
//! - Storage type per channel (8-bit unorm, 16-bit unorm, 16/32-bit float)
//! - The tightly packed row layout that follows from the two
//!
//! [`PixelsMeta`] pairs a format with image dimensions and is fixed for the lifetime of an
//! upload.  [`PixelRows`] describes a run of whole rows of such an image, which is the unit
//! handed to a backend on every write.
//!
//! # Examples
//!
//! ```
//! use write_pixels::pixel_formats::{PixelFormat, PixelsMeta};
//!
//! let meta = PixelsMeta::new(1024, 512, PixelFormat::Rgba8Unorm);
//! assert_eq!(meta.bytes_per_row(), 4096);
//! assert_eq!(meta.data_size(), 4096 * 512);
//! ```

pub(crate) mod png_support;

/// Storage type of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// 8-bit normalized unsigned integer.
    Unorm8,
    /// 16-bit normalized unsigned integer, little endian.
    Unorm16,
    /// IEEE half float, little endian.
    Float16,
    /// IEEE single float, little endian.
    Float32,
}

impl ChannelType {
    /// Size of one channel in bytes.
    pub const fn byte_size(self) -> usize {
        match self {
            ChannelType::Unorm8 => 1,
            ChannelType::Unorm16 | ChannelType::Float16 => 2,
            ChannelType::Float32 => 4,
        }
    }
}

/// Channel layout of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Single 8-bit channel.  Also used for alpha-only images.
    R8Unorm,
    /// Two 8-bit channels.
    Rg8Unorm,
    /// Three 8-bit channels, no padding.
    Rgb8Unorm,
    /// Four 8-bit channels in RGBA order.
    #[default]
    Rgba8Unorm,
    /// Four 8-bit channels in BGRA order.
    Bgra8Unorm,
    /// Four 8-bit channels in ARGB order.
    Argb8Unorm,
    /// Single 16-bit normalized channel.
    R16Unorm,
    /// Single half-float channel.
    R16Float,
    /// Two half-float channels.
    Rg16Float,
    /// Four half-float channels.
    Rgba16Float,
    /// Single float channel.
    R32Float,
    /// Two float channels.
    Rg32Float,
    /// Four float channels.
    Rgba32Float,
}

impl PixelFormat {
    pub const fn channel_count(self) -> usize {
        match self {
            PixelFormat::R8Unorm
            | PixelFormat::R16Unorm
            | PixelFormat::R16Float
            | PixelFormat::R32Float => 1,
            PixelFormat::Rg8Unorm | PixelFormat::Rg16Float | PixelFormat::Rg32Float => 2,
            PixelFormat::Rgb8Unorm => 3,
            PixelFormat::Rgba8Unorm
            | PixelFormat::Bgra8Unorm
            | PixelFormat::Argb8Unorm
            | PixelFormat::Rgba16Float
            | PixelFormat::Rgba32Float => 4,
        }
    }

    pub const fn channel_type(self) -> ChannelType {
        match self {
            PixelFormat::R8Unorm
            | PixelFormat::Rg8Unorm
            | PixelFormat::Rgb8Unorm
            | PixelFormat::Rgba8Unorm
            | PixelFormat::Bgra8Unorm
            | PixelFormat::Argb8Unorm => ChannelType::Unorm8,
            PixelFormat::R16Unorm => ChannelType::Unorm16,
            PixelFormat::R16Float | PixelFormat::Rg16Float | PixelFormat::Rgba16Float => {
                ChannelType::Float16
            }
            PixelFormat::R32Float | PixelFormat::Rg32Float | PixelFormat::Rgba32Float => {
                ChannelType::Float32
            }
        }
    }

    pub const fn bytes_per_pixel(self) -> usize {
        self.channel_count() * self.channel_type().byte_size()
    }

    /**
    Maps a host engine's texture-format code to a pixel format.

    The codes are the ones the managed host passes through the C ABI alongside a native
    texture pointer.  Compressed and packed 16-bit formats (4444, 565) have no row layout
    we can write incrementally and return `None`.
    */
    pub const fn from_host_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(PixelFormat::R8Unorm), //alpha8
            3 => Some(PixelFormat::Rgb8Unorm),
            4 => Some(PixelFormat::Rgba8Unorm),
            5 => Some(PixelFormat::Argb8Unorm),
            9 => Some(PixelFormat::R16Unorm),
            14 => Some(PixelFormat::Bgra8Unorm),
            15 => Some(PixelFormat::R16Float),
            16 => Some(PixelFormat::Rg16Float),
            17 => Some(PixelFormat::Rgba16Float),
            18 => Some(PixelFormat::R32Float),
            19 => Some(PixelFormat::Rg32Float),
            20 => Some(PixelFormat::Rgba32Float),
            62 => Some(PixelFormat::Rg8Unorm),
            63 => Some(PixelFormat::R8Unorm),
            _ => None,
        }
    }
}

/// Width, height and format of an image.  Fixed for the lifetime of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelsMeta {
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl PixelsMeta {
    pub const fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
        }
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Tightly packed bytes per row.
    pub const fn bytes_per_row(&self) -> usize {
        (self.width as usize).saturating_mul(self.format.bytes_per_pixel())
    }

    /// Bytes in a complete image.
    ///
    /// Saturates at `usize::MAX`; see [Self::checked_data_size].
    pub const fn data_size(&self) -> usize {
        self.bytes_per_row().saturating_mul(self.height as usize)
    }

    /// Bytes in a complete image, or `None` if that doesn't fit in a `usize`.
    pub const fn checked_data_size(&self) -> Option<usize> {
        match (self.width as usize).checked_mul(self.format.bytes_per_pixel()) {
            Some(bytes_per_row) => bytes_per_row.checked_mul(self.height as usize),
            None => None,
        }
    }

    /// Number of levels in a full mip chain, including the base level.
    pub fn mip_level_count(&self) -> u32 {
        self.width.max(self.height).max(1).ilog2() + 1
    }

    /// Dimensions of mip `level`.  Each axis halves and bottoms out at 1.
    pub fn mip_level(&self, level: u32) -> PixelsMeta {
        let shrink = |v: u32| v.checked_shr(level).unwrap_or(0).max(1);
        PixelsMeta::new(shrink(self.width), shrink(self.height), self.format)
    }
}

/**
A run of whole rows of an image, as handed to a backend for one write.

`bytes` holds exactly `row_count` tightly packed rows, the first of which lands on
texture row `row_first`.
*/
#[derive(Debug, Clone, Copy)]
pub struct PixelRows<'a> {
    meta: PixelsMeta,
    row_first: usize,
    row_count: usize,
    bytes: &'a [u8],
}

impl<'a> PixelRows<'a> {
    /// Returns `None` if `bytes` is not exactly `row_count` rows of `meta`.
    pub fn new(meta: PixelsMeta, row_first: usize, row_count: usize, bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() != row_count * meta.bytes_per_row() {
            return None;
        }
        Some(Self {
            meta,
            row_first,
            row_count,
            bytes,
        })
    }

    pub fn meta(&self) -> &PixelsMeta {
        &self.meta
    }

    pub fn row_first(&self) -> usize {
        self.row_first
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// One past the last row written.
    pub fn row_last(&self) -> usize {
        self.row_first + self.row_count
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterates `(texture_row, row_bytes)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &'a [u8])> + 'a {
        let first = self.row_first;
        let bytes_per_row = self.meta.bytes_per_row().max(1);
        self.bytes
            .chunks_exact(bytes_per_row)
            .enumerate()
            .map(move |(i, row)| (first + i, row))
    }
}
