//! Pixel formats
//!
//! A closed set of raster layouts. Direct formats store channel values per
//! pixel; indexed formats store a 1, 2, 4 or 8 bit palette index packed
//! MSB-first into bytes.

use crate::error::{Error, Result};

/// Largest palette any indexed format can address.
pub const MAX_PALETTE_SIZE: usize = 256;

/// Pixel format of a [`PixelBuffer`](crate::PixelBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit R, G, B
    Rgb24,
    /// 8-bit R, G, B, A
    Rgba32,
    /// 8-bit luminance
    Gray8,
    /// 1-bit palette index (2 colors)
    Index1,
    /// 2-bit palette index (4 colors)
    Index2,
    /// 4-bit palette index (16 colors)
    Index4,
    /// 8-bit palette index (256 colors)
    Index8,
    /// One native-endian `f32` sample per pixel
    Float,
}

impl PixelFormat {
    /// All formats, in tag order.
    pub const ALL: [PixelFormat; 8] = [
        PixelFormat::Rgb24,
        PixelFormat::Rgba32,
        PixelFormat::Gray8,
        PixelFormat::Index1,
        PixelFormat::Index2,
        PixelFormat::Index4,
        PixelFormat::Index8,
        PixelFormat::Float,
    ];

    /// Bits used to store one pixel.
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Rgb24 => 24,
            Self::Rgba32 => 32,
            Self::Gray8 => 8,
            Self::Index1 => 1,
            Self::Index2 => 2,
            Self::Index4 => 4,
            Self::Index8 => 8,
            Self::Float => 32,
        }
    }

    /// Whole bytes per pixel, or `None` for sub-byte indexed formats.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self.bits_per_pixel() {
            b if b % 8 == 0 => Some(b as usize / 8),
            _ => None,
        }
    }

    /// Index bit depth for indexed formats.
    pub fn index_bits(self) -> Option<u32> {
        match self {
            Self::Index1 => Some(1),
            Self::Index2 => Some(2),
            Self::Index4 => Some(4),
            Self::Index8 => Some(8),
            Self::Rgb24 | Self::Rgba32 | Self::Gray8 | Self::Float => None,
        }
    }

    /// Check whether pixels are palette indices.
    #[inline]
    pub fn is_indexed(self) -> bool {
        self.index_bits().is_some()
    }

    /// Maximum palette length (`2^bits`) for indexed formats.
    pub fn palette_capacity(self) -> Option<usize> {
        self.index_bits().map(|b| 1usize << b)
    }

    /// Minimum bytes needed for one scanline, rounded up to a byte boundary.
    ///
    /// Uses u64 arithmetic to prevent overflow for large widths.
    pub fn min_stride(self, width: u32) -> usize {
        let bits = u64::from(width) * u64::from(self.bits_per_pixel());
        bits.div_ceil(8) as usize
    }

    /// Create an indexed format from its bit depth.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDepth`] if `bits` is not 1, 2, 4, or 8.
    pub fn from_index_bits(bits: u32) -> Result<Self> {
        match bits {
            1 => Ok(Self::Index1),
            2 => Ok(Self::Index2),
            4 => Ok(Self::Index4),
            8 => Ok(Self::Index8),
            _ => Err(Error::InvalidDepth(bits)),
        }
    }

    /// Smallest indexed format whose capacity holds `ncolors`.
    ///
    /// Preference order is 1, 2, 4, then 8 bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteOverflow`] if `ncolors > 256`.
    pub fn smallest_indexed(ncolors: usize) -> Result<Self> {
        match ncolors {
            0..=2 => Ok(Self::Index1),
            3..=4 => Ok(Self::Index2),
            5..=16 => Ok(Self::Index4),
            17..=MAX_PALETTE_SIZE => Ok(Self::Index8),
            count => Err(Error::PaletteOverflow { count }),
        }
    }

    /// Stable numeric tag used by the canonical stream.
    pub fn tag(self) -> u32 {
        match self {
            Self::Rgb24 => 1,
            Self::Rgba32 => 2,
            Self::Gray8 => 3,
            Self::Index1 => 4,
            Self::Index2 => 5,
            Self::Index4 => 6,
            Self::Index8 => 7,
            Self::Float => 8,
        }
    }

    /// Inverse of [`PixelFormat::tag`].
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }
}
