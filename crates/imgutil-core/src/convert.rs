//! Direct-format conversions
//!
//! Pairwise conversions between RGB24, RGBA32 and GRAY8. The public
//! functions take tightly packed input (`stride == width * bytes-per-pixel`)
//! and return a new buffer with a tight stride. Each one makes a single pass
//! and allocates only the output.
//!
//! Gray values use [`color::luminance`]; alpha is discarded on the way
//! down and synthesized as 255 on the way up.

use crate::color;
use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::pixbuf::PixelBuffer;

/// Handling of packed indices that do not address a palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfRangePolicy {
    /// Use the last palette entry
    #[default]
    Clamp,
    /// Fail with [`Error::IndexOutOfRange`]
    Reject,
}

/// Options for [`PixelBuffer::convert_with`] and indexed unpacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    pub out_of_range: OutOfRangePolicy,
}

impl ConvertOptions {
    /// Options that reject out-of-range indices.
    pub fn strict() -> Self {
        Self {
            out_of_range: OutOfRangePolicy::Reject,
        }
    }
}

/// Drop the alpha channel.
pub fn rgba_to_rgb(data: &[u8], width: u32, height: u32) -> Result<PixelBuffer> {
    convert_direct(data, width as usize * 4, width, height, PixelFormat::Rgba32, PixelFormat::Rgb24)
}

/// Add an opaque alpha channel.
pub fn rgb_to_rgba(data: &[u8], width: u32, height: u32) -> Result<PixelBuffer> {
    convert_direct(data, width as usize * 3, width, height, PixelFormat::Rgb24, PixelFormat::Rgba32)
}

/// Luminance of RGBA pixels; alpha is discarded.
pub fn rgba_to_gray(data: &[u8], width: u32, height: u32) -> Result<PixelBuffer> {
    convert_direct(data, width as usize * 4, width, height, PixelFormat::Rgba32, PixelFormat::Gray8)
}

/// Luminance of RGB pixels.
pub fn rgb_to_gray(data: &[u8], width: u32, height: u32) -> Result<PixelBuffer> {
    convert_direct(data, width as usize * 3, width, height, PixelFormat::Rgb24, PixelFormat::Gray8)
}

/// Replicate gray into R, G, B.
pub fn gray_to_rgb(data: &[u8], width: u32, height: u32) -> Result<PixelBuffer> {
    convert_direct(data, width as usize, width, height, PixelFormat::Gray8, PixelFormat::Rgb24)
}

/// Replicate gray into R, G, B with alpha = 255.
pub fn gray_to_rgba(data: &[u8], width: u32, height: u32) -> Result<PixelBuffer> {
    convert_direct(data, width as usize, width, height, PixelFormat::Gray8, PixelFormat::Rgba32)
}

/// Convert between two direct formats, reading rows at `src_stride`.
///
/// # Errors
///
/// - [`Error::UnsupportedFormat`] unless both formats are RGB24, RGBA32 or
///   GRAY8
/// - [`Error::InvalidStride`] / [`Error::BufferSize`] if the source layout
///   does not fit `data`
pub(crate) fn convert_direct(
    data: &[u8],
    src_stride: usize,
    width: u32,
    height: u32,
    from: PixelFormat,
    to: PixelFormat,
) -> Result<PixelBuffer> {
    use PixelFormat::*;

    let kernel: fn(&[u8], &mut [u8]) = match (from, to) {
        (Rgba32, Rgb24) => |s, d| d.copy_from_slice(&s[..3]),
        (Rgb24, Rgba32) => |s, d| {
            d[..3].copy_from_slice(s);
            d[3] = 255;
        },
        (Rgba32, Gray8) | (Rgb24, Gray8) => |s, d| d[0] = color::luminance(s[0], s[1], s[2]),
        (Gray8, Rgb24) => |s, d| d.fill(s[0]),
        (Gray8, Rgba32) => |s, d| {
            d[..3].fill(s[0]);
            d[3] = 255;
        },
        (Rgb24, Rgb24) | (Rgba32, Rgba32) | (Gray8, Gray8) => |s, d| d.copy_from_slice(s),
        _ => return Err(Error::UnsupportedFormat { from, to }),
    };

    // Both formats are whole-byte here.
    let sbpp = from.bits_per_pixel() as usize / 8;
    let dbpp = to.bits_per_pixel() as usize / 8;
    check_source(data, src_stride, width, height, from)?;

    let mut out = PixelBuffer::new(width, height, to)?;
    let row_bytes = width as usize * sbpp;
    for y in 0..height {
        let start = y as usize * src_stride;
        let src_row = &data[start..start + row_bytes];
        let dst_row = out.row_mut(y);
        for (s, d) in src_row
            .chunks_exact(sbpp)
            .zip(dst_row.chunks_exact_mut(dbpp))
        {
            kernel(s, d);
        }
    }
    Ok(out)
}

/// Verify that `data` holds `height` rows of `width` pixels at `stride`.
///
/// The last row only needs its packed bytes, not the trailing padding.
pub(crate) fn check_source(
    data: &[u8],
    stride: usize,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimension { width, height });
    }
    let min = format.min_stride(width);
    if stride < min {
        return Err(Error::InvalidStride { stride, min });
    }
    let expected = stride * (height as usize - 1) + min;
    if data.len() < expected {
        return Err(Error::BufferSize {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}
