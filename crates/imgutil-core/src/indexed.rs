//! Indexed (palettized) buffer codec
//!
//! - Unpacking: 1/2/4/8 bpp indices plus a palette to GRAY8, RGB24 or RGBA32
//! - Packing: a direct-color buffer to the smallest indexed format that
//!   reproduces it exactly
//! - Remapping: indices at one depth to indices at another depth through a
//!   lookup table, without touching colors
//!
//! Source rows are located with the caller's stride, which may exceed the
//! packed row width. Packed output always has a tight stride.

use crate::color;
use crate::convert::{OutOfRangePolicy, check_source};
use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::palette::Palette;
use crate::palette::reduce::effective_palette;
use crate::pixbuf::PixelBuffer;
use crate::pixbuf::access::{get_packed, set_packed};

/// Unpack indexed pixels through `palette` into a direct format.
///
/// # Arguments
///
/// * `data` / `stride` - packed rows; row `y` starts at `y * stride`
/// * `bits` - index depth (1, 2, 4 or 8), MSB first within each byte
/// * `target` - [`PixelFormat::Gray8`], [`PixelFormat::Rgb24`] or
///   [`PixelFormat::Rgba32`]
/// * `policy` - what to do with an index `>= palette.len()`
///
/// Gray output takes the luminance of each palette entry.
///
/// # Errors
///
/// - [`Error::InvalidDepth`] for a bad `bits`
/// - [`Error::UnsupportedFormat`] for a non-direct `target`
/// - [`Error::IndexOutOfRange`] for an out-of-range index under
///   [`OutOfRangePolicy::Reject`], or with an empty palette
#[allow(clippy::too_many_arguments)]
pub fn unpack(
    width: u32,
    height: u32,
    data: &[u8],
    stride: usize,
    bits: u32,
    palette: &Palette,
    target: PixelFormat,
    policy: OutOfRangePolicy,
) -> Result<PixelBuffer> {
    let from = PixelFormat::from_index_bits(bits)?;
    let dbpp = match target {
        PixelFormat::Gray8 => 1,
        PixelFormat::Rgb24 => 3,
        PixelFormat::Rgba32 => 4,
        PixelFormat::Index1
        | PixelFormat::Index2
        | PixelFormat::Index4
        | PixelFormat::Index8
        | PixelFormat::Float => return Err(Error::UnsupportedFormat { from, to: target }),
    };
    check_source(data, stride, width, height, from)?;

    // One entry per representable index; None marks an index to reject.
    let colors = palette.colors();
    let last = colors.len().checked_sub(1);
    let lut: Vec<Option<[u8; 4]>> = (0..1usize << bits)
        .map(|i| {
            let entry = match (colors.get(i), policy, last) {
                (Some(c), _, _) => c,
                (None, OutOfRangePolicy::Clamp, Some(last)) => &colors[last],
                (None, _, _) => return None,
            };
            Some(match target {
                PixelFormat::Gray8 => [entry.luminance(), 0, 0, 0],
                _ => [entry.red, entry.green, entry.blue, entry.alpha],
            })
        })
        .collect();

    let mut out = PixelBuffer::new(width, height, target)?;
    let mut clamped = 0usize;
    for y in 0..height {
        let src_row = &data[y as usize * stride..];
        let dst_row = out.row_mut(y);
        for x in 0..width {
            let idx = get_packed(src_row, x, bits) as usize;
            let px = lut[idx].ok_or(Error::IndexOutOfRange {
                index: idx,
                len: colors.len(),
            })?;
            if idx >= colors.len() {
                clamped += 1;
            }
            let off = x as usize * dbpp;
            dst_row[off..off + dbpp].copy_from_slice(&px[..dbpp]);
        }
    }

    if clamped > 0 {
        log::warn!(
            "clamped {clamped} out-of-range indices to palette entry {}",
            colors.len() - 1
        );
    }
    Ok(out)
}

/// Unpack to GRAY8 with the default policy.
pub fn indexed_to_gray(
    width: u32,
    height: u32,
    data: &[u8],
    stride: usize,
    bits: u32,
    palette: &Palette,
) -> Result<PixelBuffer> {
    let policy = OutOfRangePolicy::default();
    unpack(width, height, data, stride, bits, palette, PixelFormat::Gray8, policy)
}

/// Unpack to RGB24 with the default policy.
pub fn indexed_to_rgb(
    width: u32,
    height: u32,
    data: &[u8],
    stride: usize,
    bits: u32,
    palette: &Palette,
) -> Result<PixelBuffer> {
    let policy = OutOfRangePolicy::default();
    unpack(width, height, data, stride, bits, palette, PixelFormat::Rgb24, policy)
}

/// Unpack to RGBA32 with the default policy.
pub fn indexed_to_rgba(
    width: u32,
    height: u32,
    data: &[u8],
    stride: usize,
    bits: u32,
    palette: &Palette,
) -> Result<PixelBuffer> {
    let policy = OutOfRangePolicy::default();
    unpack(width, height, data, stride, bits, palette, PixelFormat::Rgba32, policy)
}

/// Pack a tightly packed direct-color buffer into an indexed one.
///
/// `bytes_per_pixel` selects the source layout: 1 (gray), 3 (RGB) or
/// 4 (RGBA). The result uses the smallest indexed format whose capacity
/// holds the distinct colors, and carries their palette in first-seen
/// order.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] for an unknown `bytes_per_pixel`
/// - [`Error::PaletteOverflow`] with more than 256 distinct colors
///
/// # Examples
///
/// ```
/// use imgutil_core::{PixelFormat, indexed};
///
/// let rgb = [255, 0, 0, 0, 0, 255, 255, 0, 0];
/// let buf = indexed::to_indexed(3, 1, &rgb, 3).unwrap();
/// assert_eq!(buf.format(), PixelFormat::Index1);
/// assert_eq!(buf.palette().unwrap().len(), 2);
/// assert_eq!(buf.data(), &[0b0100_0000]);
/// ```
pub fn to_indexed(
    width: u32,
    height: u32,
    data: &[u8],
    bytes_per_pixel: usize,
) -> Result<PixelBuffer> {
    let from = match bytes_per_pixel {
        1 => PixelFormat::Gray8,
        3 => PixelFormat::Rgb24,
        4 => PixelFormat::Rgba32,
        n => {
            return Err(Error::InvalidParameter(format!(
                "bytes per pixel must be 1, 3 or 4, got {n}"
            )));
        }
    };
    index_direct(data, width as usize * bytes_per_pixel, width, height, from, None)
}

/// Pack a direct buffer read at `stride`.
///
/// With `target == None` the smallest sufficient format is chosen;
/// otherwise the distinct colors must fit `target`.
pub(crate) fn index_direct(
    data: &[u8],
    stride: usize,
    width: u32,
    height: u32,
    from: PixelFormat,
    target: Option<PixelFormat>,
) -> Result<PixelBuffer> {
    let sbpp = match from {
        PixelFormat::Gray8 => 1,
        PixelFormat::Rgb24 => 3,
        PixelFormat::Rgba32 => 4,
        _ => {
            return Err(Error::UnsupportedFormat {
                from,
                to: target.unwrap_or(PixelFormat::Index8),
            });
        }
    };
    check_source(data, stride, width, height, from)?;

    let mut colors = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height as usize {
        let row = &data[y * stride..y * stride + width as usize * sbpp];
        colors.extend(row.chunks_exact(sbpp).map(|p| match p {
            [g] => color::compose_rgb(*g, *g, *g),
            [r, g, b] => color::compose_rgb(*r, *g, *b),
            [r, g, b, a] => color::compose_rgba(*r, *g, *b, *a),
            _ => unreachable!("chunk size fixed by sbpp"),
        }));
    }

    let ep = effective_palette(&colors)?;
    let format = match target {
        None => ep.format(),
        Some(t) => {
            let capacity = t
                .palette_capacity()
                .ok_or(Error::UnsupportedFormat { from, to: t })?;
            if ep.len() > capacity {
                return Err(Error::PaletteOverflow { count: ep.len() });
            }
            t
        }
    };
    let palette = Palette::from_packed(format.bits_per_pixel(), &ep.colors)?;
    log::debug!(
        "packed {}x{} {:?} into {:?} with {} colors",
        width,
        height,
        from,
        format,
        ep.len()
    );
    pack_indices(width, height, &ep.indices, format)?.with_palette(palette)
}

/// Pack one index per pixel (row-major) into an indexed format.
///
/// # Errors
///
/// - [`Error::UnsupportedFormat`] for a direct `target`
/// - [`Error::BufferSize`] if `indices` has fewer than `width * height`
///   entries
/// - [`Error::IndexOutOfRange`] if an index exceeds the target capacity
pub fn pack_indices(
    width: u32,
    height: u32,
    indices: &[u8],
    target: PixelFormat,
) -> Result<PixelBuffer> {
    let (bits, capacity) = match (target.index_bits(), target.palette_capacity()) {
        (Some(b), Some(c)) => (b, c),
        _ => {
            return Err(Error::UnsupportedFormat {
                from: PixelFormat::Index8,
                to: target,
            });
        }
    };
    let mut out = PixelBuffer::new(width, height, target)?;
    let expected = width as usize * height as usize;
    if indices.len() < expected {
        return Err(Error::BufferSize {
            expected,
            actual: indices.len(),
        });
    }
    for (y, row_indices) in indices[..expected]
        .chunks_exact(width as usize)
        .enumerate()
    {
        let row = out.row_mut(y as u32);
        for (x, &idx) in row_indices.iter().enumerate() {
            if idx as usize >= capacity {
                return Err(Error::IndexOutOfRange {
                    index: idx as usize,
                    len: capacity,
                });
            }
            set_packed(row, x as u32, bits, idx);
        }
    }
    Ok(out)
}

/// Repack indices through `remap` into another indexed format.
///
/// Pixel index `i` becomes `remap[i]` at the target depth. No palette is
/// attached to the result; the caller owns the color side.
///
/// # Errors
///
/// - [`Error::InvalidDepth`] for a bad `bits`
/// - [`Error::UnsupportedFormat`] for a direct `target`
/// - [`Error::IndexOutOfRange`] if a source index has no remap entry or a
///   remapped value does not fit the target depth
#[allow(clippy::too_many_arguments)]
pub fn indexed_to_indexed(
    width: u32,
    height: u32,
    data: &[u8],
    stride: usize,
    bits: u32,
    target: PixelFormat,
    remap: &[u8],
) -> Result<PixelBuffer> {
    let from = PixelFormat::from_index_bits(bits)?;
    let (obits, capacity) = match (target.index_bits(), target.palette_capacity()) {
        (Some(b), Some(c)) => (b, c),
        _ => return Err(Error::UnsupportedFormat { from, to: target }),
    };
    check_source(data, stride, width, height, from)?;

    let mut out = PixelBuffer::new(width, height, target)?;
    for y in 0..height {
        let src_row = &data[y as usize * stride..];
        let dst_row = out.row_mut(y);
        for x in 0..width {
            let idx = get_packed(src_row, x, bits) as usize;
            let val = *remap.get(idx).ok_or(Error::IndexOutOfRange {
                index: idx,
                len: remap.len(),
            })?;
            if val as usize >= capacity {
                return Err(Error::IndexOutOfRange {
                    index: val as usize,
                    len: capacity,
                });
            }
            set_packed(dst_row, x, obits, val);
        }
    }
    Ok(out)
}
