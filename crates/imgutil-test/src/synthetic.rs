//! Synthetic test image generation.
//!
//! Deterministic patterns for regression tests. Raw generators return
//! tightly packed bytes; the `*_buffer` helpers wrap them in a
//! [`PixelBuffer`].

use imgutil_core::{Palette, PixelBuffer, PixelFormat, Rgba};

/// Generate a solid color RGB image.
pub fn solid_color(width: u32, height: u32, r: u8, g: u8, b: u8) -> Vec<u8> {
    [r, g, b].repeat((width * height) as usize)
}

/// Generate an RGB gradient (red horizontal, green vertical, blue diagonal).
///
/// Has far more than 256 distinct colors for sizes above 16x16.
pub fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            let r = ((x * 255) / width.max(1)) as u8;
            let g = ((y * 255) / height.max(1)) as u8;
            let b = (((x + y) * 127) / (width + height).max(1)) as u8;
            pixels.extend_from_slice(&[r, g, b]);
        }
    }
    pixels
}

/// Generate an RGBA image cycling through `ncolors` distinct colors.
///
/// Colors differ in every channel including alpha, so `ncolors <= 256`
/// yields exactly `min(ncolors, width * height)` distinct values.
pub fn cycling_rgba(width: u32, height: u32, ncolors: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for i in 0..width * height {
        let c = i % ncolors.max(1);
        pixels.extend_from_slice(&[
            (c * 37 % 256) as u8,
            (c * 101 % 256) as u8,
            (c / 256) as u8,
            (255 - c % 256) as u8,
        ]);
    }
    pixels
}

/// Generate a grayscale checkerboard with `cell`-pixel squares.
pub fn checkerboard_gray(width: u32, height: u32, cell: u32, dark: u8, light: u8) -> Vec<u8> {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let on = ((x / cell) + (y / cell)) % 2 == 0;
            pixels.push(if on { dark } else { light });
        }
    }
    pixels
}

/// Wrap tightly packed direct-format bytes in a buffer.
///
/// # Panics
///
/// Panics if `data` does not match the layout.
pub fn direct_buffer(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> PixelBuffer {
    let stride = format.min_stride(width);
    PixelBuffer::from_raw(width, height, format, stride, data).expect("valid synthetic layout")
}

/// An indexed buffer whose pixel at (x, y) holds `(x + y) % palette.len()`.
///
/// `stride_pad` extra bytes are appended to every row, filled with 0xAA so
/// that padding handling is exercised.
///
/// # Panics
///
/// Panics if the palette is empty or larger than the format allows.
pub fn diagonal_indexed(
    width: u32,
    height: u32,
    format: PixelFormat,
    palette: Palette,
    stride_pad: usize,
) -> PixelBuffer {
    let n = palette.len() as u32;
    assert!(n > 0, "palette must not be empty");
    let stride = format.min_stride(width) + stride_pad;
    let data = vec![0xAAu8; stride * height as usize];
    let mut buf =
        PixelBuffer::from_raw(width, height, format, stride, data).expect("valid synthetic layout");
    // Clear the packed part of each row so set_index starts from zero bits.
    let packed = format.min_stride(width);
    for y in 0..height {
        buf.row_mut(y)[..packed].fill(0);
    }
    for y in 0..height {
        for x in 0..width {
            buf.set_index(x, y, ((x + y) % n) as u8)
                .expect("index fits format");
        }
    }
    buf.with_palette(palette).expect("palette fits format")
}

/// A palette of `n` distinct opaque colors.
pub fn distinct_palette(depth: u32, n: usize) -> Palette {
    let colors: Vec<Rgba> = (0..n as u32)
        .map(|i| Rgba::rgb((i * 53 % 256) as u8, (i * 89 % 256) as u8, i as u8))
        .collect();
    Palette::from_colors(depth, &colors).expect("n fits depth")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_cycling_rgba_distinct_count() {
        let px = cycling_rgba(20, 20, 257);
        let set: HashSet<&[u8]> = px.chunks_exact(4).collect();
        assert_eq!(set.len(), 257);
    }

    #[test]
    fn test_diagonal_indexed_padding() {
        let buf = diagonal_indexed(9, 2, PixelFormat::Index1, distinct_palette(1, 2), 1);
        assert_eq!(buf.stride(), 3);
        assert_eq!(buf.row(0)[2], 0xAA);
        assert_eq!(buf.get_index(8, 0), Some(0));
        assert_eq!(buf.get_index(8, 1), Some(1));
    }
}
