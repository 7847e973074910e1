//! BMP image format support
//!
//! Reads and writes uncompressed Windows bitmaps. Indexed bitmaps keep the
//! file's 4-byte-aligned row stride; direct-color bitmaps are reordered from
//! BGR(A) into tightly packed RGB24 / RGBA32.

use crate::{ParseError, ParseResult};
use imgutil_core::{Palette, PixelBuffer, PixelFormat, Rgba};
use std::io::{self, Read, Write};

/// BMP file header size
const BMP_FILE_HEADER_SIZE: usize = 14;

/// BITMAPINFOHEADER size
const BMP_INFO_HEADER_SIZE: u32 = 40;

/// BITMAPV3INFOHEADER size (info header plus RGBA channel masks)
const BMP_V3_HEADER_SIZE: u32 = 56;

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

const RGB_MASKS: [u32; 3] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF];
const ALPHA_MASK: u32 = 0xFF00_0000;

fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn le_i32(b: &[u8], at: usize) -> i32 {
    le_u32(b, at) as i32
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> ParseResult<()> {
    reader
        .read_exact(buf)
        .map_err(|e| ParseError::from_read(e, what))
}

/// Bytes per BMP row: pixel bits rounded up to a 32-bit boundary.
fn row_stride(width: u32, bits: u16) -> usize {
    (width as usize * bits as usize).div_ceil(32) * 4
}

/// Read a BMP image
///
/// Supports 1/2/4/8-bit palette images and 24/32-bit direct color, stored
/// bottom-up or top-down. 32-bit images carry alpha only when the header
/// declares an alpha channel mask; otherwise they are opaque.
///
/// # Errors
///
/// - [`ParseError::MalformedStream`] if the stream ends before the header,
///   palette or pixel data it declares
/// - [`ParseError::UnsupportedFormat`] for RLE compression, OS/2 headers
///   and unusual channel masks
pub fn read_bmp<R: Read>(mut reader: R) -> ParseResult<PixelBuffer> {
    let mut file_header = [0u8; BMP_FILE_HEADER_SIZE];
    read_exact(&mut reader, &mut file_header, "BMP file header")?;
    if &file_header[0..2] != b"BM" {
        return Err(ParseError::MalformedStream("not a BMP file".to_string()));
    }
    let pixel_offset = le_u32(&file_header, 10) as usize;

    let mut info = [0u8; BMP_INFO_HEADER_SIZE as usize];
    read_exact(&mut reader, &mut info, "BMP info header")?;
    let header_size = le_u32(&info, 0);
    if header_size < BMP_INFO_HEADER_SIZE {
        return Err(ParseError::UnsupportedFormat(format!(
            "BMP header size {header_size}"
        )));
    }
    let width = le_i32(&info, 4);
    let height = le_i32(&info, 8);
    let planes = le_u16(&info, 12);
    if planes != 1 {
        return Err(ParseError::MalformedStream(format!(
            "BMP with {planes} planes"
        )));
    }
    let bits = le_u16(&info, 14);
    let compression = le_u32(&info, 16);
    let colors_used = le_u32(&info, 32);

    let mut extra = vec![0u8; (header_size - BMP_INFO_HEADER_SIZE) as usize];
    read_exact(&mut reader, &mut extra, "BMP info header")?;
    let mut consumed = BMP_FILE_HEADER_SIZE + header_size as usize;

    let alpha_mask = match compression {
        BI_RGB => 0,
        BI_BITFIELDS if bits == 32 => {
            let masks = if extra.len() >= 12 {
                let alpha = if extra.len() >= 16 { le_u32(&extra, 12) } else { 0 };
                [le_u32(&extra, 0), le_u32(&extra, 4), le_u32(&extra, 8), alpha]
            } else {
                let mut raw = [0u8; 12];
                read_exact(&mut reader, &mut raw, "BMP channel masks")?;
                consumed += raw.len();
                [le_u32(&raw, 0), le_u32(&raw, 4), le_u32(&raw, 8), 0]
            };
            if masks[..3] != RGB_MASKS {
                return Err(ParseError::UnsupportedFormat(format!(
                    "BMP channel masks {:08X?}",
                    &masks[..3]
                )));
            }
            masks[3]
        }
        _ => {
            return Err(ParseError::UnsupportedFormat(format!(
                "BMP compression {compression} at {bits} bits"
            )));
        }
    };

    let top_down = height < 0;
    let width = width.unsigned_abs();
    let height = height.unsigned_abs();
    if width == 0 || height == 0 {
        return Err(imgutil_core::Error::InvalidDimension { width, height }.into());
    }

    let format = match bits {
        1 => PixelFormat::Index1,
        2 => PixelFormat::Index2,
        4 => PixelFormat::Index4,
        8 => PixelFormat::Index8,
        24 => PixelFormat::Rgb24,
        32 => PixelFormat::Rgba32,
        _ => {
            return Err(ParseError::UnsupportedFormat(format!(
                "BMP bit depth {bits}"
            )));
        }
    };

    let palette = match format.palette_capacity() {
        Some(capacity) => {
            let n = if colors_used == 0 {
                capacity
            } else {
                colors_used as usize
            };
            if n > capacity {
                return Err(ParseError::MalformedStream(format!(
                    "{n} palette entries in a {bits}-bit BMP"
                )));
            }
            let mut raw = vec![0u8; n * 4];
            read_exact(&mut reader, &mut raw, "BMP palette")?;
            consumed += raw.len();
            let colors: Vec<Rgba> = raw
                .chunks_exact(4)
                .map(|c| Rgba::rgb(c[2], c[1], c[0]))
                .collect();
            Some(Palette::from_colors(u32::from(bits), &colors)?)
        }
        None => None,
    };

    if pixel_offset < consumed {
        return Err(ParseError::MalformedStream(format!(
            "BMP pixel offset {pixel_offset} inside {consumed}-byte header"
        )));
    }
    let gap = (pixel_offset - consumed) as u64;
    let skipped = io::copy(&mut (&mut reader).take(gap), &mut io::sink())?;
    if skipped < gap {
        return Err(ParseError::MalformedStream(
            "truncated BMP before pixel data".to_string(),
        ));
    }

    let stride = row_stride(width, bits);
    let size = stride
        .checked_mul(height as usize)
        .ok_or_else(|| ParseError::MalformedStream(format!("BMP size {width}x{height}")))?;
    let mut raster = Vec::new();
    (&mut reader).take(size as u64).read_to_end(&mut raster)?;
    if raster.len() < size {
        return Err(ParseError::MalformedStream(format!(
            "truncated BMP pixel data: {} of {size} bytes",
            raster.len()
        )));
    }

    log::debug!(
        "BMP {}x{} {}-bit, {}",
        width,
        height,
        bits,
        if top_down { "top-down" } else { "bottom-up" }
    );

    if !top_down {
        let h = height as usize;
        for y in 0..h / 2 {
            let (upper, lower) = raster.split_at_mut((h - 1 - y) * stride);
            upper[y * stride..(y + 1) * stride].swap_with_slice(&mut lower[..stride]);
        }
    }

    if let Some(palette) = palette {
        return Ok(PixelBuffer::from_raw(width, height, format, stride, raster)?
            .with_palette(palette)?);
    }

    let mut out = PixelBuffer::new(width, height, format)?;
    for y in 0..height {
        let src = &raster[y as usize * stride..(y as usize + 1) * stride];
        let dst = out.row_mut(y);
        if bits == 24 {
            for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
                d.copy_from_slice(&[s[2], s[1], s[0]]);
            }
        } else {
            for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
                let a = if alpha_mask == ALPHA_MASK { s[3] } else { 255 };
                d.copy_from_slice(&[s[2], s[1], s[0], a]);
            }
        }
    }
    Ok(out)
}

/// Write a BMP image
///
/// Indexed buffers are written with their palette (a default palette when
/// none is attached); GRAY8 becomes an 8-bit image with a linear gray
/// palette; RGB24 becomes 24-bit; RGBA32 becomes 32-bit with an alpha
/// channel mask.
pub fn write_bmp<W: Write>(buf: &PixelBuffer, mut writer: W) -> ParseResult<()> {
    let (width, height, format) = (buf.width(), buf.height(), buf.format());

    let (bits, palette): (u16, Option<Palette>) = match format {
        PixelFormat::Index1 | PixelFormat::Index2 | PixelFormat::Index4 | PixelFormat::Index8 => {
            let palette = match buf.palette() {
                Some(p) => p.clone(),
                None => Palette::default_for(format)?,
            };
            (format.bits_per_pixel() as u16, Some(palette))
        }
        PixelFormat::Gray8 => (8, Some(Palette::create_linear(8)?)),
        PixelFormat::Rgb24 => (24, None),
        PixelFormat::Rgba32 => (32, None),
        PixelFormat::Float => {
            return Err(ParseError::UnsupportedFormat(format!(
                "cannot write {format:?} as BMP"
            )));
        }
    };

    let header_size = if bits == 32 {
        BMP_V3_HEADER_SIZE
    } else {
        BMP_INFO_HEADER_SIZE
    };
    let stride = row_stride(width, bits);
    let pixel_data_size = stride * height as usize;
    let ncolors = palette.as_ref().map_or(0, |p| p.len());
    let pixel_offset = BMP_FILE_HEADER_SIZE + header_size as usize + ncolors * 4;
    let file_size = pixel_offset + pixel_data_size;

    // File header
    writer.write_all(b"BM")?;
    writer.write_all(&(file_size as u32).to_le_bytes())?;
    writer.write_all(&[0u8; 4])?;
    writer.write_all(&(pixel_offset as u32).to_le_bytes())?;

    // Info header, bottom-up
    writer.write_all(&header_size.to_le_bytes())?;
    writer.write_all(&(width as i32).to_le_bytes())?;
    writer.write_all(&(height as i32).to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?;
    writer.write_all(&bits.to_le_bytes())?;
    let compression = if bits == 32 { BI_BITFIELDS } else { BI_RGB };
    writer.write_all(&compression.to_le_bytes())?;
    writer.write_all(&(pixel_data_size as u32).to_le_bytes())?;
    writer.write_all(&0i32.to_le_bytes())?;
    writer.write_all(&0i32.to_le_bytes())?;
    writer.write_all(&(ncolors as u32).to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?;
    if bits == 32 {
        for mask in RGB_MASKS.iter().chain(&[ALPHA_MASK]) {
            writer.write_all(&mask.to_le_bytes())?;
        }
    }

    if let Some(palette) = &palette {
        for c in palette.colors() {
            writer.write_all(&[c.blue, c.green, c.red, 0])?;
        }
    }

    let packed = format.min_stride(width);
    let mut row_buffer = vec![0u8; stride];
    for y in (0..height).rev() {
        let row = &buf.row(y)[..packed];
        match format {
            PixelFormat::Rgb24 => {
                for (s, d) in row.chunks_exact(3).zip(row_buffer.chunks_exact_mut(3)) {
                    d.copy_from_slice(&[s[2], s[1], s[0]]);
                }
            }
            PixelFormat::Rgba32 => {
                for (s, d) in row.chunks_exact(4).zip(row_buffer.chunks_exact_mut(4)) {
                    d.copy_from_slice(&[s[2], s[1], s[0], s[3]]);
                }
            }
            _ => {
                row_buffer[..packed].copy_from_slice(row);
                // Clear bits past the last pixel of the final packed byte
                let used = (width as usize * bits as usize) % 8;
                if used != 0 {
                    row_buffer[packed - 1] &= 0xFFu8 << (8 - used);
                }
            }
        }
        writer.write_all(&row_buffer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bmp_roundtrip_8bit_gray() {
        let data: Vec<u8> = (0..100u32).map(|i| ((i % 10 + i / 10) * 10) as u8).collect();
        let gray = PixelBuffer::from_raw(10, 10, PixelFormat::Gray8, 10, data).unwrap();

        let mut buffer = Vec::new();
        write_bmp(&gray, &mut buffer).unwrap();
        let back = read_bmp(Cursor::new(buffer)).unwrap();

        assert_eq!(back.format(), PixelFormat::Index8);
        assert_eq!(back.width(), 10);
        assert_eq!(back.height(), 10);
        assert_eq!(back.stride(), 12);
        let restored = back.convert(PixelFormat::Gray8).unwrap();
        assert_eq!(restored.data(), gray.data());
    }

    #[test]
    fn test_bmp_roundtrip_24bit() {
        let rgb = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 10, 20, 30];
        let buf = PixelBuffer::from_raw(2, 2, PixelFormat::Rgb24, 6, rgb.clone()).unwrap();

        let mut buffer = Vec::new();
        write_bmp(&buf, &mut buffer).unwrap();
        let back = read_bmp(Cursor::new(buffer)).unwrap();
        assert_eq!(back.format(), PixelFormat::Rgb24);
        assert_eq!(back.data(), rgb.as_slice());
    }

    #[test]
    fn test_bmp_roundtrip_32bit_alpha() {
        let rgba = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 0];
        let buf = PixelBuffer::from_raw(3, 1, PixelFormat::Rgba32, 12, rgba.clone()).unwrap();

        let mut buffer = Vec::new();
        write_bmp(&buf, &mut buffer).unwrap();
        let back = read_bmp(Cursor::new(buffer)).unwrap();
        assert_eq!(back.data(), rgba.as_slice());
    }

    #[test]
    fn test_bmp_1bit_keeps_padded_stride() {
        let pal = Palette::from_colors(1, &[Rgba::gray(0), Rgba::gray(255)]).unwrap();
        let buf = PixelBuffer::from_raw(9, 2, PixelFormat::Index1, 2, vec![0x00, 0x80, 0xFF, 0x00])
            .unwrap()
            .with_palette(pal.clone())
            .unwrap();

        let mut buffer = Vec::new();
        write_bmp(&buf, &mut buffer).unwrap();
        let back = read_bmp(Cursor::new(buffer)).unwrap();

        assert_eq!(back.stride(), 4);
        assert_eq!(back.get_index(8, 0), Some(1));
        assert_eq!(back.get_index(0, 1), Some(1));
        assert_eq!(back.get_index(8, 1), Some(0));
        assert_eq!(back.palette().unwrap().colors(), pal.colors());
        assert!(back.same_pixels(&buf));
    }

    #[test]
    fn test_bmp_truncated_pixel_data() {
        let buf = PixelBuffer::new(4, 4, PixelFormat::Rgb24).unwrap();
        let mut buffer = Vec::new();
        write_bmp(&buf, &mut buffer).unwrap();
        buffer.truncate(buffer.len() - 5);
        assert!(matches!(
            read_bmp(Cursor::new(buffer)),
            Err(ParseError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_bmp_truncated_header() {
        assert!(matches!(
            read_bmp(Cursor::new(b"BM\x00\x00\x00".to_vec())),
            Err(ParseError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_bmp_rejects_rle() {
        let buf = PixelBuffer::new(2, 2, PixelFormat::Gray8).unwrap();
        let mut buffer = Vec::new();
        write_bmp(&buf, &mut buffer).unwrap();
        // BI_RLE8
        buffer[30] = 1;
        assert!(matches!(
            read_bmp(Cursor::new(buffer)),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }
}
