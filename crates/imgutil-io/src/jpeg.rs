//! JPEG image format support
//!
//! Reads baseline and progressive JPEGs with `jpeg-decoder` and writes them
//! with `jpeg-encoder`.

use crate::{ParseError, ParseResult};
use imgutil_core::{PixelBuffer, PixelFormat};
use std::io::{Read, Write};

/// Quality used by [`crate::encode_mem`] for JPEG output.
pub const DEFAULT_QUALITY: u8 = 75;

fn decode_error(err: jpeg_decoder::Error) -> ParseError {
    match err {
        jpeg_decoder::Error::Io(e) => ParseError::from_read(e, "JPEG stream"),
        jpeg_decoder::Error::Unsupported(feature) => {
            ParseError::UnsupportedFormat(format!("JPEG feature {feature:?}"))
        }
        other => ParseError::DecodeError(format!("JPEG decode error: {other}")),
    }
}

/// Read a JPEG image.
///
/// Grayscale images become `Gray8`, color images `Rgb24`. CMYK and 16-bit
/// lossless images are unsupported.
pub fn read_jpeg<R: Read>(reader: R) -> ParseResult<PixelBuffer> {
    let mut decoder = jpeg_decoder::Decoder::new(reader);
    let pixels = decoder.decode().map_err(decode_error)?;
    let info = decoder
        .info()
        .ok_or_else(|| ParseError::MalformedStream("JPEG without frame header".to_string()))?;

    let format = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => PixelFormat::Gray8,
        jpeg_decoder::PixelFormat::RGB24 => PixelFormat::Rgb24,
        other => {
            return Err(ParseError::UnsupportedFormat(format!(
                "JPEG pixel format {other:?}"
            )));
        }
    };
    let (width, height) = (u32::from(info.width), u32::from(info.height));
    log::debug!("JPEG {}x{} as {:?}", width, height, format);

    Ok(PixelBuffer::from_raw(
        width,
        height,
        format,
        format.min_stride(width),
        pixels,
    )?)
}

/// Write a JPEG image at `quality` (1..=100).
///
/// RGBA32 input is written without its alpha channel. Indexed buffers must
/// be converted to a direct format first.
pub fn write_jpeg<W: Write>(buf: &PixelBuffer, writer: W, quality: u8) -> ParseResult<()> {
    let color = match buf.format() {
        PixelFormat::Gray8 => jpeg_encoder::ColorType::Luma,
        PixelFormat::Rgb24 => jpeg_encoder::ColorType::Rgb,
        PixelFormat::Rgba32 => jpeg_encoder::ColorType::Rgba,
        other => {
            return Err(ParseError::UnsupportedFormat(format!(
                "cannot write {other:?} as JPEG"
            )));
        }
    };
    let (width, height) = match (u16::try_from(buf.width()), u16::try_from(buf.height())) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(ParseError::UnsupportedFormat(format!(
                "JPEG dimensions {}x{} exceed 65535",
                buf.width(),
                buf.height()
            )));
        }
    };

    let encoder = jpeg_encoder::Encoder::new(writer, quality.clamp(1, 100));
    encoder
        .encode(buf.to_tight().data(), width, height, color)
        .map_err(|e| ParseError::EncodeError(format!("JPEG encode error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_jpeg_gray_roundtrip() {
        let buf = PixelBuffer::from_raw(16, 16, PixelFormat::Gray8, 16, vec![120; 256]).unwrap();
        let mut bytes = Vec::new();
        write_jpeg(&buf, &mut bytes, 100).unwrap();

        let back = read_jpeg(Cursor::new(bytes)).unwrap();
        assert_eq!(back.format(), PixelFormat::Gray8);
        assert_eq!((back.width(), back.height()), (16, 16));
        assert!(back.data().iter().all(|&v| v.abs_diff(120) <= 2));
    }

    #[test]
    fn test_jpeg_rgb_dimensions() {
        let rgb: Vec<u8> = [200u8, 40, 40].repeat(7 * 5);
        let buf = PixelBuffer::from_raw(7, 5, PixelFormat::Rgb24, 21, rgb).unwrap();
        let mut bytes = Vec::new();
        write_jpeg(&buf, &mut bytes, 90).unwrap();

        let back = read_jpeg(Cursor::new(bytes)).unwrap();
        assert_eq!(back.format(), PixelFormat::Rgb24);
        assert_eq!((back.width(), back.height(), back.stride()), (7, 5, 21));
    }

    #[test]
    fn test_jpeg_rejects_indexed() {
        let buf = PixelBuffer::new(2, 2, PixelFormat::Index4).unwrap();
        assert!(matches!(
            write_jpeg(&buf, Vec::new(), 80),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_jpeg_truncated() {
        let buf = PixelBuffer::new(8, 8, PixelFormat::Gray8).unwrap();
        let mut bytes = Vec::new();
        write_jpeg(&buf, &mut bytes, 80).unwrap();
        bytes.truncate(20);
        assert!(read_jpeg(Cursor::new(bytes)).is_err());
    }
}
