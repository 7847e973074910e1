//! PNG image format support
//!
//! Decoding keeps palette images indexed and maps every other color type to
//! the nearest direct format. 16-bit samples are stripped to 8 bits.

use crate::{ParseError, ParseResult};
use imgutil_core::{Palette, PixelBuffer, PixelFormat, Rgba};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::io::{BufRead, Cursor, Seek, Write};

fn decode_error(err: png::DecodingError) -> ParseError {
    match err {
        png::DecodingError::IoError(e) => ParseError::from_read(e, "PNG stream"),
        other => ParseError::DecodeError(format!("PNG decode error: {other}")),
    }
}

fn encode_error(err: png::EncodingError) -> ParseError {
    ParseError::EncodeError(format!("PNG encode error: {err}"))
}

/// Read a PNG image
///
/// | PNG color type      | Result                                 |
/// |---------------------|----------------------------------------|
/// | Indexed 1/2/4/8     | `Index*` with palette, tRNS as alpha   |
/// | Grayscale 8/16      | `Gray8`                                |
/// | Grayscale 1/2/4     | `Gray8`, scaled to 0..=255             |
/// | Grayscale + alpha   | `Rgba32`                               |
/// | RGB                 | `Rgb24`                                |
/// | RGBA                | `Rgba32`                               |
///
/// Only the default image is decoded for animated PNGs.
pub fn read_png<R: BufRead + Seek>(reader: R) -> ParseResult<PixelBuffer> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(decode_error)?;

    let (color_type, bit_depth) = reader.output_color_type();
    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| ParseError::DecodeError("PNG output buffer size overflow".to_string()))?;
    let mut raw = vec![0; buf_size];
    let output_info = reader.next_frame(&mut raw).map_err(decode_error)?;
    let (width, height) = (output_info.width, output_info.height);
    let line = output_info.line_size;
    raw.truncate(output_info.buffer_size());

    log::debug!("PNG {}x{} {:?} {:?}", width, height, color_type, bit_depth);

    match color_type {
        ColorType::Indexed => {
            let bits = bit_depth as u32;
            let format = PixelFormat::from_index_bits(bits)?;
            let info = reader.info();
            let plte = info.palette.as_deref().ok_or_else(|| {
                ParseError::MalformedStream("indexed PNG without PLTE".to_string())
            })?;
            let trns = info.trns.as_deref().unwrap_or(&[]);
            let colors: Vec<Rgba> = plte
                .chunks_exact(3)
                .enumerate()
                .map(|(i, c)| Rgba::new(c[0], c[1], c[2], trns.get(i).copied().unwrap_or(255)))
                .collect();
            let capacity = format.palette_capacity().unwrap_or(0);
            if colors.len() > capacity {
                return Err(ParseError::MalformedStream(format!(
                    "{} PLTE entries in a {bits}-bit PNG",
                    colors.len()
                )));
            }
            let palette = Palette::from_colors(bits, &colors)?;
            Ok(PixelBuffer::from_raw(width, height, format, line, raw)?.with_palette(palette)?)
        }
        ColorType::Grayscale if bit_depth == BitDepth::Eight => {
            Ok(PixelBuffer::from_raw(width, height, PixelFormat::Gray8, line, raw)?)
        }
        ColorType::Grayscale => {
            // Sub-byte gray goes through a linear ramp palette
            let bits = bit_depth as u32;
            let format = PixelFormat::from_index_bits(bits)?;
            let ramp = PixelBuffer::from_raw(width, height, format, line, raw)?
                .with_palette(Palette::create_linear(bits)?)?;
            Ok(ramp.convert(PixelFormat::Gray8)?)
        }
        ColorType::GrayscaleAlpha => {
            let mut out = PixelBuffer::new(width, height, PixelFormat::Rgba32)?;
            for y in 0..height {
                let src = &raw[y as usize * line..];
                for (s, d) in src.chunks_exact(2).zip(out.row_mut(y).chunks_exact_mut(4)) {
                    d.copy_from_slice(&[s[0], s[0], s[0], s[1]]);
                }
            }
            Ok(out)
        }
        ColorType::Rgb => Ok(PixelBuffer::from_raw(width, height, PixelFormat::Rgb24, line, raw)?),
        ColorType::Rgba => Ok(PixelBuffer::from_raw(
            width,
            height,
            PixelFormat::Rgba32,
            line,
            raw,
        )?),
    }
}

const SIGNATURE_LEN: usize = 8;

/// Frame count declared by the `acTL` chunk, if one precedes the image data.
///
/// Walks the raw chunk list (length, type, body, CRC). The png crate drops
/// an `acTL` that declares zero frames, so its decoded info cannot tell
/// that case apart from a still image.
fn declared_frames(data: &[u8]) -> Option<u32> {
    let mut rest = data.get(SIGNATURE_LEN..)?;
    while rest.len() >= 8 {
        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let kind = &rest[4..8];
        let body = rest.get(8..8usize.checked_add(len)?)?;
        match kind {
            b"acTL" => {
                let frames = body.get(..4)?;
                return Some(u32::from_be_bytes([frames[0], frames[1], frames[2], frames[3]]));
            }
            b"IDAT" | b"IEND" => return None,
            _ => {}
        }
        rest = rest.get(8 + len + 4..)?;
    }
    None
}

/// Count the frames of a PNG stream.
///
/// Animated PNGs report the `acTL` frame count; every other PNG has one
/// frame.
///
/// # Errors
///
/// Returns [`ParseError::MalformedStream`] for an `acTL` chunk declaring
/// zero frames.
pub fn count_frames_png(data: &[u8]) -> ParseResult<u32> {
    Decoder::new(Cursor::new(data))
        .read_info()
        .map_err(decode_error)?;
    match declared_frames(data) {
        Some(0) => Err(ParseError::MalformedStream("APNG declares zero frames".to_string())),
        Some(frames) => Ok(frames),
        None => Ok(1),
    }
}

/// Write a PNG image
///
/// Indexed buffers become palette PNGs at the same bit depth, with a tRNS
/// chunk when any entry is translucent. Indexed buffers without a palette
/// are written with [`Palette::default_for`].
pub fn write_png<W: Write>(buf: &PixelBuffer, writer: W) -> ParseResult<()> {
    let format = buf.format();
    let (color_type, bit_depth) = match format {
        PixelFormat::Index1 => (ColorType::Indexed, BitDepth::One),
        PixelFormat::Index2 => (ColorType::Indexed, BitDepth::Two),
        PixelFormat::Index4 => (ColorType::Indexed, BitDepth::Four),
        PixelFormat::Index8 => (ColorType::Indexed, BitDepth::Eight),
        PixelFormat::Gray8 => (ColorType::Grayscale, BitDepth::Eight),
        PixelFormat::Rgb24 => (ColorType::Rgb, BitDepth::Eight),
        PixelFormat::Rgba32 => (ColorType::Rgba, BitDepth::Eight),
        PixelFormat::Float => {
            return Err(ParseError::UnsupportedFormat(format!(
                "cannot write {format:?} as PNG"
            )));
        }
    };

    let mut encoder = Encoder::new(writer, buf.width(), buf.height());
    encoder.set_color(color_type);
    encoder.set_depth(bit_depth);

    if color_type == ColorType::Indexed {
        let palette = match buf.palette() {
            Some(p) => p.clone(),
            None => Palette::default_for(format)?,
        };
        let plte: Vec<u8> = palette
            .colors()
            .iter()
            .flat_map(|c| [c.red, c.green, c.blue])
            .collect();
        encoder.set_palette(plte);
        if palette.has_alpha() {
            let trns: Vec<u8> = palette.colors().iter().map(|c| c.alpha).collect();
            encoder.set_trns(trns);
        }
    }

    let mut writer = encoder.write_header().map_err(encode_error)?;
    writer
        .write_image_data(buf.to_tight().data())
        .map_err(encode_error)?;
    writer.finish().map_err(encode_error)?;
    Ok(())
}
