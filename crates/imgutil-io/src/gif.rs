//! GIF image format support
//!
//! Decodes the first frame of a GIF into an indexed buffer at the smallest
//! depth that holds its color table, and counts frames of animated GIFs.

use crate::{ParseError, ParseResult};
use gif::{ColorOutput, DecodeOptions, Encoder, Frame};
use imgutil_core::indexed::pack_indices;
use imgutil_core::{Palette, PixelBuffer, PixelFormat, Rgba};
use std::io::{Read, Write};

fn decode_error(err: gif::DecodingError) -> ParseError {
    match err {
        gif::DecodingError::Io(e) => ParseError::from_read(e, "GIF stream"),
        other => ParseError::DecodeError(format!("GIF decode error: {other}")),
    }
}

fn encode_error(err: gif::EncodingError) -> ParseError {
    ParseError::EncodeError(format!("GIF encode error: {err}"))
}

fn open<R: Read>(reader: R) -> ParseResult<gif::Decoder<R>> {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::Indexed);
    options.read_info(reader).map_err(decode_error)
}

/// Read the first frame of a GIF image
///
/// The frame's local color table is used when present, otherwise the
/// global one. The transparent index, if any, gets alpha 0.
///
/// # Errors
///
/// - [`ParseError::MalformedStream`] for a GIF without frames or color
///   table, or a pixel index past the end of the color table
pub fn read_gif<R: Read>(reader: R) -> ParseResult<PixelBuffer> {
    let mut decoder = open(reader)?;

    let frame = decoder
        .read_next_frame()
        .map_err(decode_error)?
        .ok_or_else(|| ParseError::MalformedStream("GIF has no frames".to_string()))?
        .clone();

    let table: &[u8] = match (&frame.palette, decoder.global_palette()) {
        (Some(local), _) => local,
        (None, Some(global)) => global,
        (None, None) => {
            return Err(ParseError::MalformedStream(
                "GIF has no color table".to_string(),
            ));
        }
    };

    let ncolors = table.len() / 3;
    if ncolors == 0 || ncolors > imgutil_core::MAX_PALETTE_SIZE {
        return Err(ParseError::MalformedStream(format!(
            "GIF color table with {ncolors} entries"
        )));
    }
    let format = PixelFormat::smallest_indexed(ncolors)?;

    let mut colors: Vec<Rgba> = table
        .chunks_exact(3)
        .map(|c| Rgba::rgb(c[0], c[1], c[2]))
        .collect();
    if let Some(t) = frame.transparent
        && let Some(c) = colors.get_mut(t as usize)
    {
        c.alpha = 0;
    }

    if let Some(&bad) = frame.buffer.iter().find(|&&i| i as usize >= ncolors) {
        return Err(ParseError::MalformedStream(format!(
            "GIF index {bad} outside {ncolors}-entry color table"
        )));
    }

    let width = u32::from(frame.width);
    let height = u32::from(frame.height);
    log::debug!(
        "GIF frame {}x{} with {} colors as {:?}",
        width,
        height,
        ncolors,
        format
    );

    let palette = Palette::from_colors(format.bits_per_pixel(), &colors)?;
    Ok(pack_indices(width, height, &frame.buffer, format)?.with_palette(palette)?)
}

/// Count the image frames of a GIF stream.
///
/// # Errors
///
/// Returns [`ParseError::MalformedStream`] if the stream holds no frames.
pub fn count_frames_gif<R: Read>(reader: R) -> ParseResult<u32> {
    let mut decoder = open(reader)?;
    let mut count = 0u32;
    while decoder.read_next_frame().map_err(decode_error)?.is_some() {
        count += 1;
    }
    if count == 0 {
        return Err(ParseError::MalformedStream("GIF has no frames".to_string()));
    }
    Ok(count)
}

/// Write a single-frame GIF image
///
/// Indexed buffers are written with their palette. Direct buffers are
/// reduced to an exact 8-bit palette first, so they must hold at most 256
/// distinct colors. The first palette entry with alpha 0 becomes the
/// transparent index; other alpha values are dropped.
pub fn write_gif<W: Write>(buf: &PixelBuffer, writer: W) -> ParseResult<()> {
    let indexed = match buf.format() {
        PixelFormat::Index1 | PixelFormat::Index2 | PixelFormat::Index4 | PixelFormat::Index8 => {
            buf.clone()
        }
        PixelFormat::Float => {
            return Err(ParseError::UnsupportedFormat(format!(
                "cannot write {:?} as GIF",
                buf.format()
            )));
        }
        _ => buf.convert(PixelFormat::Index8)?,
    };

    let (width, height) = match (
        u16::try_from(indexed.width()),
        u16::try_from(indexed.height()),
    ) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(ParseError::UnsupportedFormat(format!(
                "GIF dimensions {}x{} exceed 65535",
                indexed.width(),
                indexed.height()
            )));
        }
    };

    let palette = match indexed.palette() {
        Some(p) => p.clone(),
        None => Palette::default_for(indexed.format())?,
    };
    // Color table sizes are powers of two
    let table_len = palette.len().next_power_of_two().max(2);
    let mut table = Vec::with_capacity(table_len * 3);
    for i in 0..table_len {
        let c = palette.get(i).copied().unwrap_or(Rgba::gray(0));
        table.extend_from_slice(&[c.red, c.green, c.blue]);
    }
    let transparent = palette
        .colors()
        .iter()
        .position(|c| c.alpha == 0)
        .map(|i| i as u8);

    let mut indices = Vec::with_capacity(width as usize * height as usize);
    for y in 0..indexed.height() {
        for x in 0..indexed.width() {
            indices.push(indexed.get_index(x, y).unwrap_or(0));
        }
    }

    let mut encoder = Encoder::new(writer, width, height, &table).map_err(encode_error)?;
    let frame = Frame::from_indexed_pixels(width, height, indices, transparent);
    encoder.write_frame(&frame).map_err(encode_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_gif_roundtrip_indexed() {
        let pal = Palette::from_colors(
            2,
            &[Rgba::rgb(255, 0, 0), Rgba::rgb(0, 255, 0), Rgba::rgb(0, 0, 255)],
        )
        .unwrap();
        let data = vec![0b00_01_10_00, 0b10_01_00_00];
        let buf = PixelBuffer::from_raw(3, 2, PixelFormat::Index2, 1, data)
            .unwrap()
            .with_palette(pal)
            .unwrap();

        let mut bytes = Vec::new();
        write_gif(&buf, &mut bytes).unwrap();
        let back = read_gif(Cursor::new(bytes)).unwrap();

        // The 3-entry table is padded to 4
        assert_eq!(back.format(), PixelFormat::Index2);
        assert_eq!(back.palette().unwrap().len(), 4);
        assert!(back.same_pixels(&buf));
        assert_eq!(
            back.convert(PixelFormat::Rgb24).unwrap(),
            buf.convert(PixelFormat::Rgb24).unwrap()
        );
    }

    #[test]
    fn test_gif_transparent_index() {
        let rgba = vec![0, 0, 0, 0, 255, 255, 255, 255];
        let buf = PixelBuffer::from_raw(2, 1, PixelFormat::Rgba32, 8, rgba.clone()).unwrap();
        let mut bytes = Vec::new();
        write_gif(&buf, &mut bytes).unwrap();
        let back = read_gif(Cursor::new(bytes)).unwrap();
        assert_eq!(back.format(), PixelFormat::Index1);
        assert_eq!(back.convert(PixelFormat::Rgba32).unwrap().data(), rgba.as_slice());
    }

    #[test]
    fn test_gif_frame_count() {
        let mut bytes = Vec::new();
        {
            let mut encoder = Encoder::new(&mut bytes, 2, 2, &[0, 0, 0, 255, 255, 255]).unwrap();
            for v in [0u8, 1, 0] {
                let frame = Frame::from_indexed_pixels(2, 2, vec![v; 4], None);
                encoder.write_frame(&frame).unwrap();
            }
        }
        assert_eq!(count_frames_gif(Cursor::new(&bytes)).unwrap(), 3);
        let first = read_gif(Cursor::new(&bytes)).unwrap();
        assert_eq!(first.get_index(1, 1), Some(0));
    }

    #[test]
    fn test_gif_without_frames() {
        let mut bytes = Vec::new();
        {
            let _encoder = Encoder::new(&mut bytes, 2, 2, &[0, 0, 0, 255, 255, 255]).unwrap();
        }
        assert!(matches!(
            count_frames_gif(Cursor::new(&bytes)),
            Err(ParseError::MalformedStream(_))
        ));
        assert!(matches!(
            read_gif(Cursor::new(&bytes)),
            Err(ParseError::MalformedStream(_))
        ));
    }
}
