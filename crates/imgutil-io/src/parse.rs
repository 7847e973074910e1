//! Stream parsing entry points
//!
//! Format detection, decoding to the canonical [`PixelBuffer`], frame
//! counting and encoding, dispatched on [`ImageFormat`].

use crate::canonical::write_canonical;
use crate::{ImageFormat, ParseError, ParseResult, detect_format_from_bytes};
use imgutil_core::{PixelBuffer, PixelFormat};
use std::io::{Read, Write};

/// Summary of a parsed image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    /// Detected container format
    pub source: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Pixel format of the decoded buffer
    pub format: PixelFormat,
    /// Number of palette entries (0 for direct formats)
    pub num_colors: usize,
    /// Number of frames in the stream (only the first is decoded)
    pub frames: u32,
}

fn unsupported(format: ImageFormat) -> ParseError {
    ParseError::UnsupportedFormat(format!("{format:?} decoding is not available"))
}

/// Decode an in-memory image to its canonical pixel buffer.
///
/// # Errors
///
/// - [`ParseError::UnsupportedFormat`] for unknown formats, formats that are
///   only detected, and formats whose feature is disabled
/// - [`ParseError::MalformedStream`] for truncated or inconsistent input
pub fn decode_mem(data: &[u8]) -> ParseResult<PixelBuffer> {
    let format = detect_format_from_bytes(data)?;
    let buf = decode_as(data, format)?;
    log::debug!(
        "decoded {:?} {}x{} as {:?}",
        format,
        buf.width(),
        buf.height(),
        buf.format()
    );
    Ok(buf)
}

fn decode_as(data: &[u8], format: ImageFormat) -> ParseResult<PixelBuffer> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => crate::png::read_png(std::io::Cursor::new(data)),

        #[cfg(feature = "gif-format")]
        ImageFormat::Gif => crate::gif::read_gif(data),

        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => crate::jpeg::read_jpeg(data),

        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => crate::bmp::read_bmp(data),

        _ => Err(unsupported(format)),
    }
}

/// Count the frames of an in-memory image.
///
/// GIF streams report their image count and animated PNGs their `acTL`
/// frame count; every other decodable format has one frame.
///
/// # Errors
///
/// - [`ParseError::MalformedStream`] for a GIF without frames or an APNG
///   declaring zero frames
/// - [`ParseError::UnsupportedFormat`] if the format cannot be decoded
pub fn count_frames(data: &[u8]) -> ParseResult<u32> {
    match detect_format_from_bytes(data)? {
        #[cfg(feature = "gif-format")]
        ImageFormat::Gif => crate::gif::count_frames_gif(data),

        #[cfg(feature = "png-format")]
        ImageFormat::Png => crate::png::count_frames_png(data),

        format if format.is_decodable() => Ok(1),
        format => Err(unsupported(format)),
    }
}

/// Decode `input` and write its canonical stream to `output`.
///
/// The whole input is read into memory first. Only the first frame of a
/// multi-frame stream is decoded; [`ImageInfo::frames`] reports the total.
///
/// # Examples
///
/// ```
/// use imgutil_core::{PixelBuffer, PixelFormat};
/// use imgutil_io::{parse, read_canonical, write_bmp};
///
/// let buf = PixelBuffer::from_raw(2, 1, PixelFormat::Rgb24, 6, vec![1, 2, 3, 4, 5, 6]).unwrap();
/// let mut bmp = Vec::new();
/// write_bmp(&buf, &mut bmp).unwrap();
///
/// let mut canonical = Vec::new();
/// let info = parse(bmp.as_slice(), &mut canonical).unwrap();
/// assert_eq!((info.width, info.height, info.frames), (2, 1, 1));
/// assert_eq!(read_canonical(canonical.as_slice()).unwrap(), buf);
/// ```
pub fn parse<R: Read, W: Write>(mut input: R, output: W) -> ParseResult<ImageInfo> {
    let mut data = Vec::new();
    input.read_to_end(&mut data)?;

    let source = detect_format_from_bytes(&data)?;
    let buf = decode_as(&data, source)?;
    let frames = count_frames(&data)?;
    write_canonical(&buf, output)?;

    let info = ImageInfo {
        source,
        width: buf.width(),
        height: buf.height(),
        format: buf.format(),
        num_colors: buf.palette().map_or(0, |p| p.len()),
        frames,
    };
    log::debug!("parsed {:?}", info);
    Ok(info)
}

/// Encode `buf` in `format`.
///
/// JPEG output uses [`crate::jpeg::DEFAULT_QUALITY`].
pub fn write_image<W: Write>(buf: &PixelBuffer, format: ImageFormat, writer: W) -> ParseResult<()> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => crate::png::write_png(buf, writer),

        #[cfg(feature = "gif-format")]
        ImageFormat::Gif => crate::gif::write_gif(buf, writer),

        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => crate::jpeg::write_jpeg(buf, writer, crate::jpeg::DEFAULT_QUALITY),

        #[cfg(feature = "bmp")]
        ImageFormat::Bmp => crate::bmp::write_bmp(buf, writer),

        _ => {
            let _ = (buf, writer);
            Err(ParseError::UnsupportedFormat(format!(
                "{format:?} encoding is not available"
            )))
        }
    }
}

/// Encode `buf` in `format` into a new byte vector.
pub fn encode_mem(buf: &PixelBuffer, format: ImageFormat) -> ParseResult<Vec<u8>> {
    let mut bytes = Vec::new();
    write_image(buf, format, &mut bytes)?;
    Ok(bytes)
}
