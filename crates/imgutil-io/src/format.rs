//! Image format detection
//!
//! Detects image formats by examining magic numbers in the stream header.

use crate::{ParseError, ParseResult};

/// Container formats recognized by [`detect_format_from_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    WebP,
    Pnm,
}

impl ImageFormat {
    /// Check whether this build can decode the format.
    pub fn is_decodable(self) -> bool {
        match self {
            ImageFormat::Png => cfg!(feature = "png-format"),
            ImageFormat::Jpeg => cfg!(feature = "jpeg"),
            ImageFormat::Gif => cfg!(feature = "gif-format"),
            ImageFormat::Bmp => cfg!(feature = "bmp"),
            ImageFormat::Tiff | ImageFormat::WebP | ImageFormat::Pnm => false,
        }
    }
}

/// Magic numbers for image format detection
mod magic {
    /// BMP: "BM"
    pub const BMP: &[u8] = b"BM";

    /// PNG: 89 50 4E 47 0D 0A 1A 0A
    pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    /// JPEG: FF D8 FF
    pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    pub const GIF87A: &[u8] = b"GIF87a";
    pub const GIF89A: &[u8] = b"GIF89a";

    /// TIFF little-endian: II 2A 00
    pub const TIFF_LE: &[u8] = &[0x49, 0x49, 0x2A, 0x00];

    /// TIFF big-endian: MM 00 2A
    pub const TIFF_BE: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];

    /// WebP: RIFF....WEBP
    pub const RIFF: &[u8] = b"RIFF";
    pub const WEBP: &[u8] = b"WEBP";

    /// Binary and ASCII PNM variants P1..P6
    pub const PNM: [&[u8]; 6] = [b"P1", b"P2", b"P3", b"P4", b"P5", b"P6"];
}

/// Detect image format from the leading bytes of a stream.
///
/// # Errors
///
/// - [`ParseError::MalformedStream`] with fewer than 2 bytes
/// - [`ParseError::UnsupportedFormat`] if no signature matches
pub fn detect_format_from_bytes(data: &[u8]) -> ParseResult<ImageFormat> {
    if data.len() < 2 {
        return Err(ParseError::MalformedStream(
            "not enough data to detect format".to_string(),
        ));
    }

    if data.starts_with(magic::PNG) {
        return Ok(ImageFormat::Png);
    }
    if data.starts_with(magic::JPEG) {
        return Ok(ImageFormat::Jpeg);
    }
    if data.starts_with(magic::GIF87A) || data.starts_with(magic::GIF89A) {
        return Ok(ImageFormat::Gif);
    }
    if data.starts_with(magic::BMP) {
        return Ok(ImageFormat::Bmp);
    }
    if data.starts_with(magic::TIFF_LE) || data.starts_with(magic::TIFF_BE) {
        return Ok(ImageFormat::Tiff);
    }
    if data.len() >= 12 && data.starts_with(magic::RIFF) && &data[8..12] == magic::WEBP {
        return Ok(ImageFormat::WebP);
    }
    if magic::PNM.iter().any(|m| data.starts_with(m)) {
        return Ok(ImageFormat::Pnm);
    }

    Err(ParseError::UnsupportedFormat(
        "unknown image format".to_string(),
    ))
}
