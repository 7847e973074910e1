//! Canonical pixel stream
//!
//! An uncompressed serialization of a [`PixelBuffer`], written by
//! [`crate::parse`] and read back with [`read_canonical`].
//!
//! # Format layout
//!
//! All integers are little-endian `u32`.
//!
//! ```text
//! Offset       Size          Field
//! ------       ----          -----
//! 0            4             "IPXB" magic bytes
//! 4            4             version (= 1)
//! 8            4             width
//! 12           4             height
//! 16           4             format tag (PixelFormat::tag)
//! 20           4             stride (bytes per row)
//! 24           4             ncolors (0 if no palette)
//! 28           4 * ncolors   palette entries (R, G, B, A)
//! 28+4*n       4             data size (= stride * height)
//! 32+4*n       data size     raw rows
//! ```

use crate::{ParseError, ParseResult};
use imgutil_core::{MAX_PALETTE_SIZE, Palette, PixelBuffer, PixelFormat, Rgba};
use std::io::{Read, Write};

/// Magic bytes at the start of every canonical stream
pub const MAGIC: &[u8; 4] = b"IPXB";

/// Current layout version
pub const VERSION: u32 = 1;

fn read_u32<R: Read>(reader: &mut R, what: &str) -> ParseResult<u32> {
    let mut b = [0u8; 4];
    reader
        .read_exact(&mut b)
        .map_err(|e| ParseError::from_read(e, what))?;
    Ok(u32::from_le_bytes(b))
}

/// Serialize `buf` to the canonical layout.
pub fn write_canonical<W: Write>(buf: &PixelBuffer, mut writer: W) -> ParseResult<()> {
    let size = buf.stride() * buf.height() as usize;

    writer.write_all(MAGIC)?;
    for field in [
        VERSION,
        buf.width(),
        buf.height(),
        buf.format().tag(),
        buf.stride() as u32,
    ] {
        writer.write_all(&field.to_le_bytes())?;
    }

    let colors = buf.palette().map_or(&[][..], |p| p.colors());
    writer.write_all(&(colors.len() as u32).to_le_bytes())?;
    for c in colors {
        writer.write_all(&[c.red, c.green, c.blue, c.alpha])?;
    }

    writer.write_all(&(size as u32).to_le_bytes())?;
    writer.write_all(&buf.data()[..size])?;
    Ok(())
}

/// Deserialize a buffer from the canonical layout.
///
/// # Errors
///
/// Returns [`ParseError::MalformedStream`] for a bad magic or version, an
/// unknown format tag, a palette that does not fit the format, a data size
/// other than `stride * height`, or a truncated stream.
pub fn read_canonical<R: Read>(mut reader: R) -> ParseResult<PixelBuffer> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|e| ParseError::from_read(e, "canonical header"))?;
    if &magic != MAGIC {
        return Err(ParseError::MalformedStream(
            "not a canonical pixel stream".to_string(),
        ));
    }
    let version = read_u32(&mut reader, "canonical header")?;
    if version != VERSION {
        return Err(ParseError::MalformedStream(format!(
            "canonical stream version {version}"
        )));
    }

    let width = read_u32(&mut reader, "canonical header")?;
    let height = read_u32(&mut reader, "canonical header")?;
    let tag = read_u32(&mut reader, "canonical header")?;
    let format = PixelFormat::from_tag(tag)
        .ok_or_else(|| ParseError::MalformedStream(format!("unknown format tag {tag}")))?;
    let stride = read_u32(&mut reader, "canonical header")? as usize;

    let ncolors = read_u32(&mut reader, "canonical palette")? as usize;
    let palette = match (ncolors, format.index_bits()) {
        (0, _) => None,
        (n, Some(bits)) if n <= MAX_PALETTE_SIZE => {
            let mut raw = vec![0u8; n * 4];
            reader
                .read_exact(&mut raw)
                .map_err(|e| ParseError::from_read(e, "canonical palette"))?;
            let colors: Vec<Rgba> = raw
                .chunks_exact(4)
                .map(|c| Rgba::new(c[0], c[1], c[2], c[3]))
                .collect();
            Some(
                Palette::from_colors(bits, &colors)
                    .map_err(|e| ParseError::MalformedStream(format!("canonical palette: {e}")))?,
            )
        }
        (n, _) => {
            return Err(ParseError::MalformedStream(format!(
                "{n} palette entries for {format:?}"
            )));
        }
    };

    let size = read_u32(&mut reader, "canonical data size")? as usize;
    if Some(size) != stride.checked_mul(height as usize) {
        return Err(ParseError::MalformedStream(format!(
            "data size {size} for stride {stride} x {height} rows"
        )));
    }
    let mut data = Vec::new();
    (&mut reader).take(size as u64).read_to_end(&mut data)?;
    if data.len() < size {
        return Err(ParseError::MalformedStream(format!(
            "truncated canonical data: {} of {size} bytes",
            data.len()
        )));
    }

    let buf = PixelBuffer::from_raw(width, height, format, stride, data)
        .map_err(|e| ParseError::MalformedStream(format!("canonical layout: {e}")))?;
    match palette {
        Some(p) => Ok(buf.with_palette(p)?),
        None => Ok(buf),
    }
}
