//! imgutil-io - Image stream parsing for imgutil
//!
//! Decodes encoded image streams into canonical [`PixelBuffer`]s and
//! serializes those buffers to a flat, uncompressed layout.
//!
//! # Supported formats
//!
//! | Format | Feature      | Decode | Encode |
//! |--------|--------------|--------|--------|
//! | PNG    | `png-format` | yes    | yes    |
//! | GIF    | `gif-format` | yes    | yes    |
//! | JPEG   | `jpeg`       | yes    | yes    |
//! | BMP    | `bmp`        | yes    | yes    |
//!
//! TIFF, WebP and PNM are recognized by [`detect_format_from_bytes`] but
//! not decoded.
//!
//! [`PixelBuffer`]: imgutil_core::PixelBuffer

pub mod canonical;
pub mod error;
pub mod format;
mod parse;

#[cfg(feature = "bmp")]
pub mod bmp;
#[cfg(feature = "gif-format")]
pub mod gif;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png-format")]
pub mod png;

pub use canonical::{read_canonical, write_canonical};
pub use error::{ParseError, ParseResult};
pub use format::{ImageFormat, detect_format_from_bytes};
pub use parse::{ImageInfo, count_frames, decode_mem, encode_mem, parse, write_image};

#[cfg(feature = "bmp")]
pub use self::bmp::{read_bmp, write_bmp};
#[cfg(feature = "gif-format")]
pub use self::gif::{read_gif, write_gif};
#[cfg(feature = "jpeg")]
pub use self::jpeg::{read_jpeg, write_jpeg};
#[cfg(feature = "png-format")]
pub use self::png::{read_png, write_png};
