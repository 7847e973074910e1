//! imgutil - Pixel-format conversion and palette management
//!
//! Converts raster images between direct-color and palettized layouts and
//! parses encoded image streams into a canonical in-memory form.
//!
//! # Overview
//!
//! - RGB24, RGBA32 and GRAY8 conversions
//! - Packing and unpacking of 1/2/4/8 bpp indexed buffers
//! - Exact effective palettes for direct-color images
//! - PNG, GIF, JPEG and BMP decoding via [`io`]
//!
//! # Example
//!
//! ```
//! use imgutil::{PixelBuffer, PixelFormat};
//!
//! let rgba = vec![
//!     255, 0, 0, 255, 0, 255, 0, 255, //
//!     255, 0, 0, 255, 0, 0, 255, 255,
//! ];
//! let buf = PixelBuffer::from_raw(2, 2, PixelFormat::Rgba32, 8, rgba).unwrap();
//! let indexed = buf.convert(PixelFormat::Index2).unwrap();
//! assert_eq!(indexed.palette().unwrap().len(), 3);
//! assert_eq!(indexed.convert(PixelFormat::Rgba32).unwrap(), buf);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use imgutil_core::*;

// Re-export the I/O crate as a module to avoid name conflicts
pub use imgutil_io as io;
