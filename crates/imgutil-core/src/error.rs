//! Error types for imgutil-core
//!
//! Provides a unified error type for buffer, palette and conversion
//! operations. Every conversion either fails before producing output or
//! returns a complete buffer; there is no partial result.

use crate::format::PixelFormat;
use thiserror::Error;

/// imgutil-core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested conversion pair is not implemented
    #[error("unsupported conversion: {from:?} -> {to:?}")]
    UnsupportedFormat { from: PixelFormat, to: PixelFormat },

    /// A palette was requested for a format that has none
    #[error("no palette for format {0:?}")]
    UnsupportedPaletteFormat(PixelFormat),

    /// More distinct colors than the largest indexed format can hold
    #[error("palette overflow: {count} distinct colors (max 256)")]
    PaletteOverflow { count: usize },

    /// A packed index (or remap entry) does not address a palette slot
    #[error("index out of range: {index} >= {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Indexed buffer has no palette attached
    #[error("palette required but not present")]
    PaletteRequired,

    /// Palette already holds its maximum number of entries
    #[error("palette full: capacity {capacity}")]
    PaletteFull { capacity: usize },

    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Stride too small for one packed scanline
    #[error("invalid stride: {stride} < {min}")]
    InvalidStride { stride: usize, min: usize },

    /// Byte buffer shorter than the layout requires
    #[error("buffer too small: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Index depth not in {1, 2, 4, 8}
    #[error("invalid index depth: {0} bpp")]
    InvalidDepth(u32),

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias for imgutil-core operations
pub type Result<T> = std::result::Result<T, Error>;
