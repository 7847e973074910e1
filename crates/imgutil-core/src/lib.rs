//! imgutil core - pixel buffers, palettes and format conversion
//!
//! This crate provides the raster data model and the conversions between
//! pixel formats:
//!
//! - [`PixelBuffer`] - Owned raster with width, height, format and stride
//! - [`Palette`] / [`Rgba`] - Color table for indexed buffers
//! - [`PixelFormat`] - Closed set of direct and indexed layouts
//! - [`convert`] - Direct-format conversions (RGB, RGBA, gray)
//! - [`indexed`] - Packing, unpacking and remapping of indexed buffers
//! - [`palette::reduce`] - Effective palette computation
//!
//! Every conversion returns a newly allocated buffer and leaves its input
//! untouched.

pub mod convert;
pub mod error;
pub mod format;
pub mod indexed;
pub mod palette;
pub mod pixbuf;

pub use convert::{ConvertOptions, OutOfRangePolicy};
pub use error::{Error, Result};
pub use format::{MAX_PALETTE_SIZE, PixelFormat};
pub use palette::reduce::{EffectivePalette, effective_palette};
pub use palette::{Palette, Rgba};
pub use pixbuf::PixelBuffer;

/// Packed 32-bit colors and luminance.
///
/// # Pixel format
///
/// Packed colors are stored as `0xRRGGBBAA` (red in MSB, alpha in LSB).
pub mod color {
    /// Shift amounts for extracting color channels
    pub const RED_SHIFT: u32 = 24;
    pub const GREEN_SHIFT: u32 = 16;
    pub const BLUE_SHIFT: u32 = 8;
    pub const ALPHA_SHIFT: u32 = 0;

    /// Perceptual weights for luminance, in hundredths.
    pub const RED_WEIGHT: u32 = 30;
    pub const GREEN_WEIGHT: u32 = 59;
    pub const BLUE_WEIGHT: u32 = 11;

    /// Compose a packed RGBA color.
    #[inline]
    pub fn compose_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | ((a as u32) << ALPHA_SHIFT)
    }

    /// Compose a packed RGB color (alpha = 255).
    #[inline]
    pub fn compose_rgb(r: u8, g: u8, b: u8) -> u32 {
        compose_rgba(r, g, b, 255)
    }

    /// Extract RGBA values from a packed color.
    #[inline]
    pub fn extract_rgba(pixel: u32) -> (u8, u8, u8, u8) {
        (
            (pixel >> RED_SHIFT) as u8,
            (pixel >> GREEN_SHIFT) as u8,
            (pixel >> BLUE_SHIFT) as u8,
            (pixel >> ALPHA_SHIFT) as u8,
        )
    }

    /// Luminance of an RGB triple.
    ///
    /// Computes `round(0.30 R + 0.59 G + 0.11 B)` in integer arithmetic, so
    /// the result is identical on every platform. The weights sum to 1, so
    /// the result never exceeds 255.
    #[inline]
    pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
        let sum = RED_WEIGHT * r as u32 + GREEN_WEIGHT * g as u32 + BLUE_WEIGHT * b as u32;
        ((sum + 50) / 100) as u8
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_luminance_reference_value() {
            assert_eq!(luminance(100, 150, 200), 141);
        }

        #[test]
        fn test_luminance_extremes() {
            assert_eq!(luminance(0, 0, 0), 0);
            assert_eq!(luminance(255, 255, 255), 255);
            assert_eq!(luminance(255, 0, 0), 77);
            assert_eq!(luminance(0, 255, 0), 150);
            assert_eq!(luminance(0, 0, 255), 28);
        }

        #[test]
        fn test_luminance_gray_is_identity() {
            for v in 0..=255u8 {
                assert_eq!(luminance(v, v, v), v);
            }
        }

        #[test]
        fn test_compose_extract() {
            let c = compose_rgba(1, 2, 3, 4);
            assert_eq!(c, 0x01020304);
            assert_eq!(extract_rgba(c), (1, 2, 3, 4));
            assert_eq!(compose_rgb(9, 8, 7) & 0xff, 255);
        }
    }
}
