//! PixelBuffer - The owned raster container
//!
//! # Layout
//!
//! - Scanline `y` starts at byte `y * stride`
//! - `stride` is at least one packed scanline rounded up to a whole byte,
//!   and may include trailing padding
//! - Direct formats store channels in R, G, B, A order
//! - Indexed formats pack indices MSB first (see [`access`])
//!
//! # Ownership model
//!
//! A `PixelBuffer` exclusively owns its bytes and its optional palette.
//! Conversions borrow the source and return a new buffer; the source is
//! released by dropping it.

pub mod access;
mod convert;

use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::palette::Palette;

/// Owned raster with width, height, format and stride.
///
/// # Examples
///
/// ```
/// use imgutil_core::{PixelBuffer, PixelFormat};
///
/// let buf = PixelBuffer::new(9, 2, PixelFormat::Index1).unwrap();
/// assert_eq!(buf.stride(), 2);
/// assert_eq!(buf.data().len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
    palette: Option<Palette>,
}

impl PixelBuffer {
    /// Create a zeroed buffer with a tight stride.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let stride = format.min_stride(width);
        let size = Self::checked_size(width, height, stride)?;
        Self::from_raw(width, height, format, stride, vec![0u8; size])
    }

    /// Take ownership of raw bytes laid out with the given stride.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimension`] if width or height is 0
    /// - [`Error::InvalidStride`] if `stride` cannot hold one packed row
    /// - [`Error::BufferSize`] if `data` is shorter than `stride * height`
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let min = format.min_stride(width);
        if stride < min {
            return Err(Error::InvalidStride { stride, min });
        }
        let expected = Self::checked_size(width, height, stride)?;
        if data.len() < expected {
            return Err(Error::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            stride,
            data,
            palette: None,
        })
    }

    fn checked_size(width: u32, height: u32, stride: usize) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        stride.checked_mul(height as usize).ok_or_else(|| {
            Error::InvalidParameter(format!("buffer size overflow: {stride} x {height}"))
        })
    }

    /// Attach a palette, consuming and returning the buffer.
    pub fn with_palette(mut self, palette: Palette) -> Result<Self> {
        self.set_palette(Some(palette))?;
        Ok(self)
    }

    /// Replace the palette.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedPaletteFormat`] for direct formats
    /// - [`Error::PaletteFull`] if the palette has more entries than the
    ///   format can address
    pub fn set_palette(&mut self, palette: Option<Palette>) -> Result<()> {
        if let Some(pal) = &palette {
            let capacity = self
                .format
                .palette_capacity()
                .ok_or(Error::UnsupportedPaletteFormat(self.format))?;
            if pal.len() > capacity {
                return Err(Error::PaletteFull { capacity });
            }
        }
        self.palette = palette;
        Ok(())
    }

    /// Get the palette, if any.
    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Detach and return the palette.
    pub fn take_palette(&mut self) -> Option<Palette> {
        self.palette.take()
    }

    /// Get the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Get the bytes per scanline.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Check whether the stride has no padding.
    #[inline]
    pub fn is_tight(&self) -> bool {
        self.stride == self.format.min_stride(self.width)
    }

    /// Get the raw bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the raw bytes mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Move the raw bytes out, dropping the palette.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Move the raw bytes and palette out.
    pub fn into_parts(self) -> (Vec<u8>, Option<Palette>) {
        (self.data, self.palette)
    }

    /// Get scanline `y`, including any padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of bounds");
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Get scanline `y` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(y < self.height, "row {y} out of bounds");
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.stride]
    }

    /// Copy into a buffer whose stride has no padding.
    pub fn to_tight(&self) -> PixelBuffer {
        let stride = self.format.min_stride(self.width);
        let mut data = Vec::with_capacity(stride * self.height as usize);
        for y in 0..self.height {
            data.extend_from_slice(&self.row(y)[..stride]);
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            format: self.format,
            stride,
            data,
            palette: self.palette.clone(),
        }
    }

    /// Compare pixel content, ignoring stride padding and palettes.
    pub fn same_pixels(&self, other: &PixelBuffer) -> bool {
        if self.width != other.width || self.height != other.height || self.format != other.format
        {
            return false;
        }
        let bits = u64::from(self.width) * u64::from(self.format.bits_per_pixel());
        let full = (bits / 8) as usize;
        let rem = (bits % 8) as u32;
        (0..self.height).all(|y| {
            let a = self.row(y);
            let b = other.row(y);
            if a[..full] != b[..full] {
                return false;
            }
            if rem == 0 {
                return true;
            }
            let mask = 0xFFu8 << (8 - rem);
            a[full] & mask == b[full] & mask
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgba;

    #[test]
    fn test_new_zeroed_tight() {
        let buf = PixelBuffer::new(5, 3, PixelFormat::Rgb24).unwrap();
        assert_eq!(buf.stride(), 15);
        assert_eq!(buf.data().len(), 45);
        assert!(buf.data().iter().all(|&b| b == 0));
        assert!(buf.is_tight());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert_eq!(
            PixelBuffer::new(0, 3, PixelFormat::Gray8),
            Err(Error::InvalidDimension {
                width: 0,
                height: 3
            })
        );
    }

    #[test]
    fn test_from_raw_validates_stride_and_size() {
        assert_eq!(
            PixelBuffer::from_raw(9, 1, PixelFormat::Index1, 1, vec![0; 1]),
            Err(Error::InvalidStride { stride: 1, min: 2 })
        );
        assert_eq!(
            PixelBuffer::from_raw(4, 2, PixelFormat::Gray8, 6, vec![0; 10]),
            Err(Error::BufferSize {
                expected: 12,
                actual: 10
            })
        );
        let buf = PixelBuffer::from_raw(4, 2, PixelFormat::Gray8, 6, vec![0; 12]).unwrap();
        assert!(!buf.is_tight());
    }

    #[test]
    fn test_palette_only_on_indexed() {
        let pal = Palette::from_colors(1, &[Rgba::gray(0)]).unwrap();
        let mut buf = PixelBuffer::new(2, 2, PixelFormat::Gray8).unwrap();
        assert_eq!(
            buf.set_palette(Some(pal.clone())),
            Err(Error::UnsupportedPaletteFormat(PixelFormat::Gray8))
        );

        let buf = PixelBuffer::new(2, 2, PixelFormat::Index4)
            .unwrap()
            .with_palette(pal)
            .unwrap();
        assert_eq!(buf.palette().map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_palette_larger_than_format() {
        let pal = Palette::create_linear(4).unwrap();
        let mut buf = PixelBuffer::new(2, 2, PixelFormat::Index2).unwrap();
        assert_eq!(
            buf.set_palette(Some(pal)),
            Err(Error::PaletteFull { capacity: 4 })
        );
    }

    #[test]
    fn test_to_tight_and_same_pixels() {
        let data = vec![1, 2, 3, 0xEE, 4, 5, 6, 0xDD];
        let padded = PixelBuffer::from_raw(3, 2, PixelFormat::Gray8, 4, data).unwrap();
        let tight = padded.to_tight();
        assert_eq!(tight.data(), &[1, 2, 3, 4, 5, 6]);
        assert!(padded.same_pixels(&tight));
        assert_ne!(padded, tight);
    }

    #[test]
    fn test_same_pixels_ignores_padding_bits() {
        let a = PixelBuffer::from_raw(3, 1, PixelFormat::Index1, 1, vec![0b1010_0000]).unwrap();
        let b = PixelBuffer::from_raw(3, 1, PixelFormat::Index1, 1, vec![0b1011_1111]).unwrap();
        let c = PixelBuffer::from_raw(3, 1, PixelFormat::Index1, 1, vec![0b1110_0000]).unwrap();
        assert!(a.same_pixels(&b));
        assert!(!a.same_pixels(&c));
    }

    #[test]
    fn test_handoff_parts_and_back() {
        let pal = Palette::from_colors(2, &[Rgba::gray(10), Rgba::gray(20)]).unwrap();
        let mut buf = PixelBuffer::from_raw(3, 2, PixelFormat::Index2, 2, vec![0; 4])
            .unwrap()
            .with_palette(pal.clone())
            .unwrap();
        buf.data_mut()[2] = 0b0100_0000;
        assert_eq!(buf.get_index(0, 1), Some(1));

        let (data, palette) = buf.clone().into_parts();
        assert_eq!(data, vec![0, 0, 0b0100_0000, 0]);
        assert_eq!(palette.as_ref(), Some(&pal));
        let rebuilt = PixelBuffer::from_raw(3, 2, PixelFormat::Index2, 2, data)
            .unwrap()
            .with_palette(pal.clone())
            .unwrap();
        assert_eq!(rebuilt, buf);

        let taken = buf.take_palette();
        assert_eq!(taken, Some(pal));
        assert!(buf.palette().is_none());
        assert_eq!(buf.take_palette(), None);
        assert_eq!(buf.into_data(), vec![0, 0, 0b0100_0000, 0]);
    }

    #[test]
    fn test_set_get_index() {
        let mut buf = PixelBuffer::new(9, 2, PixelFormat::Index1).unwrap();
        buf.set_index(8, 1, 1).unwrap();
        assert_eq!(buf.get_index(8, 1), Some(1));
        assert_eq!(buf.row(1), &[0x00, 0x80]);
        assert!(buf.set_index(0, 0, 2).is_err());
        assert!(buf.set_index(9, 0, 1).is_err());
        assert_eq!(buf.get_index(9, 0), None);
    }
}
