//! Palette - Color table for indexed buffers
//!
//! A palette is used with 1, 2, 4, and 8 bpp buffers to map packed
//! indices to RGBA colors. Its capacity is `2^depth` entries.

pub mod reduce;

use crate::color;
use crate::error::{Error, Result};
use crate::format::PixelFormat;

/// RGBA color entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Rgba {
    /// Create a new RGBA color
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Create an RGB color (alpha = 255)
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, 255)
    }

    /// Create a grayscale color
    pub const fn gray(value: u8) -> Self {
        Self::rgb(value, value, value)
    }

    /// Unpack from `0xRRGGBBAA`.
    pub fn from_packed(pixel: u32) -> Self {
        let (r, g, b, a) = color::extract_rgba(pixel);
        Self::new(r, g, b, a)
    }

    /// Pack into `0xRRGGBBAA`.
    pub fn to_packed(self) -> u32 {
        color::compose_rgba(self.red, self.green, self.blue, self.alpha)
    }

    /// Luminance of the RGB channels; alpha is ignored.
    pub fn luminance(self) -> u8 {
        color::luminance(self.red, self.green, self.blue)
    }
}

/// The 16 EGA colors.
const EGA_COLORS: [Rgba; 16] = [
    Rgba::rgb(0x00, 0x00, 0x00),
    Rgba::rgb(0x00, 0x00, 0xAA),
    Rgba::rgb(0x00, 0xAA, 0x00),
    Rgba::rgb(0x00, 0xAA, 0xAA),
    Rgba::rgb(0xAA, 0x00, 0x00),
    Rgba::rgb(0xAA, 0x00, 0xAA),
    Rgba::rgb(0xAA, 0x55, 0x00),
    Rgba::rgb(0xAA, 0xAA, 0xAA),
    Rgba::rgb(0x55, 0x55, 0x55),
    Rgba::rgb(0x55, 0x55, 0xFF),
    Rgba::rgb(0x55, 0xFF, 0x55),
    Rgba::rgb(0x55, 0xFF, 0xFF),
    Rgba::rgb(0xFF, 0x55, 0x55),
    Rgba::rgb(0xFF, 0x55, 0xFF),
    Rgba::rgb(0xFF, 0xFF, 0x55),
    Rgba::rgb(0xFF, 0xFF, 0xFF),
];

/// Palette for indexed buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgba>,
    depth: u32,
}

impl Palette {
    /// Create an empty palette for the specified index depth
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDepth`] if `depth` is not 1, 2, 4, or 8.
    pub fn new(depth: u32) -> Result<Self> {
        let format = PixelFormat::from_index_bits(depth)?;
        let capacity = format.palette_capacity().unwrap_or(0);
        Ok(Self {
            colors: Vec::with_capacity(capacity),
            depth,
        })
    }

    /// Create a palette from a color list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteFull`] if `colors` exceeds the capacity.
    pub fn from_colors(depth: u32, colors: &[Rgba]) -> Result<Self> {
        let mut pal = Self::new(depth)?;
        if colors.len() > pal.max_entries() {
            return Err(Error::PaletteFull {
                capacity: pal.max_entries(),
            });
        }
        pal.colors.extend_from_slice(colors);
        Ok(pal)
    }

    /// Create a palette from packed `0xRRGGBBAA` colors.
    pub fn from_packed(depth: u32, colors: &[u32]) -> Result<Self> {
        let colors: Vec<Rgba> = colors.iter().map(|&c| Rgba::from_packed(c)).collect();
        Self::from_colors(depth, &colors)
    }

    /// Create an evenly spaced gray ramp filling the whole capacity.
    pub fn create_linear(depth: u32) -> Result<Self> {
        let mut pal = Self::new(depth)?;
        let n = pal.max_entries();
        let max = (n - 1) as u32;
        for i in 0..n as u32 {
            let v = (i * 255 + max / 2) / max;
            pal.colors.push(Rgba::gray(v as u8));
        }
        Ok(pal)
    }

    /// Default palette for an indexed format.
    ///
    /// - `Index1`: black, white
    /// - `Index2`: 4-level gray ramp
    /// - `Index4`: the 16 EGA colors
    /// - `Index8`: 3-3-2 RGB cube
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPaletteFormat`] for direct formats.
    pub fn default_for(format: PixelFormat) -> Result<Self> {
        match format {
            PixelFormat::Index1 | PixelFormat::Index2 => {
                Self::create_linear(format.bits_per_pixel())
            }
            PixelFormat::Index4 => Self::from_colors(4, &EGA_COLORS),
            PixelFormat::Index8 => {
                let mut pal = Self::new(8)?;
                for i in 0..=255u32 {
                    let r = ((i >> 5) & 0x7) * 255 / 7;
                    let g = ((i >> 2) & 0x7) * 255 / 7;
                    let b = (i & 0x3) * 255 / 3;
                    pal.colors.push(Rgba::rgb(r as u8, g as u8, b as u8));
                }
                Ok(pal)
            }
            PixelFormat::Rgb24 | PixelFormat::Rgba32 | PixelFormat::Gray8 | PixelFormat::Float => {
                Err(Error::UnsupportedPaletteFormat(format))
            }
        }
    }

    /// Get the index depth
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Get the number of colors
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Get maximum number of entries
    #[inline]
    pub fn max_entries(&self) -> usize {
        1usize << self.depth
    }

    /// Get a color by index
    pub fn get(&self, index: usize) -> Option<&Rgba> {
        self.colors.get(index)
    }

    /// Add a color and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteFull`] if the palette is at capacity.
    pub fn add_color(&mut self, color: Rgba) -> Result<usize> {
        if self.colors.len() >= self.max_entries() {
            return Err(Error::PaletteFull {
                capacity: self.max_entries(),
            });
        }
        self.colors.push(color);
        Ok(self.colors.len() - 1)
    }

    /// Replace the color at `index`.
    pub fn set_color(&mut self, index: usize, color: Rgba) -> Result<()> {
        let len = self.colors.len();
        let slot = self
            .colors
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        *slot = color;
        Ok(())
    }

    /// Index of the first entry bit-identical to `color`.
    pub fn find_exact(&self, color: Rgba) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    /// Check if every entry has R == G == B
    pub fn is_grayscale(&self) -> bool {
        self.colors
            .iter()
            .all(|c| c.red == c.green && c.green == c.blue)
    }

    /// Check if any entry is not fully opaque
    pub fn has_alpha(&self) -> bool {
        self.colors.iter().any(|c| c.alpha != 255)
    }

    /// Get all colors as a slice
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// All colors packed as `0xRRGGBBAA`.
    pub fn to_packed(&self) -> Vec<u32> {
        self.colors.iter().map(|c| c.to_packed()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_per_depth() {
        for (depth, cap) in [(1, 2), (2, 4), (4, 16), (8, 256)] {
            assert_eq!(Palette::new(depth).unwrap().max_entries(), cap);
        }
        assert_eq!(Palette::new(3), Err(Error::InvalidDepth(3)));
    }

    #[test]
    fn test_add_color_until_full() {
        let mut pal = Palette::new(1).unwrap();
        assert_eq!(pal.add_color(Rgba::gray(0)).unwrap(), 0);
        assert_eq!(pal.add_color(Rgba::gray(255)).unwrap(), 1);
        assert_eq!(
            pal.add_color(Rgba::gray(128)),
            Err(Error::PaletteFull { capacity: 2 })
        );
        assert_eq!(pal.len(), 2);
    }

    #[test]
    fn test_create_linear() {
        let pal = Palette::create_linear(2).unwrap();
        let values: Vec<u8> = pal.colors().iter().map(|c| c.red).collect();
        assert_eq!(values, vec![0, 85, 170, 255]);
        assert!(pal.is_grayscale());
    }

    #[test]
    fn test_default_palettes() {
        let p1 = Palette::default_for(PixelFormat::Index1).unwrap();
        assert_eq!(p1.colors(), &[Rgba::gray(0), Rgba::gray(255)]);

        let p4 = Palette::default_for(PixelFormat::Index4).unwrap();
        assert_eq!(p4.len(), 16);
        assert_eq!(p4.get(15), Some(&Rgba::gray(255)));

        let p8 = Palette::default_for(PixelFormat::Index8).unwrap();
        assert_eq!(p8.len(), 256);
        assert_eq!(p8.get(0), Some(&Rgba::gray(0)));
        assert_eq!(p8.get(255), Some(&Rgba::gray(255)));

        assert_eq!(
            Palette::default_for(PixelFormat::Rgb24),
            Err(Error::UnsupportedPaletteFormat(PixelFormat::Rgb24))
        );
    }

    #[test]
    fn test_packed_roundtrip() {
        let colors = [0xFF0000FF, 0x00FF0080];
        let pal = Palette::from_packed(2, &colors).unwrap();
        assert_eq!(pal.get(1), Some(&Rgba::new(0, 255, 0, 0x80)));
        assert_eq!(pal.to_packed(), colors.to_vec());
        assert!(pal.has_alpha());
    }

    #[test]
    fn test_find_exact_and_set() {
        let mut pal = Palette::from_colors(2, &[Rgba::rgb(1, 2, 3), Rgba::rgb(4, 5, 6)]).unwrap();
        assert_eq!(pal.find_exact(Rgba::rgb(4, 5, 6)), Some(1));
        assert_eq!(pal.find_exact(Rgba::new(4, 5, 6, 0)), None);
        pal.set_color(0, Rgba::gray(9)).unwrap();
        assert_eq!(pal.get(0), Some(&Rgba::gray(9)));
        assert!(pal.set_color(5, Rgba::gray(0)).is_err());
    }
}
