//! Effective palette computation
//!
//! Reduces an arbitrary multiset of packed colors to the distinct colors it
//! actually contains, in first-occurrence order, together with a per-input
//! index into that list. Matching is exact on all 32 bits, alpha included.

use crate::error::{Error, Result};
use crate::format::{MAX_PALETTE_SIZE, PixelFormat};
use crate::palette::Palette;
use std::collections::HashMap;

/// Distinct colors of an input array and the index of each input element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePalette {
    /// Distinct packed colors in first-seen order
    pub colors: Vec<u32>,
    /// One entry per input color, indexing into `colors`
    pub indices: Vec<u8>,
}

impl EffectivePalette {
    /// Number of distinct colors.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Check if the input was empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Smallest indexed format able to address every distinct color.
    pub fn format(&self) -> PixelFormat {
        // len() <= 256 by construction
        PixelFormat::smallest_indexed(self.len()).unwrap_or(PixelFormat::Index8)
    }

    /// Build a [`Palette`] sized for [`EffectivePalette::format`].
    pub fn to_palette(&self) -> Result<Palette> {
        let depth = self.format().bits_per_pixel();
        Palette::from_packed(depth, &self.colors)
    }

    /// Re-expand the index array to the original colors.
    pub fn expand(&self) -> Vec<u32> {
        self.indices
            .iter()
            .map(|&i| self.colors[i as usize])
            .collect()
    }
}

/// Compute the effective palette of `colors`.
///
/// Runs in one pass with a hash lookup per element.
///
/// # Errors
///
/// Returns [`Error::PaletteOverflow`] as soon as a 257th distinct color is
/// seen. The input is never truncated or approximated.
///
/// # Examples
///
/// ```
/// use imgutil_core::effective_palette;
///
/// let ep = effective_palette(&[7, 3, 7, 9]).unwrap();
/// assert_eq!(ep.colors, vec![7, 3, 9]);
/// assert_eq!(ep.indices, vec![0, 1, 0, 2]);
/// ```
pub fn effective_palette(colors: &[u32]) -> Result<EffectivePalette> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut distinct = Vec::new();
    let mut indices = Vec::with_capacity(colors.len());

    for &c in colors {
        let idx = match lookup.get(&c) {
            Some(&idx) => idx,
            None => {
                if distinct.len() == MAX_PALETTE_SIZE {
                    return Err(Error::PaletteOverflow {
                        count: MAX_PALETTE_SIZE + 1,
                    });
                }
                let idx = distinct.len() as u8;
                distinct.push(c);
                lookup.insert(c, idx);
                idx
            }
        };
        indices.push(idx);
    }

    Ok(EffectivePalette {
        colors: distinct,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::compose_rgba;

    #[test]
    fn test_first_seen_order() {
        let red = compose_rgba(255, 0, 0, 255);
        let green = compose_rgba(0, 255, 0, 255);
        let blue = compose_rgba(0, 0, 255, 255);
        let ep = effective_palette(&[red, green, red, blue]).unwrap();
        assert_eq!(ep.colors, vec![red, green, blue]);
        assert_eq!(ep.indices, vec![0, 1, 0, 2]);
        assert_eq!(ep.format(), PixelFormat::Index2);
    }

    #[test]
    fn test_alpha_distinguishes_colors() {
        let opaque = compose_rgba(10, 20, 30, 255);
        let clear = compose_rgba(10, 20, 30, 0);
        let ep = effective_palette(&[opaque, clear, opaque]).unwrap();
        assert_eq!(ep.len(), 2);
        assert_eq!(ep.indices, vec![0, 1, 0]);
    }

    #[test]
    fn test_empty_input() {
        let ep = effective_palette(&[]).unwrap();
        assert!(ep.is_empty());
        assert!(ep.indices.is_empty());
    }

    #[test]
    fn test_exactly_256_colors() {
        let colors: Vec<u32> = (0..256u32).chain(0..256u32).collect();
        let ep = effective_palette(&colors).unwrap();
        assert_eq!(ep.len(), 256);
        assert_eq!(ep.format(), PixelFormat::Index8);
        assert_eq!(ep.expand(), colors);
    }

    #[test]
    fn test_overflow_on_257th_color() {
        let colors: Vec<u32> = (0..257u32).collect();
        assert_eq!(
            effective_palette(&colors),
            Err(Error::PaletteOverflow { count: 257 })
        );
    }

    #[test]
    fn test_expand_reproduces_input() {
        let colors: Vec<u32> = (0..1000u32).map(|i| (i * 7919) % 37).collect();
        let ep = effective_palette(&colors).unwrap();
        assert_eq!(ep.len(), 37);
        assert_eq!(ep.expand(), colors);
    }

    #[test]
    fn test_to_palette() {
        let ep = effective_palette(&[0x000000FF, 0xFFFFFFFF]).unwrap();
        let pal = ep.to_palette().unwrap();
        assert_eq!(pal.depth(), 1);
        assert_eq!(pal.len(), 2);
    }
}
