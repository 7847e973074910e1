//! Format dispatch for [`PixelBuffer`]
//!
//! Routes every (source, target) pair to the direct converter, the indexed
//! codec, or the palette reducer. Float buffers are carried but never
//! converted.

use super::PixelBuffer;
use crate::convert::{ConvertOptions, OutOfRangePolicy, convert_direct};
use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::indexed::{index_direct, indexed_to_indexed, unpack};
use crate::palette::Palette;
use crate::palette::reduce::effective_palette;

impl PixelBuffer {
    /// Convert to `target` with default options.
    ///
    /// Conversion rules:
    /// - **direct -> direct**: channel copy, alpha = 255, or luminance
    /// - **indexed -> direct**: palette lookup (out-of-range indices clamp)
    /// - **direct -> indexed**: exact effective palette; fails if the
    ///   distinct colors exceed the target's capacity
    /// - **indexed -> indexed**: duplicate palette entries are merged and
    ///   indices remapped to the target depth
    /// - **Float**: unsupported in either position
    ///
    /// The result always owns a fresh buffer with a tight stride.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgutil_core::{PixelBuffer, PixelFormat};
    ///
    /// let data = vec![1, 2, 3, 4, 5, 6];
    /// let rgb = PixelBuffer::from_raw(2, 1, PixelFormat::Rgb24, 6, data).unwrap();
    /// let rgba = rgb.convert(PixelFormat::Rgba32).unwrap();
    /// assert_eq!(rgba.data(), &[1, 2, 3, 255, 4, 5, 6, 255]);
    /// ```
    pub fn convert(&self, target: PixelFormat) -> Result<PixelBuffer> {
        self.convert_with(target, &ConvertOptions::default())
    }

    /// Convert to `target` with explicit options.
    pub fn convert_with(
        &self,
        target: PixelFormat,
        options: &ConvertOptions,
    ) -> Result<PixelBuffer> {
        use PixelFormat::*;

        let (w, h, stride) = (self.width(), self.height(), self.stride());
        let from = self.format();
        match (from, target) {
            (Float, _) | (_, Float) => Err(Error::UnsupportedFormat { from, to: target }),
            (Rgb24 | Rgba32 | Gray8, Rgb24 | Rgba32 | Gray8) => {
                convert_direct(self.data(), stride, w, h, from, target)
            }
            (Index1 | Index2 | Index4 | Index8, Rgb24 | Rgba32 | Gray8) => {
                let palette = self.palette().ok_or(Error::PaletteRequired)?;
                let bits = from.bits_per_pixel();
                unpack(w, h, self.data(), stride, bits, palette, target, options.out_of_range)
            }
            (Rgb24 | Rgba32 | Gray8, Index1 | Index2 | Index4 | Index8) => {
                index_direct(self.data(), stride, w, h, from, Some(target))
            }
            (Index1 | Index2 | Index4 | Index8, Index1 | Index2 | Index4 | Index8) => {
                self.repack_indexed(target, options.out_of_range)
            }
        }
    }

    /// Merge duplicate palette entries and repack at `target` depth.
    fn repack_indexed(&self, target: PixelFormat, policy: OutOfRangePolicy) -> Result<PixelBuffer> {
        let palette = self.palette().ok_or(Error::PaletteRequired)?;
        let bits = self.format().bits_per_pixel();
        let ep = effective_palette(&palette.to_packed())?;
        let capacity = target.palette_capacity().unwrap_or(0);
        if ep.len() > capacity {
            return Err(Error::PaletteOverflow { count: ep.len() });
        }

        let mut remap = ep.indices.clone();
        if let (OutOfRangePolicy::Clamp, Some(&last)) = (policy, ep.indices.last()) {
            remap.resize(1usize << bits, last);
        }

        let out = indexed_to_indexed(
            self.width(),
            self.height(),
            self.data(),
            self.stride(),
            bits,
            target,
            &remap,
        )?;
        out.with_palette(Palette::from_packed(target.bits_per_pixel(), &ep.colors)?)
    }

    /// Repack an indexed buffer to the smallest format holding the colors
    /// its pixels actually use.
    ///
    /// Unused palette entries are dropped and duplicates merged; the new
    /// palette is ordered by first use in scan order.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParameter`] for direct formats
    /// - [`Error::PaletteRequired`] without a palette
    /// - [`Error::IndexOutOfRange`] if a pixel index has no palette entry
    pub fn compact_palette(&self) -> Result<PixelBuffer> {
        let format = self.format();
        let bits = format.index_bits().ok_or_else(|| {
            Error::InvalidParameter(format!("compact_palette on direct format {format:?}"))
        })?;
        let palette = self.palette().ok_or(Error::PaletteRequired)?;

        let mut seen = vec![false; 1usize << bits];
        let mut order = Vec::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                let idx = self.get_index(x, y).unwrap_or(0) as usize;
                if !seen[idx] {
                    seen[idx] = true;
                    order.push(idx);
                }
            }
        }

        let colors = order
            .iter()
            .map(|&i| {
                palette
                    .get(i)
                    .map(|c| c.to_packed())
                    .ok_or(Error::IndexOutOfRange {
                        index: i,
                        len: palette.len(),
                    })
            })
            .collect::<Result<Vec<u32>>>()?;
        let ep = effective_palette(&colors)?;

        let mut remap = vec![0u8; 1usize << bits];
        for (&i, &mapped) in order.iter().zip(&ep.indices) {
            remap[i] = mapped;
        }
        let target = ep.format();
        indexed_to_indexed(
            self.width(),
            self.height(),
            self.data(),
            self.stride(),
            bits,
            target,
            &remap,
        )?
        .with_palette(ep.to_palette()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgba;

    #[test]
    fn test_float_is_unsupported() {
        let buf = PixelBuffer::new(2, 2, PixelFormat::Float).unwrap();
        assert_eq!(
            buf.convert(PixelFormat::Gray8),
            Err(Error::UnsupportedFormat {
                from: PixelFormat::Float,
                to: PixelFormat::Gray8
            })
        );
        let gray = PixelBuffer::new(2, 2, PixelFormat::Gray8).unwrap();
        assert!(gray.convert(PixelFormat::Float).is_err());
    }

    #[test]
    fn test_same_format_is_tight_copy() {
        let data = vec![1, 2, 0, 0, 3, 4, 0, 0];
        let padded = PixelBuffer::from_raw(2, 2, PixelFormat::Gray8, 4, data).unwrap();
        let copy = padded.convert(PixelFormat::Gray8).unwrap();
        assert_eq!(copy.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_indexed_requires_palette() {
        let buf = PixelBuffer::new(2, 2, PixelFormat::Index2).unwrap();
        assert_eq!(buf.convert(PixelFormat::Rgb24), Err(Error::PaletteRequired));
    }

    #[test]
    fn test_direct_to_specific_index_depth() {
        let gray = PixelBuffer::from_raw(3, 1, PixelFormat::Gray8, 3, vec![0, 255, 0]).unwrap();
        let idx8 = gray.convert(PixelFormat::Index8).unwrap();
        assert_eq!(idx8.data(), &[0, 1, 0]);
        assert_eq!(idx8.palette().unwrap().len(), 2);

        let many = PixelBuffer::from_raw(5, 1, PixelFormat::Gray8, 5, vec![1, 2, 3, 4, 5]).unwrap();
        assert_eq!(
            many.convert(PixelFormat::Index2),
            Err(Error::PaletteOverflow { count: 5 })
        );
    }

    #[test]
    fn test_repack_merges_duplicate_entries() {
        let pal = Palette::from_colors(
            8,
            &[Rgba::gray(9), Rgba::gray(7), Rgba::gray(9), Rgba::gray(7)],
        )
        .unwrap();
        let buf = PixelBuffer::from_raw(4, 1, PixelFormat::Index8, 4, vec![0, 1, 2, 3])
            .unwrap()
            .with_palette(pal)
            .unwrap();
        let out = buf.convert(PixelFormat::Index1).unwrap();
        assert_eq!(out.data(), &[0b0101_0000]);
        assert_eq!(out.palette().unwrap().colors(), &[Rgba::gray(9), Rgba::gray(7)]);
    }

    #[test]
    fn test_repack_clamps_out_of_range() {
        let pal = Palette::from_colors(2, &[Rgba::gray(1), Rgba::gray(2)]).unwrap();
        let buf = PixelBuffer::from_raw(2, 1, PixelFormat::Index2, 1, vec![0b11_00_0000])
            .unwrap()
            .with_palette(pal)
            .unwrap();
        let out = buf.convert(PixelFormat::Index8).unwrap();
        assert_eq!(out.data(), &[1, 0]);
        assert!(
            buf.convert_with(PixelFormat::Index8, &ConvertOptions::strict())
                .is_err()
        );
    }

    #[test]
    fn test_compact_palette_drops_unused() {
        let pal = Palette::default_for(PixelFormat::Index8).unwrap();
        let data = vec![200, 17, 200, 17, 17, 200];
        let buf = PixelBuffer::from_raw(3, 2, PixelFormat::Index8, 3, data)
            .unwrap()
            .with_palette(pal.clone())
            .unwrap();
        let compact = buf.compact_palette().unwrap();
        assert_eq!(compact.format(), PixelFormat::Index1);
        assert_eq!(
            compact.palette().unwrap().colors(),
            &[*pal.get(200).unwrap(), *pal.get(17).unwrap()]
        );
        assert!(
            compact
                .convert(PixelFormat::Rgba32)
                .unwrap()
                .same_pixels(&buf.convert(PixelFormat::Rgba32).unwrap())
        );
    }
}
