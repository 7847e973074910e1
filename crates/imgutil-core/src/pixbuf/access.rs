//! Packed index access
//!
//! Sub-byte indices are packed MSB first: in a 1 bpp row, pixel 0 is bit 7
//! of byte 0 and pixel 8 is bit 7 of byte 1. A row is addressed as a byte
//! slice plus a bit offset `x * bits`; any bits past the last pixel of a
//! row are padding and are never read.

use super::PixelBuffer;
use crate::error::{Error, Result};

/// Get a 1-bit index.
#[inline]
pub fn get_data_bit(line: &[u8], x: u32) -> u8 {
    (line[(x >> 3) as usize] >> (7 - (x & 7))) & 0x1
}

/// Set a 1-bit index.
#[inline]
pub fn set_data_bit(line: &mut [u8], x: u32, val: u8) {
    let shift = 7 - (x & 7);
    let byte = &mut line[(x >> 3) as usize];
    *byte = (*byte & !(0x1 << shift)) | ((val & 0x1) << shift);
}

/// Get a 2-bit index.
#[inline]
pub fn get_data_dibit(line: &[u8], x: u32) -> u8 {
    (line[(x >> 2) as usize] >> (2 * (3 - (x & 3)))) & 0x3
}

/// Set a 2-bit index.
#[inline]
pub fn set_data_dibit(line: &mut [u8], x: u32, val: u8) {
    let shift = 2 * (3 - (x & 3));
    let byte = &mut line[(x >> 2) as usize];
    *byte = (*byte & !(0x3 << shift)) | ((val & 0x3) << shift);
}

/// Get a 4-bit index.
#[inline]
pub fn get_data_qbit(line: &[u8], x: u32) -> u8 {
    (line[(x >> 1) as usize] >> (4 * (1 - (x & 1)))) & 0xf
}

/// Set a 4-bit index.
#[inline]
pub fn set_data_qbit(line: &mut [u8], x: u32, val: u8) {
    let shift = 4 * (1 - (x & 1));
    let byte = &mut line[(x >> 1) as usize];
    *byte = (*byte & !(0xf << shift)) | ((val & 0xf) << shift);
}

/// Get the index of pixel `x` in a row packed at `bits` per pixel.
///
/// # Panics
///
/// Panics if `bits` is not 1, 2, 4 or 8, or if `x` lies past the row.
#[inline]
pub fn get_packed(line: &[u8], x: u32, bits: u32) -> u8 {
    match bits {
        1 => get_data_bit(line, x),
        2 => get_data_dibit(line, x),
        4 => get_data_qbit(line, x),
        8 => line[x as usize],
        _ => panic!("invalid index depth: {bits}"),
    }
}

/// Set the index of pixel `x` in a row packed at `bits` per pixel.
///
/// Bits of `val` above the depth are discarded.
///
/// # Panics
///
/// Panics if `bits` is not 1, 2, 4 or 8, or if `x` lies past the row.
#[inline]
pub fn set_packed(line: &mut [u8], x: u32, bits: u32, val: u8) {
    match bits {
        1 => set_data_bit(line, x, val),
        2 => set_data_dibit(line, x, val),
        4 => set_data_qbit(line, x, val),
        8 => line[x as usize] = val,
        _ => panic!("invalid index depth: {bits}"),
    }
}

impl PixelBuffer {
    /// Get the palette index at (x, y).
    ///
    /// Returns `None` for out-of-bounds coordinates or a direct format.
    pub fn get_index(&self, x: u32, y: u32) -> Option<u8> {
        let bits = self.format().index_bits()?;
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(get_packed(self.row(y), x, bits))
    }

    /// Set the palette index at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if the coordinates are out of
    /// bounds or `val` does not fit the format's depth, and
    /// [`Error::InvalidParameter`] for direct formats.
    pub fn set_index(&mut self, x: u32, y: u32, val: u8) -> Result<()> {
        let format = self.format();
        let bits = format.index_bits().ok_or_else(|| {
            Error::InvalidParameter(format!("set_index on direct format {format:?}"))
        })?;
        if x >= self.width() {
            return Err(Error::IndexOutOfRange {
                index: x as usize,
                len: self.width() as usize,
            });
        }
        if y >= self.height() {
            return Err(Error::IndexOutOfRange {
                index: y as usize,
                len: self.height() as usize,
            });
        }
        let capacity = format.palette_capacity().unwrap_or(256);
        if val as usize >= capacity {
            return Err(Error::IndexOutOfRange {
                index: val as usize,
                len: capacity,
            });
        }
        set_packed(self.row_mut(y), x, bits, val);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_msb_first() {
        let line = [0b1000_0000u8, 0b0100_0000];
        assert_eq!(get_data_bit(&line, 0), 1);
        assert_eq!(get_data_bit(&line, 1), 0);
        assert_eq!(get_data_bit(&line, 8), 0);
        assert_eq!(get_data_bit(&line, 9), 1);
    }

    #[test]
    fn test_dibit_and_qbit_order() {
        let line = [0b11_10_01_00u8];
        let vals: Vec<u8> = (0..4).map(|x| get_data_dibit(&line, x)).collect();
        assert_eq!(vals, vec![3, 2, 1, 0]);

        let line = [0xA5u8];
        assert_eq!(get_data_qbit(&line, 0), 0xA);
        assert_eq!(get_data_qbit(&line, 1), 0x5);
    }

    #[test]
    fn test_set_preserves_neighbors() {
        for bits in [1u32, 2, 4, 8] {
            let mut line = vec![0u8; 4];
            let max = ((1u32 << bits) - 1) as u8;
            let n = 32 / bits;
            for x in 0..n {
                set_packed(&mut line, x, bits, (x as u8) & max);
            }
            for x in 0..n {
                assert_eq!(get_packed(&line, x, bits), (x as u8) & max, "bits={bits} x={x}");
            }
            set_packed(&mut line, 1, bits, 0);
            assert_eq!(get_packed(&line, 0, bits), 0);
            assert_eq!(get_packed(&line, 2, bits), 2 & max);
        }
    }

    #[test]
    fn test_set_masks_high_bits() {
        let mut line = [0u8];
        set_data_dibit(&mut line, 0, 0xFF);
        assert_eq!(line[0], 0b1100_0000);
    }
}
