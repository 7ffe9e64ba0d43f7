//! Packed fixed-width bit vectors for signal values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed-width vector of two-state bits packed for efficient storage.
///
/// 64 bits are packed per `u64` word. Bit index 0 is the least significant
/// bit. Equality is exact over the declared width: two vectors of different
/// widths are never equal, and comparisons never widen or truncate
/// implicitly; width adaptation happens explicitly via [`resized`](Self::resized).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitVec {
    width: u32,
    /// Packed storage: 64 bits per u64, unused high bits always zero.
    data: Vec<u64>,
}

/// Number of bits packed per u64 word.
const BITS_PER_WORD: u32 = 64;

impl BitVec {
    /// Creates a new `BitVec` of the given width, initialized to all zero.
    pub fn new(width: u32) -> Self {
        Self {
            width,
            data: vec![0; word_count(width)],
        }
    }

    /// Returns the number of bits in this vector.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Gets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> bool {
        assert!(
            index < self.width,
            "bit index {index} out of bounds for width {}",
            self.width
        );
        let word = (index / BITS_PER_WORD) as usize;
        let bit = index % BITS_PER_WORD;
        (self.data[word] >> bit) & 1 != 0
    }

    /// Sets the bit at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: bool) {
        assert!(
            index < self.width,
            "bit index {index} out of bounds for width {}",
            self.width
        );
        let word = (index / BITS_PER_WORD) as usize;
        let bit = index % BITS_PER_WORD;
        if value {
            self.data[word] |= 1 << bit;
        } else {
            self.data[word] &= !(1 << bit);
        }
    }

    /// Creates a single-bit `BitVec` from a boolean value.
    pub fn from_bool(value: bool) -> Self {
        let mut v = Self::new(1);
        if value {
            v.set(0, true);
        }
        v
    }

    /// Creates a `BitVec` from a `u64` value with the given width.
    ///
    /// Bits beyond the given width are discarded.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut v = Self::new(width);
        if width > 0 {
            v.data[0] = value & low_mask(width.min(64));
        }
        v
    }

    /// Creates a `BitVec` from raw words, masking bits beyond `width`.
    ///
    /// Word 0 holds bits 0..64, word 1 bits 64..128, and so on. Missing
    /// words are treated as zero; extra words are discarded.
    pub fn from_words(words: &[u64], width: u32) -> Self {
        let mut v = Self::new(width);
        for (i, slot) in v.data.iter_mut().enumerate() {
            *slot = words.get(i).copied().unwrap_or(0);
        }
        v.mask_top_word();
        v
    }

    /// Converts the `BitVec` to a `u64`.
    ///
    /// Returns `None` if the width exceeds 64 bits and a high bit is set.
    pub fn to_u64(&self) -> Option<u64> {
        if self.data.iter().skip(1).any(|&w| w != 0) {
            return None;
        }
        Some(self.data.first().copied().unwrap_or(0))
    }

    /// Returns true if every bit is zero.
    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|&w| w == 0)
    }

    /// Returns a copy adapted to `width`: truncated if narrower,
    /// zero-extended if wider.
    pub fn resized(&self, width: u32) -> Self {
        Self::from_words(&self.data, width)
    }

    fn mask_top_word(&mut self) {
        if self.width == 0 {
            return;
        }
        let rem = self.width % BITS_PER_WORD;
        if rem != 0 {
            if let Some(top) = self.data.last_mut() {
                *top &= low_mask(rem);
            }
        }
    }
}

impl fmt::Display for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width).rev() {
            write!(f, "{}", if self.get(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVec({self})")
    }
}

/// Returns the number of u64 words needed to store `width` bits.
fn word_count(width: u32) -> usize {
    width.div_ceil(BITS_PER_WORD) as usize
}

/// Returns a mask with the low `bits` bits set. `bits` must be 1..=64.
fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
