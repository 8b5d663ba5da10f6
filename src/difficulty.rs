//! Proof-of-work difficulty.
//!
//! A block with serial number `s` must have a digest whose last
//! `base_zero_bits + bit_length(s)` bits are zero. Cost grows with the
//! logarithm of chain length, so verification stays cheap while the total
//! work behind a chain still increases with every block.

use crate::block::Digest16;

/// Base number of trailing zero bits required at serial 0.
pub const DEFAULT_BASE_ZERO_BITS: u32 = 20;

/// Returned by [`bit_length`] if no width in the probe range holds `n`.
pub const BIT_LENGTH_SENTINEL: u32 = 99;

/// Smallest `i` in `0..=32` such that `n` fits in its `i` low bits.
pub fn bit_length(n: u32) -> u32 {
    let n = u64::from(n);
    for i in 0..=32u32 {
        let mask = (1u64 << i) - 1;
        if n & mask == n {
            return i;
        }
    }
    BIT_LENGTH_SENTINEL
}

/// True if the last `n_zeros` bits of the digest are all zero.
///
/// Whole bytes are checked from the end first, then a mask over the
/// remaining low bits of the next byte. Requirements wider than the
/// digest can never be met.
pub fn has_trailing_zero_bits(digest: &Digest16, n_zeros: u32) -> bool {
    if n_zeros as usize > digest.len() * 8 {
        return false;
    }
    let full_bytes = (n_zeros / 8) as usize;
    let rest = n_zeros % 8;

    let tail = &digest[digest.len() - full_bytes..];
    if tail.iter().any(|&b| b != 0) {
        return false;
    }
    if rest == 0 {
        return true;
    }
    let mask = (1u8 << rest) - 1;
    digest[digest.len() - full_bytes - 1] & mask == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyPolicy {
    base_zero_bits: u32,
}

impl DifficultyPolicy {
    pub fn new(base_zero_bits: u32) -> Self {
        Self { base_zero_bits }
    }

    pub fn base_zero_bits(&self) -> u32 {
        self.base_zero_bits
    }

    /// Number of trailing zero bits a block with this serial must carry.
    pub fn required_zero_bits(&self, serial_number: u32) -> u32 {
        self.base_zero_bits + bit_length(serial_number)
    }

    /// Whether `digest` meets the difficulty for `serial_number`.
    pub fn is_satisfied_by(&self, serial_number: u32, digest: &Digest16) -> bool {
        has_trailing_zero_bits(digest, self.required_zero_bits(serial_number))
    }
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_ZERO_BITS)
    }
}
