//! Fixed-width big-endian integer encoding into byte buffers.
//!
//! Values are raw 32-bit patterns; signed or unsigned meaning is left to
//! the caller.

use crate::error::{ChainError, Result};

const WORD: usize = 4;

fn word_range(buf_len: usize, offset: usize) -> Result<std::ops::Range<usize>> {
    match offset.checked_add(WORD) {
        Some(end) if end <= buf_len => Ok(offset..end),
        _ => Err(ChainError::OutOfBounds {
            offset,
            len: WORD,
            buf_len,
        }),
    }
}

/// Read 4 bytes at `buf[offset]` as a big-endian integer.
pub fn decode_u32_be(buf: &[u8], offset: usize) -> Result<u32> {
    let range = word_range(buf.len(), offset)?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(&buf[range]);
    Ok(u32::from_be_bytes(word))
}

/// Write `value` big-endian into `buf[offset..offset + 4]`.
pub fn encode_u32_be(buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
    let range = word_range(buf.len(), offset)?;
    buf[range].copy_from_slice(&value.to_be_bytes());
    Ok(())
}

/// Read a word from a fixed-size record at a known field offset.
///
/// Panics if `offset + 4 > N`; only call with the record's layout constants.
pub(crate) fn word_at<const N: usize>(buf: &[u8; N], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

/// Write a word into a fixed-size record at a known field offset.
pub(crate) fn put_word_at<const N: usize>(buf: &mut [u8; N], offset: usize, value: u32) {
    buf[offset..offset + WORD].copy_from_slice(&value.to_be_bytes());
}
