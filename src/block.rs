//! The 36-byte block record.
//!
//! ```text
//! offset size field
//!  0     4    serial number       (u32, big-endian)
//!  4     4    wallet number       (u32, big-endian)
//!  8     8    prev sig high       first 8 bytes of the predecessor's sig part
//! 16     8    puzzle              two big-endian u32 halves of one u64
//! 24    12    sig part            first 12 bytes of MD5(bytes[0..24])
//! ```
//!
//! The "signature" is a proof-of-work stamp, not an authorship signature:
//! anyone can recompute it and no key is involved.

use crate::codec::{put_word_at, word_at};
use crate::difficulty::DifficultyPolicy;
use crate::error::{ChainError, Result};
use md5::{Digest, Md5};
use std::cmp::Ordering;
use std::fmt;

pub const BLOCK_SIZE: usize = 36;

pub const SERIAL_OFFSET: usize = 0;
pub const WALLET_OFFSET: usize = 4;
pub const PREV_SIG_OFFSET: usize = 8;
pub const PUZZLE_OFFSET: usize = 16;
pub const SIG_OFFSET: usize = 24;

pub const PREV_SIG_LEN: usize = 8;
pub const PUZZLE_LEN: usize = 8;
pub const SIG_LEN: usize = 12;

/// Bytes covered by the digest: everything before the sig part.
const SIGNED_LEN: usize = SIG_OFFSET;

pub type Digest16 = [u8; 16];

/// Stand-in for a predecessor signature in the genesis record.
pub const GENESIS_TAG: &[u8; PREV_SIG_LEN] = b"TEST_BLK";
pub const GENESIS_PUZZLE: [u8; PUZZLE_LEN] = [0x71, 0x16, 0x8F, 0x29, 0xD9, 0xFE, 0xDF, 0xF9];
pub const GENESIS_SIG: [u8; SIG_LEN] = [
    0xBF, 0x3D, 0xAE, 0x1F, 0x65, 0xB0, 0x8F, 0x66, 0xAB, 0x2D, 0xB5, 0x1E,
];

/// Outcome of verifying a block on its own or against its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockStatus {
    Ok,
    /// Serial number is not the predecessor's plus one.
    BadSerialNo,
    /// Two consecutive blocks were mined by the same wallet.
    SameWalletPrev,
    /// Prev sig high does not match the predecessor's sig part.
    NoPrevSig,
    /// Digest lacks the required trailing zero bits.
    SigNoZeros,
    /// Stored sig part differs from the recomputed digest.
    SigBad,
}

impl BlockStatus {
    pub fn is_ok(self) -> bool {
        self == BlockStatus::Ok
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            BlockStatus::Ok => "ok",
            BlockStatus::BadSerialNo => "bad serial number",
            BlockStatus::SameWalletPrev => "same wallet as previous block",
            BlockStatus::NoPrevSig => "previous signature mismatch",
            BlockStatus::SigNoZeros => "signature lacks required zero bits",
            BlockStatus::SigBad => "signature does not match digest",
        };
        f.write_str(s)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Block {
    data: [u8; BLOCK_SIZE],
}

impl Block {
    /// Create an unsealed block: puzzle and sig part are zero.
    pub fn create(serial_number: u32, wallet_number: u32, prev_sig_high: &[u8]) -> Result<Self> {
        let prev: &[u8; PREV_SIG_LEN] =
            prev_sig_high
                .try_into()
                .map_err(|_| ChainError::InvalidLength {
                    field: "prev_sig_high",
                    expected: PREV_SIG_LEN,
                    actual: prev_sig_high.len(),
                })?;

        let mut data = [0u8; BLOCK_SIZE];
        put_word_at(&mut data, SERIAL_OFFSET, serial_number);
        put_word_at(&mut data, WALLET_OFFSET, wallet_number);
        data[PREV_SIG_OFFSET..PUZZLE_OFFSET].copy_from_slice(prev);
        Ok(Block { data })
    }

    /// Create a block with every field given, e.g. a known sealed record.
    pub fn create_sealed(
        serial_number: u32,
        wallet_number: u32,
        prev_sig_high: &[u8; PREV_SIG_LEN],
        puzzle: &[u8; PUZZLE_LEN],
        sig_part: &[u8; SIG_LEN],
    ) -> Self {
        let mut data = [0u8; BLOCK_SIZE];
        put_word_at(&mut data, SERIAL_OFFSET, serial_number);
        put_word_at(&mut data, WALLET_OFFSET, wallet_number);
        data[PREV_SIG_OFFSET..PUZZLE_OFFSET].copy_from_slice(prev_sig_high);
        data[PUZZLE_OFFSET..SIG_OFFSET].copy_from_slice(puzzle);
        data[SIG_OFFSET..].copy_from_slice(sig_part);
        Block { data }
    }

    /// The fixed root of the chain, re-verified like any mined block.
    pub fn genesis(policy: &DifficultyPolicy) -> Result<Self> {
        let block = Self::create_sealed(0, 0, GENESIS_TAG, &GENESIS_PUZZLE, &GENESIS_SIG);
        match block.verify_signature(policy) {
            BlockStatus::Ok => Ok(block),
            status => Err(ChainError::InvalidGenesis(status)),
        }
    }

    /// Parse a raw record. The slice must be exactly [`BLOCK_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let data: [u8; BLOCK_SIZE] = bytes.try_into().map_err(|_| ChainError::InvalidLength {
            field: "block",
            expected: BLOCK_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Block { data })
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.data
    }

    pub fn serial_number(&self) -> u32 {
        word_at(&self.data, SERIAL_OFFSET)
    }

    pub fn wallet_number(&self) -> u32 {
        word_at(&self.data, WALLET_OFFSET)
    }

    pub fn prev_sig_high(&self) -> &[u8] {
        &self.data[PREV_SIG_OFFSET..PUZZLE_OFFSET]
    }

    pub fn puzzle(&self) -> u64 {
        let high = u64::from(word_at(&self.data, PUZZLE_OFFSET));
        let low = u64::from(word_at(&self.data, PUZZLE_OFFSET + 4));
        (high << 32) | low
    }

    pub fn sig_part(&self) -> &[u8] {
        &self.data[SIG_OFFSET..]
    }

    /// The part of the sig a successor must carry as its prev sig high.
    pub fn sig_high(&self) -> &[u8] {
        &self.data[SIG_OFFSET..SIG_OFFSET + PREV_SIG_LEN]
    }

    /// Store the puzzle as two big-endian 32-bit halves.
    pub fn set_puzzle(&mut self, puzzle: u64) {
        put_word_at(&mut self.data, PUZZLE_OFFSET, (puzzle >> 32) as u32);
        put_word_at(&mut self.data, PUZZLE_OFFSET + 4, puzzle as u32);
    }

    /// MD5 over bytes 0..24. The sig part never feeds its own digest.
    pub fn digest(&self) -> Digest16 {
        Md5::digest(&self.data[..SIGNED_LEN]).into()
    }

    /// Copy the first 12 bytes of `digest` into the sig part.
    pub fn seal_signature(&mut self, digest: &Digest16) {
        self.data[SIG_OFFSET..].copy_from_slice(&digest[..SIG_LEN]);
    }

    /// Unsigned byte-wise comparison of the two puzzle fields.
    pub fn compare_puzzle(&self, other: &Block) -> Ordering {
        self.data[PUZZLE_OFFSET..SIG_OFFSET].cmp(&other.data[PUZZLE_OFFSET..SIG_OFFSET])
    }

    /// Check the proof of work and that the stored sig part matches it.
    pub fn verify_signature(&self, policy: &DifficultyPolicy) -> BlockStatus {
        let digest = self.digest();
        if !policy.is_satisfied_by(self.serial_number(), &digest) {
            return BlockStatus::SigNoZeros;
        }
        if self.sig_part() != &digest[..SIG_LEN] {
            return BlockStatus::SigBad;
        }
        BlockStatus::Ok
    }

    /// Check that this block may follow `prev`, then verify its own stamp.
    pub fn verify_links_to(&self, prev: &Block, policy: &DifficultyPolicy) -> BlockStatus {
        if prev.serial_number().checked_add(1) != Some(self.serial_number()) {
            return BlockStatus::BadSerialNo;
        }
        if self.wallet_number() == prev.wallet_number() {
            return BlockStatus::SameWalletPrev;
        }
        if self.prev_sig_high() != prev.sig_high() {
            return BlockStatus::NoPrevSig;
        }
        self.verify_signature(policy)
    }

    /// Hex dump for debugging: 8 bytes per line, split into words.
    pub fn bin_dump(&self) -> String {
        let mut dump = String::with_capacity(BLOCK_SIZE * 4);
        for (i, byte) in self.data.iter().enumerate() {
            if i > 0 && i % 8 == 0 {
                dump.push('\n');
            } else if i % 4 == 0 && i > 0 {
                dump.push(' ');
            }
            dump.push_str(&format!("{:02X} ", byte));
        }
        dump
    }
}

impl From<[u8; BLOCK_SIZE]> for Block {
    fn from(data: [u8; BLOCK_SIZE]) -> Self {
        Block { data }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Block")
            .field("serial_number", &self.serial_number())
            .field("wallet_number", &format_args!("{:#010x}", self.wallet_number()))
            .field("prev_sig_high", &hex::encode(self.prev_sig_high()))
            .field("puzzle", &format_args!("{:#018x}", self.puzzle()))
            .field("sig_part", &hex::encode(self.sig_part()))
            .finish()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "#{} wallet={:08x} prev={} sig={}",
            self.serial_number(),
            self.wallet_number(),
            hex::encode(self.prev_sig_high()),
            hex::encode(self.sig_part())
        )
    }
}
