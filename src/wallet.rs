//! Wallet identity: a 32-bit label derived from a human-readable name.
//!
//! The code is the first four bytes of the MD5 digest of the name, read
//! big-endian. It identifies the miner of a block and is never a secret.

use crate::codec::word_at;
use md5::{Digest, Md5};

pub type WalletCode = u32;

/// Map a user or team name to its wallet code.
pub fn wallet_code(name: &str) -> WalletCode {
    let digest: [u8; 16] = Md5::digest(name.as_bytes()).into();
    word_at(&digest, 0)
}
