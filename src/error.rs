//! Error types for HanukCoin

use crate::block::BlockStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Out of bounds: {len} bytes at offset {offset} in a buffer of {buf_len}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        buf_len: usize,
    },

    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid block at index {index}: {status}")]
    InvalidBlock { index: usize, status: BlockStatus },

    #[error("Genesis block failed verification: {0}")]
    InvalidGenesis(BlockStatus),

    #[error("Empty chain")]
    EmptyChain,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
