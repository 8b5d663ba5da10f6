//! HanukCoin - a minimal educational ledger of proof-of-work records
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Records
//! - [`codec`] - Big-endian word encoding
//! - [`block`] - The 36-byte block record and its verification
//! - [`wallet`] - Wallet codes derived from names
//!
//! ## Consensus
//! - [`difficulty`] - Required trailing zero bits per serial number
//! - [`miner`] - Budgeted proof-of-work search
//! - [`chain`] - Chain validation and the in-memory chain
//!
//! ## Networking
//! - [`wire`] - Peer exchange framing
//! - [`network`] - TCP client and responder
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - CLI utilities

#![forbid(unsafe_code)]

// ============================================================================
// Core Records
// ============================================================================
pub mod block;
pub mod codec;
pub mod wallet;

// ============================================================================
// Consensus
// ============================================================================
pub mod chain;
pub mod difficulty;
pub mod miner;

// ============================================================================
// Networking
// ============================================================================
pub mod network;
pub mod wire;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;

pub use block::{Block, BlockStatus, BLOCK_SIZE};
pub use chain::{is_valid_chain, validate_chain, Chain};
pub use difficulty::DifficultyPolicy;
pub use error::{ChainError, Result};
pub use miner::{MineOutcome, Miner};
pub use wallet::wallet_code;
