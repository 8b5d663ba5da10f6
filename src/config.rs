//! Configuration management for HanukCoin

use crate::difficulty::{DifficultyPolicy, DEFAULT_BASE_ZERO_BITS};
use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "hanukcoin.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub difficulty: DifficultyConfig,
    #[serde(default)]
    pub miner: MinerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DifficultyConfig {
    #[serde(default = "default_base_zero_bits")]
    pub base_zero_bits: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_wallet_name")]
    pub wallet_name: String,
    #[serde(default = "default_attempt_budget")]
    pub attempt_budget: u64,
    #[serde(default = "default_threads")]
    pub threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_node_name")]
    pub node_name: String,
    #[serde(default = "default_listen_host")]
    pub listen_host: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default)]
    pub peers: Vec<String>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_zero_bits: default_base_zero_bits(),
        }
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            wallet_name: default_wallet_name(),
            attempt_budget: default_attempt_budget(),
            threads: default_threads(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            peers: Vec::new(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn policy(&self) -> DifficultyPolicy {
        DifficultyPolicy::new(self.difficulty.base_zero_bits)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.network.listen_host, self.network.listen_port)
    }

    fn validate(&self) -> Result<()> {
        // A 16-byte digest has 128 bits to be zero
        if self.difficulty.base_zero_bits > 128 {
            return Err(ChainError::Config(format!(
                "difficulty.base_zero_bits must be at most 128, got {}",
                self.difficulty.base_zero_bits
            )));
        }
        if self.miner.attempt_budget == 0 {
            return Err(ChainError::Config(
                "miner.attempt_budget must be positive".to_string(),
            ));
        }
        if self.miner.threads == 0 {
            return Err(ChainError::Config("miner.threads must be positive".to_string()));
        }
        if self.miner.wallet_name.is_empty() {
            return Err(ChainError::Config("miner.wallet_name must be set".to_string()));
        }
        if self.network.node_name.len() > u8::MAX as usize {
            return Err(ChainError::Config(
                "network.node_name must fit in 255 bytes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load the configuration at `path`, falling back to defaults if it is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    match fs::read_to_string(path.as_ref()) {
        Ok(s) => Config::from_toml_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

fn default_base_zero_bits() -> u32 {
    DEFAULT_BASE_ZERO_BITS
}

fn default_wallet_name() -> String {
    "TEST1".to_string()
}

fn default_attempt_budget() -> u64 {
    10_000_000
}

fn default_threads() -> usize {
    1
}

fn default_node_name() -> String {
    "hanukcoin".to_string()
}

fn default_listen_host() -> String {
    "127.0.0.1".to_string()
}

fn default_listen_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.difficulty.base_zero_bits, 20);
        assert_eq!(config.miner.attempt_budget, 10_000_000);
        assert_eq!(config.miner.threads, 1);
        assert_eq!(config.network.listen_port, 8080);
        assert!(config.network.peers.is_empty());
        assert_eq!(config.policy(), DifficultyPolicy::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [difficulty]
            base_zero_bits = 8

            [network]
            listen_port = 9000
            peers = ["10.0.0.1:8080", "10.0.0.2:8080"]
            "#,
        )
        .unwrap();
        assert_eq!(config.policy().required_zero_bits(1), 9);
        assert_eq!(config.miner.wallet_name, "TEST1");
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
        assert_eq!(config.network.peers.len(), 2);
    }

    #[test]
    fn test_rejects_bad_values() {
        for doc in [
            "[difficulty]\nbase_zero_bits = 129",
            "[miner]\nthreads = 0",
            "[miner]\nattempt_budget = 0",
            "[miner]\nwallet_name = \"\"",
        ] {
            assert!(
                matches!(Config::from_toml_str(doc), Err(ChainError::Config(_))),
                "accepted: {}",
                doc
            );
        }
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        assert!(matches!(
            Config::from_toml_str("[miner\nthreads = 2"),
            Err(ChainError::Config(_))
        ));
    }
}
