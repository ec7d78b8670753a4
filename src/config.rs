//! Configuration module for the lamport transfer client
//!
//! This module handles configuration loading from TOML files and environment
//! variables, and provides structured configuration types. Every field has a
//! default, so an empty file (or no file at all) reproduces the demonstration
//! flow against devnet.

use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Signer};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::rpc_manager::rpc_config::{parse_commitment, resolve_cluster_url};
use crate::submitter::SubmitterConfig;
use crate::tx_builder::{lamports_from_i64, EncodingError};
use crate::wallet::read_keypair_file;

/// Environment variable overriding `[network] rpc_url`
pub const ENV_RPC_URL: &str = "LAMPORT_TRANSFER_RPC_URL";
/// Environment variable overriding `[network] cluster`
pub const ENV_CLUSTER: &str = "LAMPORT_TRANSFER_CLUSTER";
/// Environment variable overriding `[program] program_id`
pub const ENV_PROGRAM_ID: &str = "LAMPORT_TRANSFER_PROGRAM_ID";
/// Environment variable overriding `[network] commitment`
pub const ENV_COMMITMENT: &str = "LAMPORT_TRANSFER_COMMITMENT";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Program keypair error: {0}")]
    ProgramKeypair(String),
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network endpoint configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Target program
    #[serde(default)]
    pub program: ProgramConfig,

    /// Where account keypairs live
    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Ordered list of transfers for `run`
    #[serde(default = "default_transfers")]
    pub transfers: Vec<TransferRoute>,

    /// Monitoring
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Named cluster, used when `rpc_url` is absent
    #[serde(default = "default_cluster")]
    pub cluster: String,

    /// Explicit RPC endpoint
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// processed, confirmed or finalized
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound on send + confirm for one transfer, in seconds
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,

    /// Delay between signature status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub skip_preflight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// Base58 program address; takes precedence over `keypair_path`
    #[serde(default)]
    pub program_id: Option<String>,

    /// Program keypair produced by the program build
    #[serde(default = "default_program_keypair_path")]
    pub keypair_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Directory holding `<name>.json` keypair files
    #[serde(default = "default_keypair_dir")]
    pub keypair_dir: PathBuf,
}

/// One configured transfer between named accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRoute {
    /// Sender account name
    pub from: String,

    /// Recipient account name or base58 address
    pub to: String,

    /// Amount in lamports, as written in the file
    pub lamports: i64,
}

impl TransferRoute {
    pub fn new(from: &str, to: &str, lamports: i64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            lamports,
        }
    }

    /// Validated amount
    pub fn amount(&self) -> Result<u64, EncodingError> {
        lamports_from_i64(self.lamports)
    }

    pub fn label(&self) -> String {
        format!("{} -> {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Log balances of every involved account before and after the run
    #[serde(default = "default_true")]
    pub log_balances: bool,
}

// Default value functions
fn default_cluster() -> String { "devnet".to_string() }
fn default_commitment() -> String { "confirmed".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_confirm_timeout() -> u64 { 60 }
fn default_poll_interval() -> u64 { 500 }
fn default_keypair_dir() -> PathBuf { PathBuf::from("accounts") }
fn default_program_keypair_path() -> Option<PathBuf> {
    Some(PathBuf::from("_dist/program/program-keypair.json"))
}
fn default_true() -> bool { true }
fn default_transfers() -> Vec<TransferRoute> {
    vec![
        TransferRoute::new("johnson", "light", 5_000_000),
        TransferRoute::new("david", "joy", 4_000_000),
        TransferRoute::new("joy", "johnson", 2_000_000),
    ]
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster(),
            rpc_url: None,
            commitment: default_commitment(),
            request_timeout_secs: default_request_timeout(),
            confirm_timeout_secs: default_confirm_timeout(),
            poll_interval_ms: default_poll_interval(),
            skip_preflight: false,
        }
    }
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: None,
            keypair_path: default_program_keypair_path(),
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            keypair_dir: default_keypair_dir(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_balances: default_true(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            program: ProgramConfig::default(),
            accounts: AccountsConfig::default(),
            transfers: default_transfers(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::IoError(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration with `.env` and environment variable overrides
    pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides looked up through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.network.rpc_url = Some(url);
        }
        if let Some(cluster) = lookup(ENV_CLUSTER) {
            self.network.cluster = cluster;
        }
        if let Some(program_id) = lookup(ENV_PROGRAM_ID) {
            self.program.program_id = Some(program_id);
        }
        if let Some(commitment) = lookup(ENV_COMMITMENT) {
            self.network.commitment = commitment;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.network.rpc_url {
            Some(url) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ConfigError::ValidationError(format!(
                        "Invalid URL format: {}",
                        url
                    )));
                }
            }
            None => {
                if resolve_cluster_url(&self.network.cluster).is_none() {
                    return Err(ConfigError::ValidationError(format!(
                        "Unknown cluster '{}': expected devnet, testnet, mainnet-beta or localnet",
                        self.network.cluster
                    )));
                }
            }
        }

        parse_commitment(&self.network.commitment)?;

        if self.network.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.network.confirm_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "confirm_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.network.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be > 0".to_string(),
            ));
        }

        if self.program.program_id.is_none() && self.program.keypair_path.is_none() {
            return Err(ConfigError::ValidationError(
                "Either program.program_id or program.keypair_path must be set".to_string(),
            ));
        }

        for (index, route) in self.transfers.iter().enumerate() {
            if route.from.trim().is_empty() || route.to.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Transfer #{} has an empty account name",
                    index + 1
                )));
            }
            route.amount().map_err(|e| {
                ConfigError::ValidationError(format!("Transfer #{}: {}", index + 1, e))
            })?;
        }

        Ok(())
    }

    /// Resolve the target program address
    pub fn program_id(&self) -> Result<Pubkey, ConfigError> {
        if let Some(program_id) = &self.program.program_id {
            return Pubkey::from_str(program_id.trim()).map_err(|e| {
                ConfigError::ValidationError(format!("Invalid program id '{}': {}", program_id, e))
            });
        }

        let path = self.program.keypair_path.as_ref().ok_or_else(|| {
            ConfigError::ValidationError("No program id or program keypair configured".to_string())
        })?;
        let keypair =
            read_keypair_file(path).map_err(|e| ConfigError::ProgramKeypair(e.to_string()))?;
        Ok(keypair.pubkey())
    }

    /// Submitter settings derived from this configuration
    pub fn submitter_config(&self) -> Result<SubmitterConfig, ConfigError> {
        Ok(SubmitterConfig::new(
            self.program_id()?,
            Duration::from_secs(self.network.confirm_timeout_secs),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Keypair;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_demo_flow() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.cluster, "devnet");
        assert_eq!(config.network.commitment, "confirmed");
        assert_eq!(config.transfers.len(), 3);
        assert_eq!(config.transfers[0], TransferRoute::new("johnson", "light", 5_000_000));
        assert_eq!(config.transfers[2].label(), "joy -> johnson");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.transfers.len(), 3);
        assert_eq!(config.accounts.keypair_dir, PathBuf::from("accounts"));
        assert!(config.monitoring.log_balances);
    }

    #[test]
    fn test_parse_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[network]
rpc_url = "http://127.0.0.1:8899"
commitment = "finalized"
confirm_timeout_secs = 10

[program]
program_id = "11111111111111111111111111111111"

[[transfers]]
from = "alice"
to = "bob"
lamports = 1_000
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.rpc_url.as_deref(), Some("http://127.0.0.1:8899"));
        assert_eq!(config.transfers, vec![TransferRoute::new("alice", "bob", 1_000)]);
        assert_eq!(config.program_id().unwrap(), Pubkey::default());
        assert_eq!(
            config.submitter_config().unwrap().confirm_timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_negative_amount_fails_validation() {
        let mut config = Config::default();
        config.transfers = vec![TransferRoute::new("a", "b", -1)];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let mut config = Config::default();
        config.network.rpc_url = Some("ws://localhost".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.network.commitment = "recent".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.network.confirm_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.program.keypair_path = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_RPC_URL, "http://10.0.0.1:8899"),
            (ENV_COMMITMENT, "processed"),
        ]);

        let mut config = Config::default();
        config.apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.network.rpc_url.as_deref(), Some("http://10.0.0.1:8899"));
        assert_eq!(config.network.commitment, "processed");
        assert_eq!(config.network.cluster, "devnet");
    }

    #[test]
    fn test_program_id_from_keypair_file() {
        let keypair = Keypair::new();
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{:?}", keypair.to_bytes().to_vec()).unwrap();

        let mut config = Config::default();
        config.program.keypair_path = Some(file.path().to_path_buf());
        assert_eq!(config.program_id().unwrap(), keypair.pubkey());
    }

    #[test]
    fn test_missing_program_keypair_is_reported() {
        let mut config = Config::default();
        config.program.keypair_path = Some(PathBuf::from("/nonexistent/program-keypair.json"));
        assert!(matches!(
            config.program_id(),
            Err(ConfigError::ProgramKeypair(_))
        ));
    }
}
