use solana_sdk::commitment_config::CommitmentConfig;
use std::time::Duration;

use crate::config::{ConfigError, NetworkConfig};

/// Resolved settings for one RPC endpoint
#[derive(Debug, Clone)]
pub struct RpcSettings {
    /// The RPC endpoint URL
    pub url: String,

    /// Commitment used for blockhash, preflight and confirmation
    pub commitment: CommitmentConfig,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Delay between signature status polls
    pub poll_interval: Duration,

    /// Skip preflight simulation on send
    pub skip_preflight: bool,
}

impl RpcSettings {
    /// Resolve settings from the `[network]` config section
    pub fn from_network_config(network: &NetworkConfig) -> Result<Self, ConfigError> {
        let url = match &network.rpc_url {
            Some(url) => url.clone(),
            None => resolve_cluster_url(&network.cluster)
                .ok_or_else(|| {
                    ConfigError::ValidationError(format!(
                        "Unknown cluster '{}' and no rpc_url given",
                        network.cluster
                    ))
                })?
                .to_string(),
        };

        Ok(Self {
            url,
            commitment: parse_commitment(&network.commitment)?,
            request_timeout: Duration::from_secs(network.request_timeout_secs),
            poll_interval: Duration::from_millis(network.poll_interval_ms),
            skip_preflight: network.skip_preflight,
        })
    }
}

/// Public RPC URL for a named cluster
pub fn resolve_cluster_url(cluster: &str) -> Option<&'static str> {
    match cluster.trim().to_ascii_lowercase().as_str() {
        "devnet" => Some("https://api.devnet.solana.com"),
        "testnet" => Some("https://api.testnet.solana.com"),
        "mainnet-beta" | "mainnet" => Some("https://api.mainnet-beta.solana.com"),
        "localnet" | "localhost" => Some("http://127.0.0.1:8899"),
        _ => None,
    }
}

/// Parse a commitment level name
pub fn parse_commitment(level: &str) -> Result<CommitmentConfig, ConfigError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(ConfigError::ValidationError(format!(
            "Invalid commitment level '{}': expected processed, confirmed or finalized",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::commitment_config::CommitmentLevel;

    #[test]
    fn test_resolve_cluster_url() {
        assert_eq!(
            resolve_cluster_url("devnet"),
            Some("https://api.devnet.solana.com")
        );
        assert_eq!(
            resolve_cluster_url("Mainnet-Beta"),
            Some("https://api.mainnet-beta.solana.com")
        );
        assert_eq!(resolve_cluster_url("localnet"), Some("http://127.0.0.1:8899"));
        assert_eq!(resolve_cluster_url("moonnet"), None);
    }

    #[test]
    fn test_parse_commitment() {
        assert_eq!(
            parse_commitment("confirmed").unwrap().commitment,
            CommitmentLevel::Confirmed
        );
        assert_eq!(
            parse_commitment(" FINALIZED ").unwrap().commitment,
            CommitmentLevel::Finalized
        );
        assert!(parse_commitment("max").is_err());
    }

    #[test]
    fn test_explicit_url_wins_over_cluster() {
        let mut network = NetworkConfig::default();
        network.rpc_url = Some("http://10.0.0.5:8899".to_string());
        network.cluster = "devnet".to_string();

        let settings = RpcSettings::from_network_config(&network).unwrap();
        assert_eq!(settings.url, "http://10.0.0.5:8899");
    }

    #[test]
    fn test_unknown_cluster_without_url_is_rejected() {
        let mut network = NetworkConfig::default();
        network.rpc_url = None;
        network.cluster = "moonnet".to_string();

        assert!(RpcSettings::from_network_config(&network).is_err());
    }
}
