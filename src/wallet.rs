//! Keypair loading for named demo accounts

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Keypair loading errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Failed to read keypair file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse keypair JSON in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid keypair length in {path}: expected 64 bytes, got {len}")]
    InvalidLength { path: String, len: usize },

    #[error("Invalid keypair in {path}: all-zero key rejected")]
    AllZero { path: String },

    #[error("Invalid keypair bytes in {path}: {message}")]
    InvalidKey { path: String, message: String },

    #[error("Invalid account name '{0}'")]
    InvalidName(String),
}

/// Read a Solana CLI keypair file
///
/// Accepts the JSON array format written by `solana-keygen` and raw 64-byte
/// files.
pub fn read_keypair_file(path: impl AsRef<Path>) -> Result<Keypair, WalletError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let keypair_bytes = std::fs::read(path).map_err(|e| WalletError::Io {
        path: display.clone(),
        message: e.to_string(),
    })?;

    let bytes = if keypair_bytes.len() == 64 {
        keypair_bytes
    } else {
        serde_json::from_slice::<Vec<u8>>(&keypair_bytes).map_err(|e| WalletError::Parse {
            path: display.clone(),
            message: e.to_string(),
        })?
    };

    if bytes.len() != 64 {
        return Err(WalletError::InvalidLength {
            path: display,
            len: bytes.len(),
        });
    }
    if bytes.iter().all(|&b| b == 0) {
        return Err(WalletError::AllZero { path: display });
    }

    Keypair::try_from(bytes.as_slice()).map_err(|e| WalletError::InvalidKey {
        path: display,
        message: e.to_string(),
    })
}

/// Named keypairs stored as `<dir>/<name>.json`
///
/// Each keypair is read once; later lookups hand out the same `Arc`.
#[derive(Debug)]
pub struct KeyStore {
    dir: PathBuf,
    cache: HashMap<String, Arc<Keypair>>,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    /// File backing account `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Load (or fetch from cache) the keypair for account `name`
    pub fn load(&mut self, name: &str) -> Result<Arc<Keypair>, WalletError> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(WalletError::InvalidName(name.to_string()));
        }

        if let Some(keypair) = self.cache.get(name) {
            return Ok(Arc::clone(keypair));
        }

        let path = self.path_for(name);
        let keypair = Arc::new(read_keypair_file(&path)?);
        debug!(account = %name, pubkey = %keypair.pubkey(), "Loaded keypair");

        self.cache.insert(name.to_string(), Arc::clone(&keypair));
        Ok(keypair)
    }

    /// Resolve an account name or a base58 address to a public key
    ///
    /// A name with a keypair file wins over an identical-looking address.
    pub fn resolve_pubkey(&mut self, name_or_address: &str) -> Result<Pubkey, WalletError> {
        let trimmed = name_or_address.trim();
        if !self.path_for(trimmed).exists() {
            if let Ok(pubkey) = Pubkey::from_str(trimmed) {
                return Ok(pubkey);
            }
        }
        Ok(self.load(trimmed)?.pubkey())
    }

    /// Number of keypairs loaded so far
    pub fn loaded(&self) -> usize {
        self.cache.len()
    }
}
