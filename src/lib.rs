//! Lamport Transfer - demonstration client for a custom Solana transfer program
//!
//! Encodes a lamport amount into the program's 8-byte instruction payload,
//! builds and signs the three-account transfer instruction, submits it and
//! awaits confirmation. Transfers in a sequence are strictly ordered and the
//! first failure stops the run.

pub mod config;
pub mod metrics;
pub mod observability;
pub mod rpc_manager;
pub mod structured_logging;
pub mod submitter;
pub mod tx_builder;
pub mod types;
pub mod wallet;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
pub use submitter::{SubmitterConfig, TransferSubmitter};
pub use tx_builder::{SequenceError, TransferError};
pub use types::{ConfirmationResult, TransferReceipt, TransferRequest};
