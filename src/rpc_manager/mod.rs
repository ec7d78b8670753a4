//! RPC Manager Module
//!
//! Network boundary of the transfer pipeline: one request/response channel to
//! a ledger endpoint. The submitter only talks to the `LedgerRpc` trait, so the
//! production client and the in-memory test ledger are interchangeable.

use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};

use crate::tx_builder::TransferError;

// Submodules
pub mod rpc_config;
pub mod rpc_errors;
pub mod solana_rpc;

// Re-exports for convenience
pub use rpc_config::{parse_commitment, resolve_cluster_url, RpcSettings};
pub use solana_rpc::SolanaRpc;

/// Operations the transfer pipeline consumes from the network
///
/// Implementations must not retry: every call maps to at most one network
/// submission, and errors are returned as classified `TransferError`s.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Endpoint identifier used in logs and error context
    fn endpoint(&self) -> &str;

    /// Commitment level confirmations are awaited at
    fn commitment(&self) -> CommitmentConfig;

    /// Fetch a recent blockhash to sign against
    async fn latest_blockhash(&self) -> Result<Hash, TransferError>;

    /// Submit a signed transaction once
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, TransferError>;

    /// Suspend until `signature` reaches the configured commitment, is
    /// rejected, or its blockhash expires
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        recent_blockhash: &Hash,
    ) -> Result<(), TransferError>;

    /// Current balance of `pubkey` in lamports
    async fn balance(&self, pubkey: &Pubkey) -> Result<u64, TransferError>;
}
