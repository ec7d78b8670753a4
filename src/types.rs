//! Common types used throughout the application

use crate::observability::CorrelationId;
use crate::tx_builder::TransferError;
use solana_sdk::{
    commitment_config::CommitmentLevel,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::fmt;
use std::sync::Arc;

/// One transfer to submit
///
/// The sender key is shared, never copied: whoever loaded the keypair keeps
/// ownership and the request only references it. A request is consumed by
/// submission and cannot be duplicated:
///
/// ```compile_fail
/// fn assert_clone<T: Clone>() {}
/// assert_clone::<lamport_transfer::types::TransferRequest>();
/// ```
pub struct TransferRequest {
    /// Signing authority and fee payer
    pub sender: Arc<Keypair>,

    /// Account credited by the program
    pub recipient: Pubkey,

    /// Amount in lamports
    pub amount: u64,

    /// Human-readable route for logs (e.g. "johnson -> light")
    pub label: Option<String>,
}

impl TransferRequest {
    pub fn new(sender: Arc<Keypair>, recipient: Pubkey, amount: u64) -> Self {
        Self {
            sender,
            recipient,
            amount,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn sender_pubkey(&self) -> Pubkey {
        self.sender.pubkey()
    }
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("sender", &self.sender.pubkey())
            .field("recipient", &self.recipient)
            .field("amount", &self.amount)
            .field("label", &self.label)
            .finish()
    }
}

/// Proof that a transfer reached the requested commitment level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Transaction signature
    pub signature: Signature,

    pub sender: Pubkey,
    pub recipient: Pubkey,

    /// Amount in lamports
    pub amount: u64,

    /// Commitment level the confirmation was observed at
    pub commitment: CommitmentLevel,

    /// Correlation ID attached to every log line of this submission
    pub correlation_id: CorrelationId,

    /// Build + send + confirm latency
    pub latency_ms: u64,
}

/// Terminal outcome of one submitted transfer
pub type ConfirmationResult = Result<TransferReceipt, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_debug_hides_secret_key() {
        let sender = Arc::new(Keypair::new());
        let request = TransferRequest::new(sender.clone(), Pubkey::new_unique(), 10)
            .with_label("johnson -> light");

        let debug = format!("{:?}", request);
        assert!(debug.contains(&sender.pubkey().to_string()));
        assert!(debug.contains("johnson -> light"));
        assert!(!debug.contains(&sender.to_base58_string()));
    }

    #[test]
    fn test_request_shares_keypair() {
        let sender = Arc::new(Keypair::new());
        let request = TransferRequest::new(Arc::clone(&sender), Pubkey::new_unique(), 1);

        assert_eq!(Arc::strong_count(&sender), 2);
        assert_eq!(request.sender_pubkey(), sender.pubkey());
    }
}
