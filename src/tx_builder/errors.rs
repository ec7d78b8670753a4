//! Error types for the transfer pipeline
//!
//! The taxonomy follows the life of one transfer:
//! - `EncodingError`: the amount could not be turned into an instruction payload
//! - `SubmissionError`: the signed transaction never made it onto the network
//! - `ConfirmationError`: the transaction reached the network but did not confirm
//!
//! Nothing here is retried. Every variant carries the original cause so the
//! caller sees exactly what the network or the program reported.

use solana_sdk::signature::Signature;
use thiserror::Error;

/// Amount could not be represented in the 8-byte payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Amount is below zero (only reachable from signed inputs such as TOML integers)
    #[error("Amount {0} is negative")]
    Negative(i128),

    /// Amount does not fit in 64 bits
    #[error("Amount {0} exceeds the 64-bit payload range")]
    Overflow(String),

    /// Amount text could not be parsed as an integer
    #[error("Malformed amount '{0}'")]
    Malformed(String),

    /// Payload bytes are not exactly 8 bytes long
    #[error("Invalid payload length: expected 8 bytes, got {0}")]
    InvalidLength(usize),
}

/// Transaction did not reach the network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Failed to fetch a recent blockhash
    #[error("Blockhash unavailable (endpoint: {endpoint}): {message}")]
    Blockhash { endpoint: String, message: String },

    /// Network-level failure (connection refused, DNS, HTTP transport)
    #[error("Transport error (endpoint: {endpoint}): {message}")]
    Transport { endpoint: String, message: String },

    /// Signing the transaction failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Transaction structure was rejected before execution
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    /// RPC server answered with an error unrelated to program execution
    #[error("RPC response error (endpoint: {endpoint}, code: {code:?}): {message}")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },
}

/// Transaction reached the network but did not confirm
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    /// Program logic (or the runtime on its behalf) rejected the instruction
    #[error("Transaction {signature} rejected: {reason}")]
    ProgramRejected { signature: String, reason: String },

    /// The network already processed this exact transaction
    #[error("Transaction {signature} was already processed")]
    AlreadyProcessed { signature: String },

    /// Blockhash expired before the transaction was confirmed
    #[error("Transaction {signature} expired before confirmation")]
    Expired { signature: String },

    /// Submission boundary timeout elapsed while awaiting confirmation
    #[error("Confirmation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Status polling failed
    #[error("Confirmation polling failed (endpoint: {endpoint}): {message}")]
    Polling { endpoint: String, message: String },
}

/// Top-level error for one transfer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Confirmation error: {0}")]
    Confirmation(#[from] ConfirmationError),
}

impl TransferError {
    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::Encoding(_) => "encoding",
            Self::Submission(SubmissionError::Blockhash { .. }) => "blockhash",
            Self::Submission(SubmissionError::Transport { .. }) => "transport",
            Self::Submission(SubmissionError::Signing(_)) => "signing",
            Self::Submission(SubmissionError::MalformedTransaction(_)) => "malformed",
            Self::Submission(SubmissionError::RpcResponse { .. }) => "rpc",
            Self::Confirmation(ConfirmationError::ProgramRejected { .. }) => "rejected",
            Self::Confirmation(ConfirmationError::AlreadyProcessed { .. }) => "duplicate",
            Self::Confirmation(ConfirmationError::Expired { .. }) => "expired",
            Self::Confirmation(ConfirmationError::Timeout { .. }) => "timeout",
            Self::Confirmation(ConfirmationError::Polling { .. }) => "polling",
        }
    }

    /// True when the program (or runtime) refused the transaction, as opposed
    /// to an infrastructure failure on the way there
    pub fn is_on_chain_rejection(&self) -> bool {
        matches!(
            self,
            Self::Confirmation(ConfirmationError::ProgramRejected { .. })
                | Self::Confirmation(ConfirmationError::AlreadyProcessed { .. })
        )
    }
}

// Convenience constructors for common error scenarios
impl TransferError {
    pub fn rejected(signature: &Signature, reason: impl Into<String>) -> Self {
        Self::Confirmation(ConfirmationError::ProgramRejected {
            signature: signature.to_string(),
            reason: reason.into(),
        })
    }

    pub fn already_processed(signature: &Signature) -> Self {
        Self::Confirmation(ConfirmationError::AlreadyProcessed {
            signature: signature.to_string(),
        })
    }

    pub fn expired(signature: &Signature) -> Self {
        Self::Confirmation(ConfirmationError::Expired {
            signature: signature.to_string(),
        })
    }

    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Confirmation(ConfirmationError::Timeout { timeout_ms })
    }

    pub fn signing(reason: impl Into<String>) -> Self {
        Self::Submission(SubmissionError::Signing(reason.into()))
    }
}

/// Error returned when an ordered sequence of transfers halts
#[derive(Error, Debug)]
#[error("Transfer {} of {total} failed: {source}", .index + 1)]
pub struct SequenceError {
    /// Zero-based position of the failing request
    pub index: usize,
    /// Number of requests in the sequence
    pub total: usize,
    /// Receipts of the transfers confirmed before the failure
    pub completed: Vec<crate::types::TransferReceipt>,
    #[source]
    pub source: TransferError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransferError::from(EncodingError::Negative(-5));
        assert_eq!(err.to_string(), "Encoding error: Amount -5 is negative");

        let err = TransferError::timeout(30_000);
        assert_eq!(
            err.to_string(),
            "Confirmation error: Confirmation timed out after 30000ms"
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            TransferError::from(EncodingError::InvalidLength(3)).category(),
            "encoding"
        );
        assert_eq!(TransferError::timeout(1).category(), "timeout");
        assert_eq!(
            TransferError::rejected(&Signature::default(), "custom program error: 0x1").category(),
            "rejected"
        );
        assert_eq!(
            TransferError::from(SubmissionError::Transport {
                endpoint: "http://localhost:8899".to_string(),
                message: "connection refused".to_string(),
            })
            .category(),
            "transport"
        );
    }

    #[test]
    fn test_timeout_is_not_a_rejection() {
        assert!(!TransferError::timeout(10).is_on_chain_rejection());
        assert!(TransferError::rejected(&Signature::default(), "insufficient").is_on_chain_rejection());
        assert!(TransferError::already_processed(&Signature::default()).is_on_chain_rejection());
        assert!(!TransferError::expired(&Signature::default()).is_on_chain_rejection());
    }

    #[test]
    fn test_sequence_error_display_is_one_based() {
        let err = SequenceError {
            index: 1,
            total: 3,
            completed: vec![],
            source: TransferError::timeout(5),
        };
        assert_eq!(
            err.to_string(),
            "Transfer 2 of 3 failed: Confirmation error: Confirmation timed out after 5ms"
        );
    }
}
