//! Structured log events for the transfer pipeline

use crate::observability::TraceContext;
use crate::tx_builder::TransferError;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

/// Structured logger bound to one transfer's trace context
#[derive(Debug, Clone)]
pub struct TransferLogger {
    trace_id: String,
    correlation_id: String,
    step: String,
}

impl TransferLogger {
    pub fn new(ctx: &TraceContext) -> Self {
        Self {
            trace_id: ctx.trace_id.clone(),
            correlation_id: ctx.correlation_id.to_string(),
            step: ctx.step_label(),
        }
    }

    pub fn log_attempt(&self, sender: &Pubkey, recipient: &Pubkey, amount: u64) {
        tracing::info!(
            trace_id = %self.trace_id,
            correlation_id = %self.correlation_id,
            step = %self.step,
            sender = %sender,
            recipient = %recipient,
            amount = %amount,
            "Submitting transfer"
        );
    }

    pub fn log_sent(&self, signature: &Signature, endpoint: &str) {
        tracing::debug!(
            correlation_id = %self.correlation_id,
            signature = %signature,
            endpoint = %endpoint,
            "Transaction sent, awaiting confirmation"
        );
    }

    pub fn log_confirmed(&self, signature: &Signature, latency_ms: u64) {
        tracing::info!(
            trace_id = %self.trace_id,
            correlation_id = %self.correlation_id,
            step = %self.step,
            signature = %signature,
            latency_ms = %latency_ms,
            "Transfer confirmed"
        );
    }

    pub fn log_failure(&self, error: &TransferError, latency_ms: u64) {
        tracing::warn!(
            trace_id = %self.trace_id,
            correlation_id = %self.correlation_id,
            step = %self.step,
            category = %error.category(),
            error = %error,
            latency_ms = %latency_ms,
            "Transfer failed"
        );
    }
}
