//! Transfer Submitter
//!
//! Turns a `TransferRequest` into a signed transaction, submits it exactly once
//! and awaits confirmation at the endpoint's commitment level. Failures are
//! handed back as they were classified at the RPC boundary; nothing here
//! retries.

use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::metrics::{Metrics, Timer};
use crate::observability::TraceContext;
use crate::rpc_manager::LedgerRpc;
use crate::structured_logging::TransferLogger;
use crate::tx_builder::{
    build_signed_transfer, InstructionPayload, SequenceError, SubmissionError, TransferError,
    TRANSFER_ACCOUNT_COUNT,
};
use crate::types::{ConfirmationResult, TransferReceipt, TransferRequest};

/// Immutable submitter configuration, built once from the loaded `Config`
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Program every transfer instruction is addressed to
    pub program_id: Pubkey,

    /// Upper bound on send + confirm for one transaction
    pub confirm_timeout: Duration,
}

impl SubmitterConfig {
    pub fn new(program_id: Pubkey, confirm_timeout: Duration) -> Self {
        Self {
            program_id,
            confirm_timeout,
        }
    }
}

/// Submits transfers through a `LedgerRpc`
pub struct TransferSubmitter {
    rpc: Arc<dyn LedgerRpc>,
    config: SubmitterConfig,
    metrics: Arc<Metrics>,
}

impl TransferSubmitter {
    pub fn new(rpc: Arc<dyn LedgerRpc>, config: SubmitterConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            rpc,
            config,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn rpc(&self) -> &Arc<dyn LedgerRpc> {
        &self.rpc
    }

    /// Encode, build, sign, submit and await one transfer
    pub async fn submit(&self, request: TransferRequest) -> ConfirmationResult {
        self.submit_traced(request, &TraceContext::new("transfer"))
            .await
    }

    /// Submit an already-signed transaction exactly once and await it
    ///
    /// Resubmitting a transaction that already landed yields
    /// `ConfirmationError::AlreadyProcessed` from the network.
    pub async fn submit_transaction(&self, tx: &Transaction) -> ConfirmationResult {
        let ctx = TraceContext::new("submit_transaction");
        let logger = TransferLogger::new(&ctx);
        let timer = Timer::new();
        self.metrics.transfers_submitted.inc();

        let outcome = match describe_transfer(tx, &self.config.program_id) {
            Ok((sender, recipient, amount)) => {
                logger.log_attempt(&sender, &recipient, amount);
                self.send_and_confirm(tx, &logger)
                    .await
                    .map(|signature| self.receipt(&ctx, signature, sender, recipient, amount, &timer))
            }
            Err(e) => Err(e),
        };

        self.finish(outcome, &logger, &timer)
    }

    /// Submit `requests` strictly in order, stopping at the first failure
    ///
    /// Each transfer is awaited to confirmation before the next one is built,
    /// so every transfer observes the balances its predecessors left behind.
    pub async fn submit_sequence(
        &self,
        requests: Vec<TransferRequest>,
    ) -> Result<Vec<TransferReceipt>, SequenceError> {
        let total = requests.len();
        let root = TraceContext::new("transfer_sequence");
        let mut completed = Vec::with_capacity(total);

        info!(trace_id = %root.trace_id, total = total, "Starting transfer sequence");

        for (index, request) in requests.into_iter().enumerate() {
            let ctx = root.child_step("transfer", index, total);
            if let Some(label) = &request.label {
                info!(step = %ctx.step_label(), route = %label, "Transfer");
            }

            match self.submit_traced(request, &ctx).await {
                Ok(receipt) => completed.push(receipt),
                Err(source) => {
                    return Err(SequenceError {
                        index,
                        total,
                        completed,
                        source,
                    });
                }
            }
        }

        info!(trace_id = %root.trace_id, completed = completed.len(), "Transfer sequence complete");
        Ok(completed)
    }

    async fn submit_traced(&self, request: TransferRequest, ctx: &TraceContext) -> ConfirmationResult {
        let logger = TransferLogger::new(ctx);
        let timer = Timer::new();
        let sender = request.sender_pubkey();
        self.metrics.transfers_submitted.inc();
        logger.log_attempt(&sender, &request.recipient, request.amount);

        let outcome = async {
            let recent_blockhash = self.rpc.latest_blockhash().await?;

            let build_timer = Timer::new();
            let signed = build_signed_transfer(
                &self.config.program_id,
                &request.sender,
                &request.recipient,
                request.amount,
                recent_blockhash,
            )?;
            build_timer.observe_duration(&self.metrics.build_latency);
            debug!(
                correlation_id = %ctx.correlation_id,
                signature = %signed.signature(),
                blockhash = %recent_blockhash,
                "Transfer signed"
            );

            let signature = self.send_and_confirm(&signed.tx, &logger).await?;
            Ok::<TransferReceipt, TransferError>(self.receipt(
                ctx,
                signature,
                sender,
                request.recipient,
                request.amount,
                &timer,
            ))
        }
        .await;

        self.finish(outcome, &logger, &timer)
    }

    /// Send once, then await confirmation, all under the configured timeout
    async fn send_and_confirm(
        &self,
        tx: &Transaction,
        logger: &TransferLogger,
    ) -> Result<Signature, TransferError> {
        let recent_blockhash = tx.message.recent_blockhash;
        let rpc = &self.rpc;

        let round_trip = async {
            let signature = rpc.send_transaction(tx).await?;
            logger.log_sent(&signature, rpc.endpoint());
            rpc.confirm_transaction(&signature, &recent_blockhash).await?;
            Ok::<Signature, TransferError>(signature)
        };

        match tokio::time::timeout(self.config.confirm_timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::timeout(
                u64::try_from(self.config.confirm_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    fn receipt(
        &self,
        ctx: &TraceContext,
        signature: Signature,
        sender: Pubkey,
        recipient: Pubkey,
        amount: u64,
        timer: &Timer,
    ) -> TransferReceipt {
        TransferReceipt {
            signature,
            sender,
            recipient,
            amount,
            commitment: self.rpc.commitment().commitment,
            correlation_id: ctx.correlation_id.clone(),
            latency_ms: timer.elapsed_ms(),
        }
    }

    fn finish(&self, outcome: ConfirmationResult, logger: &TransferLogger, timer: &Timer) -> ConfirmationResult {
        match &outcome {
            Ok(receipt) => {
                self.metrics.transfers_confirmed.inc();
                timer.observe_duration(&self.metrics.confirmation_latency);
                logger.log_confirmed(&receipt.signature, receipt.latency_ms);
            }
            Err(err) => {
                self.metrics.record_failure(err.category());
                logger.log_failure(err, timer.elapsed_ms());
            }
        }
        outcome
    }
}

/// Recover sender, recipient and amount from a signed transfer transaction
fn describe_transfer(tx: &Transaction, program_id: &Pubkey) -> Result<(Pubkey, Pubkey, u64), TransferError> {
    let malformed = |reason: &str| -> TransferError {
        SubmissionError::MalformedTransaction(reason.to_string()).into()
    };

    let message = &tx.message;
    let ix = message
        .instructions
        .first()
        .ok_or_else(|| malformed("transaction has no instructions"))?;

    let key_at = |index: u8| message.account_keys.get(usize::from(index)).copied();

    if key_at(ix.program_id_index) != Some(*program_id) {
        return Err(malformed("instruction is not addressed to the transfer program"));
    }
    if ix.accounts.len() != TRANSFER_ACCOUNT_COUNT {
        return Err(malformed("transfer instruction must reference exactly 3 accounts"));
    }

    let sender = key_at(ix.accounts[0]).ok_or_else(|| malformed("sender index out of range"))?;
    let recipient = key_at(ix.accounts[1]).ok_or_else(|| malformed("recipient index out of range"))?;
    let amount = InstructionPayload::decode(&ix.data)?;

    Ok((sender, recipient, amount))
}
