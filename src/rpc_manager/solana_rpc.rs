use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcSendTransactionConfig;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use tracing::{debug, warn};

use super::rpc_config::RpcSettings;
use super::rpc_errors::{
    classify_blockhash_error, classify_poll_error, classify_query_error, classify_send_error,
    from_transaction_error,
};
use super::LedgerRpc;
use crate::tx_builder::TransferError;

/// `LedgerRpc` backed by a JSON-RPC endpoint
pub struct SolanaRpc {
    client: RpcClient,
    settings: RpcSettings,
}

impl SolanaRpc {
    pub fn new(settings: RpcSettings) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            settings.url.clone(),
            settings.request_timeout,
            settings.commitment,
        );
        Self { client, settings }
    }

    fn send_config(&self) -> RpcSendTransactionConfig {
        RpcSendTransactionConfig {
            skip_preflight: self.settings.skip_preflight,
            preflight_commitment: Some(self.settings.commitment.commitment),
            ..RpcSendTransactionConfig::default()
        }
    }

    /// One status lookup
    async fn poll_status(&self, signature: &Signature) -> Result<SignatureProgress, TransferError> {
        let statuses = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| classify_poll_error(e, self.endpoint()))?
            .value;

        let Some(Some(status)) = statuses.into_iter().next() else {
            return Ok(SignatureProgress::Unknown);
        };

        if let Some(err) = status.err {
            warn!(signature = %signature, error = %err, "Transaction failed on chain");
            return Err(from_transaction_error(signature, err));
        }

        if status.satisfies_commitment(self.settings.commitment) {
            Ok(SignatureProgress::Reached)
        } else {
            Ok(SignatureProgress::Pending)
        }
    }
}

/// Where a signature stands relative to the configured commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureProgress {
    /// Not seen by the node
    Unknown,
    /// Landed, below the configured commitment
    Pending,
    /// At or above the configured commitment
    Reached,
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    fn endpoint(&self) -> &str {
        &self.settings.url
    }

    fn commitment(&self) -> CommitmentConfig {
        self.settings.commitment
    }

    async fn latest_blockhash(&self) -> Result<Hash, TransferError> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.settings.commitment)
            .await
            .map_err(|e| classify_blockhash_error(e, self.endpoint()))?;

        debug!(
            blockhash = %blockhash,
            last_valid_block_height = last_valid_block_height,
            "Fetched recent blockhash"
        );
        Ok(blockhash)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, TransferError> {
        let signature = tx.signatures.first().copied().unwrap_or_default();

        self.client
            .send_transaction_with_config(tx, self.send_config())
            .await
            .map_err(|e| classify_send_error(e, self.endpoint(), &signature))
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        recent_blockhash: &Hash,
    ) -> Result<(), TransferError> {
        let mut polls: u32 = 0;
        loop {
            polls += 1;
            match self.poll_status(signature).await? {
                SignatureProgress::Reached => {
                    debug!(signature = %signature, polls = polls, "Signature reached commitment");
                    return Ok(());
                }
                // Landed transactions cannot expire; wait for commitment
                SignatureProgress::Pending => {}
                SignatureProgress::Unknown => {
                    let blockhash_valid = self
                        .client
                        .is_blockhash_valid(recent_blockhash, CommitmentConfig::processed())
                        .await
                        .map_err(|e| classify_poll_error(e, self.endpoint()))?;

                    if !blockhash_valid {
                        // Landed between the two lookups
                        match self.poll_status(signature).await? {
                            SignatureProgress::Reached => return Ok(()),
                            SignatureProgress::Pending => {}
                            SignatureProgress::Unknown => {
                                return Err(TransferError::expired(signature));
                            }
                        }
                    }
                }
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn balance(&self, pubkey: &Pubkey) -> Result<u64, TransferError> {
        self.client
            .get_balance_with_commitment(pubkey, self.settings.commitment)
            .await
            .map(|response| response.value)
            .map_err(|e| classify_query_error(e, self.endpoint()))
    }
}
