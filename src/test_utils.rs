//! Test Utilities Module
//!
//! In-memory ledger that emulates the transfer program behind the `LedgerRpc`
//! trait, so the submitter can be exercised deterministically without a
//! network.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use solana_system_interface::program as system_program;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::rpc_manager::LedgerRpc;
use crate::tx_builder::{InstructionPayload, SubmissionError, TransferError, TRANSFER_ACCOUNT_COUNT};

#[derive(Debug)]
struct LedgerState {
    balances: HashMap<Pubkey, u64>,
    current_blockhash: Hash,
    valid_blockhashes: HashSet<Hash>,
    processed: HashSet<Signature>,
    send_count: usize,
    never_confirm: bool,
}

/// Mock ledger running the transfer program in memory
///
/// Behaves like the on-chain program: debits the sender, credits the
/// recipient, rejects insufficient balances and refuses a signature it has
/// already processed. State changes are applied when `send_transaction`
/// accepts a transaction.
#[derive(Clone)]
pub struct MockLedger {
    program_id: Pubkey,
    state: Arc<Mutex<LedgerState>>,
}

impl MockLedger {
    /// Create an empty ledger with a fresh program id
    pub fn new() -> Self {
        Self::with_program_id(Pubkey::new_unique())
    }

    pub fn with_program_id(program_id: Pubkey) -> Self {
        let current_blockhash = Hash::new_unique();
        Self {
            program_id,
            state: Arc::new(Mutex::new(LedgerState {
                balances: HashMap::new(),
                current_blockhash,
                valid_blockhashes: HashSet::from([current_blockhash]),
                processed: HashSet::new(),
                send_count: 0,
                never_confirm: false,
            })),
        }
    }

    /// Program the ledger executes
    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    /// Credit `lamports` to `pubkey`
    pub async fn fund(&self, pubkey: &Pubkey, lamports: u64) {
        let mut state = self.state.lock().await;
        let balance = state.balances.entry(*pubkey).or_insert(0);
        *balance = balance.saturating_add(lamports);
    }

    /// Current balance, zero for unknown accounts
    pub async fn balance_of(&self, pubkey: &Pubkey) -> u64 {
        self.state
            .lock()
            .await
            .balances
            .get(pubkey)
            .copied()
            .unwrap_or(0)
    }

    /// Number of `send_transaction` calls observed
    pub async fn send_count(&self) -> usize {
        self.state.lock().await.send_count
    }

    /// Accept transactions but never report them as confirmed
    pub async fn set_never_confirm(&self, never_confirm: bool) {
        self.state.lock().await.never_confirm = never_confirm;
    }

    /// Invalidate every blockhash handed out so far
    pub async fn expire_blockhashes(&self) {
        let mut state = self.state.lock().await;
        let fresh = Hash::new_unique();
        state.valid_blockhashes.clear();
        state.valid_blockhashes.insert(fresh);
        state.current_blockhash = fresh;
    }

    /// Decode the transfer carried by `tx`: (sender, recipient, amount)
    fn decode_transfer(&self, tx: &Transaction) -> Result<(Pubkey, Pubkey, u64), String> {
        let message = &tx.message;
        let ix = match message.instructions.as_slice() {
            [ix] => ix,
            _ => return Err("expected exactly one instruction".to_string()),
        };

        let key_at = |index: u8| message.account_keys.get(usize::from(index)).copied();

        if key_at(ix.program_id_index) != Some(self.program_id) {
            return Err("invalid program id".to_string());
        }
        if ix.accounts.len() != TRANSFER_ACCOUNT_COUNT {
            return Err("not enough account keys".to_string());
        }

        let sender = key_at(ix.accounts[0]).ok_or("sender index out of range")?;
        let recipient = key_at(ix.accounts[1]).ok_or("recipient index out of range")?;
        if key_at(ix.accounts[2]) != Some(system_program::id()) {
            return Err("incorrect system program id".to_string());
        }
        if !message.is_signer(usize::from(ix.accounts[0])) {
            return Err("missing required signature".to_string());
        }

        let amount = InstructionPayload::decode(&ix.data).map_err(|e| e.to_string())?;
        Ok((sender, recipient, amount))
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    fn endpoint(&self) -> &str {
        "mock://ledger"
    }

    fn commitment(&self) -> CommitmentConfig {
        CommitmentConfig::confirmed()
    }

    async fn latest_blockhash(&self) -> Result<Hash, TransferError> {
        Ok(self.state.lock().await.current_blockhash)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, TransferError> {
        let mut state = self.state.lock().await;
        state.send_count += 1;

        if tx.verify().is_err() {
            return Err(SubmissionError::MalformedTransaction(
                "signature verification failed".to_string(),
            )
            .into());
        }

        let signature = tx.signatures[0];
        if state.processed.contains(&signature) {
            return Err(TransferError::already_processed(&signature));
        }
        if !state.valid_blockhashes.contains(&tx.message.recent_blockhash) {
            return Err(TransferError::expired(&signature));
        }

        let (sender, recipient, amount) = self
            .decode_transfer(tx)
            .map_err(|reason| TransferError::rejected(&signature, reason))?;

        let sender_balance = state.balances.get(&sender).copied().unwrap_or(0);
        if sender_balance < amount {
            return Err(TransferError::rejected(
                &signature,
                format!("insufficient funds: balance {sender_balance}, need {amount}"),
            ));
        }

        state.balances.insert(sender, sender_balance - amount);
        let credited = state.balances.entry(recipient).or_insert(0);
        *credited = credited.saturating_add(amount);

        state.processed.insert(signature);
        let next = Hash::new_unique();
        state.valid_blockhashes.insert(next);
        state.current_blockhash = next;

        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        _recent_blockhash: &Hash,
    ) -> Result<(), TransferError> {
        let (processed, never_confirm) = {
            let state = self.state.lock().await;
            (state.processed.contains(signature), state.never_confirm)
        };

        if never_confirm {
            std::future::pending::<()>().await;
        }

        if processed {
            Ok(())
        } else {
            Err(TransferError::expired(signature))
        }
    }

    async fn balance(&self, pubkey: &Pubkey) -> Result<u64, TransferError> {
        Ok(self.balance_of(pubkey).await)
    }
}
