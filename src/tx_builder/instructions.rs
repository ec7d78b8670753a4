//! Transfer instruction encoding and account layout
//!
//! The on-chain program consumes exactly one instruction shape:
//! - data: the amount as 8 bytes, unsigned 64-bit little-endian, no framing
//! - accounts, in this order:
//!   0. sender (signer, writable)
//!   1. recipient (writable)
//!   2. system program (read-only)
//!
//! For every amount up to `i64::MAX` the unsigned encoding is byte-identical to
//! a signed 64-bit little-endian one, so a program decoding either way agrees.

use crate::tx_builder::errors::{EncodingError, TransferError};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use solana_system_interface::program as system_program;

/// Size of the encoded amount in bytes
pub const PAYLOAD_LEN: usize = 8;

/// Number of account slots the program reads
pub const TRANSFER_ACCOUNT_COUNT: usize = 3;

/// Encoded transfer amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstructionPayload([u8; PAYLOAD_LEN]);

impl InstructionPayload {
    /// Raw payload bytes
    pub fn as_bytes(&self) -> &[u8; PAYLOAD_LEN] {
        &self.0
    }

    /// Decode an amount from instruction data
    ///
    /// # Errors
    ///
    /// Returns `EncodingError::InvalidLength` unless `data` is exactly 8 bytes.
    pub fn decode(data: &[u8]) -> Result<u64, EncodingError> {
        let bytes: [u8; PAYLOAD_LEN] = data
            .try_into()
            .map_err(|_| EncodingError::InvalidLength(data.len()))?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Amount carried by this payload
    pub fn amount(&self) -> u64 {
        u64::from_le_bytes(self.0)
    }
}

impl From<InstructionPayload> for Vec<u8> {
    fn from(payload: InstructionPayload) -> Self {
        payload.0.to_vec()
    }
}

/// Encode a lamport amount into the program's payload layout
pub fn encode_amount(amount: u64) -> InstructionPayload {
    InstructionPayload(amount.to_le_bytes())
}

/// Validate a signed amount (TOML integers are i64) before encoding
pub fn lamports_from_i64(raw: i64) -> Result<u64, EncodingError> {
    u64::try_from(raw).map_err(|_| EncodingError::Negative(i128::from(raw)))
}

/// Parse a textual lamport amount, accepting `_` digit separators
///
/// # Errors
///
/// - `Malformed` for empty or non-numeric text
/// - `Negative` for amounts below zero
/// - `Overflow` for amounts wider than 64 bits
pub fn parse_lamports(text: &str) -> Result<u64, EncodingError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(EncodingError::Malformed(text.to_string()));
    }

    if let Some(digits) = cleaned.strip_prefix('-') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return match cleaned.parse::<i128>() {
                Ok(0) => Ok(0),
                Ok(value) => Err(EncodingError::Negative(value)),
                Err(_) => Err(EncodingError::Overflow(cleaned)),
            };
        }
        return Err(EncodingError::Malformed(text.to_string()));
    }

    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(EncodingError::Malformed(text.to_string()));
    }

    digits
        .parse::<u64>()
        .map_err(|_| EncodingError::Overflow(digits.to_string()))
}

/// Account slots in the order the program reads them
pub fn transfer_accounts(sender: &Pubkey, recipient: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*sender, true),
        AccountMeta::new(*recipient, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ]
}

/// Build the transfer instruction for `program_id`
pub fn build_transfer_instruction(
    program_id: &Pubkey,
    sender: &Pubkey,
    recipient: &Pubkey,
    amount: u64,
) -> Instruction {
    let payload = encode_amount(amount);
    Instruction::new_with_bytes(
        *program_id,
        payload.as_bytes(),
        transfer_accounts(sender, recipient),
    )
}

/// Validate the account layout of a transfer instruction (debug/test only)
///
/// # Errors
///
/// Returns `TransferError::Submission(MalformedTransaction)` when the slot count,
/// order or signer/writable flags differ from the program's expectation, or the
/// payload is not 8 bytes.
#[cfg(debug_assertions)]
pub fn sanity_check_account_order(ix: &Instruction) -> Result<(), TransferError> {
    use crate::tx_builder::errors::SubmissionError;

    let malformed = |reason: String| -> TransferError {
        SubmissionError::MalformedTransaction(reason).into()
    };

    if ix.accounts.len() != TRANSFER_ACCOUNT_COUNT {
        return Err(malformed(format!(
            "Transfer instruction must carry {} accounts, got {}",
            TRANSFER_ACCOUNT_COUNT,
            ix.accounts.len()
        )));
    }

    let sender = &ix.accounts[0];
    if !sender.is_signer || !sender.is_writable {
        return Err(malformed(format!(
            "Slot 0 must be the writable signer, got {} (signer={}, writable={})",
            sender.pubkey, sender.is_signer, sender.is_writable
        )));
    }

    let recipient = &ix.accounts[1];
    if recipient.is_signer || !recipient.is_writable {
        return Err(malformed(format!(
            "Slot 1 must be the writable non-signer recipient, got {} (signer={}, writable={})",
            recipient.pubkey, recipient.is_signer, recipient.is_writable
        )));
    }

    let system = &ix.accounts[2];
    if system.pubkey != system_program::id() || system.is_signer || system.is_writable {
        return Err(malformed(format!(
            "Slot 2 must be the read-only system program, got {}",
            system.pubkey
        )));
    }

    if ix.data.len() != PAYLOAD_LEN {
        return Err(EncodingError::InvalidLength(ix.data.len()).into());
    }

    Ok(())
}

/// No-op version of sanity_check_account_order for release builds
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_account_order(_ix: &Instruction) -> Result<(), TransferError> {
    Ok(())
}
