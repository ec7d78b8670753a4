//! Transfer instruction builder
//!
//! Turns a lamport amount into the program's instruction and wraps it into a
//! signed transaction.
//!
//! ## Architecture
//!
//! - **errors**: Error taxonomy for encoding, submission and confirmation
//! - **instructions**: 8-byte amount encoding and the fixed 3-slot account layout
//! - **builder**: Transaction assembly and signing
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use lamport_transfer::tx_builder::{build_signed_transfer, TransferError};
//! use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Keypair};
//!
//! # fn example(program_id: Pubkey, blockhash: Hash) -> Result<(), TransferError> {
//! let sender = Keypair::new();
//! let recipient = Pubkey::new_unique();
//!
//! let signed = build_signed_transfer(&program_id, &sender, &recipient, 5_000_000, blockhash)?;
//! // signed.tx is ready to broadcast
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub use errors::{
    ConfirmationError, EncodingError, SequenceError, SubmissionError, TransferError,
};

pub mod builder;
pub mod instructions;

pub use builder::{build_signed_transfer, SignedTransfer};
pub use instructions::{
    build_transfer_instruction, encode_amount, lamports_from_i64, parse_lamports,
    sanity_check_account_order, transfer_accounts, InstructionPayload, PAYLOAD_LEN,
    TRANSFER_ACCOUNT_COUNT,
};
