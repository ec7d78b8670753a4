//! Transfer transaction assembly and signing
//!
//! One instruction, one signer: the sender pays the fee and is the only
//! required signature. The output keeps the blockhash the transaction was
//! signed against so confirmation can tell expiry apart from "still pending".

use crate::tx_builder::errors::TransferError;
use crate::tx_builder::instructions::{build_transfer_instruction, sanity_check_account_order};
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};

/// Signed transfer transaction ready for broadcast
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    /// The signed transaction
    pub tx: Transaction,

    /// Blockhash the transaction was signed against
    pub recent_blockhash: Hash,
}

impl SignedTransfer {
    /// Fee payer signature, which is also the transaction id
    pub fn signature(&self) -> Signature {
        self.tx.signatures.first().copied().unwrap_or_default()
    }
}

/// Build and sign a transfer transaction addressed to `program_id`
///
/// # Errors
///
/// - `Submission(MalformedTransaction)` if the account layout check fails (debug builds)
/// - `Submission(Signing)` if the sender cannot sign the message
pub fn build_signed_transfer(
    program_id: &Pubkey,
    sender: &Keypair,
    recipient: &Pubkey,
    amount: u64,
    recent_blockhash: Hash,
) -> Result<SignedTransfer, TransferError> {
    let sender_pubkey = sender.pubkey();
    let ix = build_transfer_instruction(program_id, &sender_pubkey, recipient, amount);
    sanity_check_account_order(&ix)?;

    let mut tx = Transaction::new_with_payer(&[ix], Some(&sender_pubkey));
    tx.try_sign(&[sender], recent_blockhash)
        .map_err(|e| TransferError::signing(e.to_string()))?;

    Ok(SignedTransfer {
        tx,
        recent_blockhash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx_builder::instructions::{encode_amount, InstructionPayload};
    use solana_system_interface::program as system_program;

    #[test]
    fn test_build_signed_transfer_has_single_signer() {
        let sender = Keypair::new();
        let recipient = Pubkey::new_unique();
        let program_id = Pubkey::new_unique();
        let blockhash = Hash::new_unique();

        let signed = build_signed_transfer(&program_id, &sender, &recipient, 4_000_000, blockhash)
            .expect("Should build transfer");

        let message = &signed.tx.message;
        assert_eq!(message.header.num_required_signatures, 1);
        assert_eq!(message.account_keys[0], sender.pubkey());
        assert_eq!(message.recent_blockhash, blockhash);
        assert_eq!(signed.recent_blockhash, blockhash);
        assert_eq!(signed.tx.signatures.len(), 1);
        assert_ne!(signed.signature(), Signature::default());
        assert!(signed.tx.verify().is_ok());
    }

    #[test]
    fn test_build_signed_transfer_compiles_program_instruction() {
        let sender = Keypair::new();
        let recipient = Pubkey::new_unique();
        let program_id = Pubkey::new_unique();

        let signed =
            build_signed_transfer(&program_id, &sender, &recipient, 2_000_000, Hash::new_unique())
                .expect("Should build transfer");

        let message = &signed.tx.message;
        assert_eq!(message.instructions.len(), 1);

        let compiled = &message.instructions[0];
        let keys = &message.account_keys;
        assert_eq!(keys[usize::from(compiled.program_id_index)], program_id);
        assert_eq!(compiled.data, encode_amount(2_000_000).as_bytes().to_vec());
        assert_eq!(InstructionPayload::decode(&compiled.data), Ok(2_000_000));

        let slots: Vec<Pubkey> = compiled
            .accounts
            .iter()
            .map(|idx| keys[usize::from(*idx)])
            .collect();
        assert_eq!(slots, vec![sender.pubkey(), recipient, system_program::id()]);

        // program id and system program are the two read-only unsigned keys
        let readonly_unsigned = usize::from(message.header.num_readonly_unsigned_accounts);
        assert_eq!(readonly_unsigned, 2);
        assert!(usize::from(compiled.accounts[1]) < keys.len() - readonly_unsigned);
    }

    #[test]
    fn test_signing_is_deterministic_for_same_inputs() {
        let sender = Keypair::new();
        let recipient = Pubkey::new_unique();
        let program_id = Pubkey::new_unique();
        let blockhash = Hash::new_unique();

        let first = build_signed_transfer(&program_id, &sender, &recipient, 1, blockhash)
            .expect("Should build transfer");
        let second = build_signed_transfer(&program_id, &sender, &recipient, 1, blockhash)
            .expect("Should build transfer");

        assert_eq!(first.signature(), second.signature());
    }
}
