//! Classification of RPC client errors into the transfer error taxonomy
//!
//! The RPC client reports everything through one error type. A transfer has to
//! tell apart "the network never saw it" from "the program said no", so each
//! call site classifies with the function matching the phase it is in.

use solana_rpc_client_api::{
    client_error::{Error as ClientError, ErrorKind as ClientErrorKind},
    request::RpcError,
};
use solana_sdk::{signature::Signature, transaction::TransactionError};

use crate::tx_builder::{ConfirmationError, SubmissionError, TransferError};

/// JSON-RPC error code for a failed preflight simulation
pub const PREFLIGHT_FAILURE_CODE: i64 = -32002;

/// Classify an error returned by `sendTransaction`
///
/// Preflight failures carry the simulated `TransactionError`; those are
/// program rejections, not transport problems.
pub fn classify_send_error(err: ClientError, endpoint: &str, signature: &Signature) -> TransferError {
    if let Some(tx_err) = err.get_transaction_error() {
        return from_transaction_error(signature, tx_err);
    }

    match err.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => SubmissionError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
        .into(),
        ClientErrorKind::SigningError(signer_err) => TransferError::signing(signer_err.to_string()),
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
            classify_response_message(endpoint, message, Some(*code), signature)
        }
        _ => classify_response_message(endpoint, &err.to_string(), None, signature),
    }
}

/// Classify an error returned while fetching a recent blockhash
pub fn classify_blockhash_error(err: ClientError, endpoint: &str) -> TransferError {
    SubmissionError::Blockhash {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    }
    .into()
}

/// Classify an error returned while polling signature status
pub fn classify_poll_error(err: ClientError, endpoint: &str) -> TransferError {
    ConfirmationError::Polling {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    }
    .into()
}

/// Classify an error returned by a read-only query such as `getBalance`
pub fn classify_query_error(err: ClientError, endpoint: &str) -> TransferError {
    match err.kind() {
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
            SubmissionError::RpcResponse {
                endpoint: endpoint.to_string(),
                message: message.clone(),
                code: Some(*code),
            }
            .into()
        }
        _ => SubmissionError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
        .into(),
    }
}

/// Map an on-chain `TransactionError` to a confirmation failure
pub fn from_transaction_error(signature: &Signature, err: TransactionError) -> TransferError {
    match err {
        TransactionError::AlreadyProcessed => TransferError::already_processed(signature),
        TransactionError::BlockhashNotFound => TransferError::expired(signature),
        other => TransferError::rejected(signature, other.to_string()),
    }
}

fn classify_response_message(
    endpoint: &str,
    message: &str,
    code: Option<i64>,
    signature: &Signature,
) -> TransferError {
    let lowered = message.to_lowercase();

    if lowered.contains("already been processed") {
        TransferError::already_processed(signature)
    } else if lowered.contains("blockhash not found") {
        TransferError::expired(signature)
    } else if code == Some(PREFLIGHT_FAILURE_CODE) {
        // Simulation ran and failed, even when the node sent no parseable error data
        TransferError::rejected(signature, message.to_string())
    } else if lowered.contains("failed to deserialize")
        || lowered.contains("invalid transaction")
        || lowered.contains("signature verification")
    {
        SubmissionError::MalformedTransaction(message.to_string()).into()
    } else {
        SubmissionError::RpcResponse {
            endpoint: endpoint.to_string(),
            message: message.to_string(),
            code,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_rpc_client_api::request::RpcResponseErrorData;
    use solana_sdk::instruction::InstructionError;

    const ENDPOINT: &str = "http://127.0.0.1:8899";

    #[test]
    fn test_transaction_error_mapping() {
        let sig = Signature::default();

        assert_eq!(
            from_transaction_error(&sig, TransactionError::AlreadyProcessed).category(),
            "duplicate"
        );
        assert_eq!(
            from_transaction_error(&sig, TransactionError::BlockhashNotFound).category(),
            "expired"
        );

        let err = from_transaction_error(
            &sig,
            TransactionError::InstructionError(0, InstructionError::Custom(1)),
        );
        assert!(err.is_on_chain_rejection());
        assert_eq!(err.category(), "rejected");
    }

    #[test]
    fn test_send_error_with_transaction_error_is_rejection() {
        let sig = Signature::default();
        let client_err = ClientError::from(TransactionError::InstructionError(
            0,
            InstructionError::InsufficientFunds,
        ));

        let err = classify_send_error(client_err, ENDPOINT, &sig);
        assert_eq!(err.category(), "rejected");
    }

    #[test]
    fn test_send_io_error_is_transport() {
        let sig = Signature::default();
        let client_err = ClientError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));

        match classify_send_error(client_err, ENDPOINT, &sig) {
            TransferError::Submission(SubmissionError::Transport { endpoint, .. }) => {
                assert_eq!(endpoint, ENDPOINT);
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_send_custom_messages() {
        let sig = Signature::default();

        let err = classify_send_error(
            ClientError::from(ClientErrorKind::Custom(
                "Transaction has already been processed".to_string(),
            )),
            ENDPOINT,
            &sig,
        );
        assert_eq!(err.category(), "duplicate");

        let err = classify_send_error(
            ClientError::from(ClientErrorKind::Custom(
                "failed to deserialize transaction".to_string(),
            )),
            ENDPOINT,
            &sig,
        );
        assert_eq!(err.category(), "malformed");

        let err = classify_send_error(
            ClientError::from(ClientErrorKind::Custom("node is behind".to_string())),
            ENDPOINT,
            &sig,
        );
        assert_eq!(err.category(), "rpc");
    }

    #[test]
    fn test_preflight_code_without_data_is_rejection() {
        let sig = Signature::default();
        let client_err = ClientError::from(ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code: PREFLIGHT_FAILURE_CODE,
            message: "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1".to_string(),
            data: RpcResponseErrorData::Empty,
        }));

        let err = classify_send_error(client_err, ENDPOINT, &sig);
        assert!(err.is_on_chain_rejection());
        assert_eq!(err.category(), "rejected");
    }

    #[test]
    fn test_other_response_codes_stay_rpc_errors() {
        let sig = Signature::default();
        let client_err = ClientError::from(ClientErrorKind::RpcError(RpcError::RpcResponseError {
            code: -32005,
            message: "Node is unhealthy".to_string(),
            data: RpcResponseErrorData::Empty,
        }));

        match classify_send_error(client_err, ENDPOINT, &sig) {
            TransferError::Submission(SubmissionError::RpcResponse { code, .. }) => {
                assert_eq!(code, Some(-32005));
            }
            other => panic!("expected rpc response error, got {other:?}"),
        }
    }

    #[test]
    fn test_phase_specific_classification() {
        let make = || ClientError::from(ClientErrorKind::Custom("boom".to_string()));

        assert_eq!(classify_blockhash_error(make(), ENDPOINT).category(), "blockhash");
        assert_eq!(classify_poll_error(make(), ENDPOINT).category(), "polling");
        assert_eq!(classify_query_error(make(), ENDPOINT).category(), "transport");
    }
}
