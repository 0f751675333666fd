use alloy_primitives::{B256, U256};
use thiserror::Error;
use w3drive_chain::ChainError;
use w3drive_core::CodecError;
use w3drive_session::SessionError;

/// Why an upload stopped. Exactly one kind is reported per failed upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] CodecError),
    #[error("session key unavailable: {0}")]
    Authentication(#[source] SessionError),
    #[error("could not clear stale chunks of {name}: {reason}")]
    StaleFileCheckFailed { name: String, reason: String },
    #[error("insufficient balance: need {required} wei, have {available} wei")]
    InsufficientBalance { required: U256, available: U256 },
    #[error("proof service failed: {0}")]
    ProofService(#[source] ChainError),
    #[error("write of chunks starting at {first_chunk} failed in transaction {transaction}")]
    WriteFailed { first_chunk: u64, transaction: B256 },
    #[error("transaction failed: {0}")]
    Transaction(#[source] ChainError),
    #[error("network error: {0}")]
    Network(#[source] ChainError),
    #[error("upload cancelled before chunk {next_chunk}")]
    Cancelled { next_chunk: u64 },
}

impl UploadError {
    /// Classifies a fault raised while reading chain state.
    pub(crate) fn read(err: ChainError) -> Self {
        UploadError::Network(err)
    }

    /// Classifies a fault raised while building, signing or sending a batch.
    pub(crate) fn submit(err: ChainError) -> Self {
        match err {
            e if e.is_network() => UploadError::Network(e),
            e @ ChainError::ProofService(_) => UploadError::ProofService(e),
            e => UploadError::Transaction(e),
        }
    }
}
