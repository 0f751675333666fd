use alloy_primitives::B256;
use thiserror::Error;

pub type ChainResult<T, E = ChainError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChainError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed response to {method}: {reason}")]
    Decode { method: String, reason: String },
    #[error(transparent)]
    Abi(#[from] alloy_sol_types::Error),
    #[error("estimateGas: execution reverted")]
    EstimateReverted,
    #[error("invalid network id: node reports {node}, request expects {requested}")]
    InvalidNetwork { node: u64, requested: u64 },
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("node did not accept the transaction")]
    NotAccepted,
    #[error("proof service failed: {0}")]
    ProofService(String),
    #[error("no receipt for {hash} after {attempts} attempts")]
    ReceiptTimeout { hash: B256, attempts: u32 },
}

impl ChainError {
    /// True for faults of the transport itself rather than of the request.
    pub fn is_network(&self) -> bool {
        matches!(self, ChainError::Http(_) | ChainError::Unavailable(_))
    }

    pub(crate) fn decode(method: &str, reason: impl ToString) -> Self {
        ChainError::Decode {
            method: method.to_owned(),
            reason: reason.to_string(),
        }
    }
}
