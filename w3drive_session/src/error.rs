use thiserror::Error;
use w3drive_chain::ChainError;

/// Errors that can occur during session cryptography.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid drive key encoding")]
    InvalidKey,
    #[error("invalid nonce: expected 12 bytes")]
    InvalidNonce,
    #[error("data too short: expected at least {0} bytes")]
    DataTooShort(usize),
    #[error("encryption failed")]
    EncryptionFailed,
    /// The authentication tag did not verify. No plaintext is released.
    #[error("authentication failed: wrong key or tampered record")]
    Authentication,
    #[error("random number generation failed")]
    RngFailed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("wallet signer failed: {0}")]
    Signer(String),
    #[error("session registration was not confirmed")]
    NotRegistered,
    #[error("stored session does not belong to {0}")]
    AddressMismatch(alloy_primitives::Address),
}
