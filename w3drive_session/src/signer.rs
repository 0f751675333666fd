use alloy_primitives::Address;
use async_trait::async_trait;
use w3drive_chain::LocalWallet;

use crate::error::SessionError;

/// The user's primary wallet, as far as sign-in is concerned.
///
/// Signatures are returned in the wallet's `0x`-hex `r || s || v` text
/// form; that text is the key material the drive key is derived from.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    /// `personal_sign` of `message`. Rejection by the user is an error.
    async fn sign_message(&self, message: &str) -> Result<String, SessionError>;
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn address(&self) -> Address {
        LocalWallet::address(self)
    }

    async fn sign_message(&self, message: &str) -> Result<String, SessionError> {
        let signature = LocalWallet::sign_message(self, message.as_bytes())?;
        Ok(format!("0x{}", hex::encode(signature.to_rsv_bytes())))
    }
}
