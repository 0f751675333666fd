//! Session key material derived from a [`DriveKey`].

use alloy_primitives::Address;
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use w3drive_chain::LocalWallet;

use crate::crypto::DriveKey;
use crate::error::SessionError;

/// The session's signing wallet. The drive key bytes are used directly as
/// the secp256k1 private key, so the same key always yields the same address.
pub fn session_wallet(key: &DriveKey) -> Result<LocalWallet, SessionError> {
    Ok(LocalWallet::from_bytes(key.as_bytes())?)
}

/// Canonical identifier of an address: base64 of its checksummed text form.
/// Encrypted into the on-chain session record and used as the sign-in nonce.
pub fn drive_id(address: &Address) -> String {
    STANDARD_NO_PAD.encode(address.to_checksum(None))
}
