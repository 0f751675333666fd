//! Local secp256k1 signer.

use std::fmt;

use alloy_primitives::{Address, B256, U256, eip191_hash_message, keccak256};
use k256::ecdsa::{SigningKey, VerifyingKey};

use crate::error::{ChainError, ChainResult};

/// An ECDSA signature split into the fields typed transactions carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxSignature {
    pub y_parity: bool,
    pub r: U256,
    pub s: U256,
}

impl TxSignature {
    /// 65-byte `r || s || v` form with `v` in {27, 28}, as wallets return it.
    pub fn to_rsv_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        out[32..64].copy_from_slice(&self.s.to_be_bytes::<32>());
        out[64] = 27 + u8::from(self.y_parity);
        out
    }
}

/// A private key held in process memory.
#[derive(Clone)]
pub struct LocalWallet {
    signing_key: SigningKey,
    address: Address,
}

impl fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalWallet {
    /// Builds a wallet from 32 private key bytes.
    pub fn from_bytes(secret: &[u8]) -> ChainResult<Self> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|e| ChainError::Signing(e.to_string()))?;
        let address = address_of(signing_key.verifying_key());
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Parses a hex private key, with or without `0x`.
    pub fn from_hex(secret: &str) -> ChainResult<Self> {
        let secret = secret.trim();
        let secret = secret.strip_prefix("0x").unwrap_or(secret);
        let bytes = hex::decode(secret).map_err(|e| ChainError::Signing(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Signs a 32-byte digest.
    pub fn sign_hash(&self, hash: B256) -> ChainResult<TxSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        let bytes = signature.to_bytes();
        Ok(TxSignature {
            y_parity: recovery_id.is_y_odd(),
            r: U256::from_be_slice(&bytes[..32]),
            s: U256::from_be_slice(&bytes[32..]),
        })
    }

    /// EIP-191 `personal_sign` of a text message.
    pub fn sign_message(&self, message: &[u8]) -> ChainResult<TxSignature> {
        self.sign_hash(eip191_hash_message(message))
    }
}

/// Ethereum address of a public key: last 20 bytes of keccak256 over the
/// uncompressed point without its `0x04` prefix.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
