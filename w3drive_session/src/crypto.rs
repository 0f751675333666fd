//! Session cryptography: drive key derivation and the encrypted session
//! record stored on-chain.
//!
//! The drive key is HKDF-SHA256 over the wallet's sign-in signature (its
//! `0x`-hex text form, as returned by the wallet) with the user's password
//! as `info`. The session record is AES-256-GCM with a random 96-bit nonce
//! and a 128-bit tag appended to the ciphertext.

use std::fmt;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::CryptoError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const CIPHER_NAME: &str = "AES256-GCM";

/// Symmetric key for one session. Its bytes double as the session's
/// secp256k1 private key.
#[derive(Clone, PartialEq, Eq)]
pub struct DriveKey([u8; KEY_LEN]);

impl fmt::Debug for DriveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DriveKey(..)")
    }
}

impl DriveKey {
    /// Derives the key for `(signature, info)`. Deterministic.
    pub fn derive(signature: &str, info: &str) -> Self {
        let hkdf = Hkdf::<Sha256>::new(None, signature.as_bytes());
        let mut key = [0u8; KEY_LEN];
        // expand only fails above 255 * 32 bytes
        if hkdf.expand(info.as_bytes(), &mut key).is_err() {
            unreachable!("HKDF-SHA256 can always expand to 32 bytes");
        }
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// URL-safe base64 without padding, the form the key is stored in.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Parses an encoded key. Both base64 alphabets are accepted, padded or not.
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let encoded = encoded.trim();
        let bytes = [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD_NO_PAD, &STANDARD]
            .into_iter()
            .find_map(|engine| engine.decode(encoded).ok())
            .ok_or(CryptoError::InvalidKey)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self(key))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(&self.0.into())
    }
}

/// A session identifier encrypted under a [`DriveKey`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedSessionRecord {
    pub cipher: &'static str,
    pub iv: [u8; NONCE_LEN],
    /// `ciphertext || tag`
    pub data: Vec<u8>,
}

impl EncryptedSessionRecord {
    /// The nonce as stored on-chain: the UTF-8 bytes of its base64 text.
    pub fn onchain_iv(&self) -> Vec<u8> {
        STANDARD.encode(self.iv).into_bytes()
    }

    /// Parses an on-chain nonce. Raw 12-byte nonces are accepted as well.
    pub fn parse_onchain_iv(raw: &[u8]) -> Result<[u8; NONCE_LEN], CryptoError> {
        if let Ok(iv) = <[u8; NONCE_LEN]>::try_from(raw) {
            return Ok(iv);
        }
        let text = std::str::from_utf8(raw).map_err(|_| CryptoError::InvalidNonce)?;
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|_| CryptoError::InvalidNonce)?;
        bytes.try_into().map_err(|_| CryptoError::InvalidNonce)
    }
}

/// Encrypts `plaintext` under a fresh random nonce.
pub fn encrypt(key: &DriveKey, plaintext: &[u8]) -> Result<EncryptedSessionRecord, CryptoError> {
    let mut iv = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut iv).map_err(|_| CryptoError::RngFailed)?;

    let data = key
        .cipher()
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(EncryptedSessionRecord {
        cipher: CIPHER_NAME,
        iv,
        data,
    })
}

/// Verifies the trailing tag and decrypts. Fails closed with
/// [`CryptoError::Authentication`].
pub fn decrypt(key: &DriveKey, iv: &[u8; NONCE_LEN], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < TAG_LEN {
        return Err(CryptoError::DataTooShort(TAG_LEN));
    }
    key.cipher()
        .decrypt(Nonce::from_slice(iv), data)
        .map_err(|_| CryptoError::Authentication)
}
