//! Delegated session keys for w3drive.
//!
//! A session key lets uploads be signed without the primary wallet. It is
//! derived from the wallet's signature over a fixed sign-in message plus a
//! password, registered on-chain as an encrypted record, and kept in a
//! [`SessionStore`] for the upload layer.
//!
//! ## Key Derivation Chain
//!
//! ```text
//! sign_in_message(domain, account, chain_id)
//!     |  wallet personal_sign
//!     v
//! signature ("0x" hex text)
//!     |  HKDF-SHA256, info = password
//!     v
//! DriveKey [32 bytes]
//!     |
//!     +-- secp256k1 private key -> session address
//!     +-- AES-256-GCM key -> encrypted drive id (on-chain record)
//! ```

pub mod crypto;
mod error;
pub mod keys;
mod manager;
pub mod signer;
pub mod siwe;
mod store;

pub use crypto::{DriveKey, EncryptedSessionRecord};
pub use error::{CryptoError, SessionError};
pub use manager::SessionManager;
pub use signer::WalletSigner;
pub use store::{Session, SessionStore};
