//! Blob layout used by blob-carrying (type 3) transactions.
//!
//! A blob is 4096 field elements of 32 bytes. The first byte of every field
//! element is always zero so that each element stays below the BLS modulus,
//! leaving 31 payload bytes per element.

mod codec;

pub use codec::{decode_blob_bytes, decode_blobs, encode_blobs};

use crate::Hash;
use std::fmt;

/// Size in bytes of a field element.
pub const BYTES_PER_FIELD_ELEMENT: usize = 32;
/// Payload bytes carried by one field element.
pub const PAYLOAD_BYTES_PER_FIELD_ELEMENT: usize = BYTES_PER_FIELD_ELEMENT - 1;
/// Field elements per blob.
pub const FIELD_ELEMENTS_PER_BLOB: usize = 4096;
/// Size in bytes of an encoded blob (131072).
pub const BLOB_SIZE: usize = BYTES_PER_FIELD_ELEMENT * FIELD_ELEMENTS_PER_BLOB;
/// Usable payload bytes per blob (126976).
pub const BLOB_CAPACITY: usize = PAYLOAD_BYTES_PER_FIELD_ELEMENT * FIELD_ELEMENTS_PER_BLOB;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid blob data: {0}")]
    InvalidInput(&'static str),
    #[error("invalid blob length: expected {BLOB_SIZE} bytes, got {0}")]
    InvalidLength(usize),
}

/// One fixed-size, fully padded blob.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob(Box<[u8; BLOB_SIZE]>);

impl Blob {
    /// A blob of all zero bytes.
    pub fn zeroed() -> Self {
        let boxed: Box<[u8]> = vec![0u8; BLOB_SIZE].into_boxed_slice();
        match boxed.try_into() {
            Ok(arr) => Blob(arr),
            Err(_) => unreachable!("vector has exactly BLOB_SIZE bytes"),
        }
    }

    /// Wraps raw blob bytes, which must be exactly [`BLOB_SIZE`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != BLOB_SIZE {
            return Err(CodecError::InvalidLength(bytes.len()));
        }
        let mut blob = Self::zeroed();
        blob.0.copy_from_slice(bytes);
        Ok(blob)
    }

    pub fn as_bytes(&self) -> &[u8; BLOB_SIZE] {
        &self.0
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8; BLOB_SIZE] {
        &mut self.0
    }

    /// `0x`-prefixed hex, the form the proof service and JSON-RPC expect.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }

    /// Iterates over the 31-byte payload of every field element.
    pub fn payload_chunks(&self) -> impl Iterator<Item = &[u8]> {
        self.0
            .chunks_exact(BYTES_PER_FIELD_ELEMENT)
            .map(|fe| &fe[1..])
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Blob")
            .field(&Hash::new(self.0.as_slice()).fmt_short())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(BLOB_SIZE, 131072);
        assert_eq!(BLOB_CAPACITY, 126976);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert_eq!(
            Blob::from_slice(&[0u8; 10]),
            Err(CodecError::InvalidLength(10))
        );
        assert!(Blob::from_slice(&vec![0u8; BLOB_SIZE]).is_ok());
    }

    #[test]
    fn test_hex_is_prefixed() {
        let hex = Blob::zeroed().to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 2 + 2 * BLOB_SIZE);
    }
}
