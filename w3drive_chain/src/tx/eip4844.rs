use alloy_primitives::{B256, FixedBytes, U256};
use alloy_rlp::{BufMut, Encodable, Header};
use w3drive_core::Blob;

use super::{BLOB_TX_TYPE, TxCommon, encode_list_payload, encode_signature, hash_of, typed_envelope};
use crate::error::ChainResult;
use crate::wallet::{LocalWallet, TxSignature};

/// Blob payloads with their KZG commitments and proofs.
///
/// The sidecar travels with the transaction on the network but is not part
/// of the canonical transaction or its hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobSidecar {
    pub blobs: Vec<Blob>,
    pub commitments: Vec<FixedBytes<48>>,
    pub proofs: Vec<FixedBytes<48>>,
}

impl BlobSidecar {
    fn encode(&self, out: &mut dyn BufMut) {
        let blob_payload_len: usize = self
            .blobs
            .iter()
            .map(|b| b.as_ref().length())
            .sum();
        Header {
            list: true,
            payload_length: blob_payload_len,
        }
        .encode(out);
        for blob in &self.blobs {
            let bytes: &[u8] = blob.as_ref();
            bytes.encode(out);
        }
        self.commitments.encode(out);
        self.proofs.encode(out);
    }
}

/// Unsigned EIP-4844 transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedBlobTx {
    pub common: TxCommon,
    pub max_fee_per_blob_gas: U256,
    pub blob_versioned_hashes: Vec<B256>,
    pub sidecar: BlobSidecar,
}

impl UnsignedBlobTx {
    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.common.encode_fields(out);
        self.max_fee_per_blob_gas.encode(out);
        self.blob_versioned_hashes.encode(out);
    }

    pub fn signing_hash(&self) -> B256 {
        hash_of(&typed_envelope(BLOB_TX_TYPE, |out| self.encode_fields(out)))
    }

    pub fn sign(self, wallet: &LocalWallet) -> ChainResult<SignedBlobTx> {
        let signature = wallet.sign_hash(self.signing_hash())?;
        Ok(SignedBlobTx {
            tx: self,
            signature,
        })
    }
}

/// Signed EIP-4844 transaction. Immutable once signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedBlobTx {
    tx: UnsignedBlobTx,
    signature: TxSignature,
}

impl SignedBlobTx {
    pub fn tx(&self) -> &UnsignedBlobTx {
        &self.tx
    }

    pub fn signature(&self) -> &TxSignature {
        &self.signature
    }

    fn encode_signed_fields(&self, out: &mut dyn BufMut) {
        self.tx.encode_fields(out);
        encode_signature(&self.signature, out);
    }

    /// Canonical encoding `0x03 || rlp([fields, y_parity, r, s])`, without blobs.
    pub fn encoded(&self) -> Vec<u8> {
        typed_envelope(BLOB_TX_TYPE, |out| self.encode_signed_fields(out))
    }

    /// Transaction hash, computed over the canonical encoding.
    pub fn hash(&self) -> B256 {
        hash_of(&self.encoded())
    }

    /// Network form `0x03 || rlp([[fields, y_parity, r, s], blobs, commitments, proofs])`
    /// submitted with `eth_sendRawTransaction`.
    pub fn network_encoded(&self) -> Vec<u8> {
        typed_envelope(BLOB_TX_TYPE, |out| {
            let mut inner = Vec::new();
            self.encode_signed_fields(&mut inner);
            encode_list_payload(&inner, out);
            self.tx.sidecar.encode(out);
        })
    }
}
