//! Typed transaction envelopes, built and signed locally.
//!
//! Both envelopes follow the same shape: the signing hash is
//! `keccak256(type || rlp(fields))` and the signed form appends
//! `y_parity, r, s` to the field list.

mod eip1559;
mod eip4844;

pub use eip1559::{SignedEip1559Tx, UnsignedEip1559Tx};
pub use eip4844::{BlobSidecar, SignedBlobTx, UnsignedBlobTx};

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_rlp::{BufMut, Encodable, Header};

use crate::wallet::TxSignature;

pub const EIP1559_TX_TYPE: u8 = 0x02;
pub const BLOB_TX_TYPE: u8 = 0x03;

/// Fields shared by both envelopes, in wire order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxCommon {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl TxCommon {
    /// Encodes the fields up to and including the (always empty) access list.
    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.chain_id.encode(out);
        self.nonce.encode(out);
        self.max_priority_fee_per_gas.encode(out);
        self.max_fee_per_gas.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
        out.put_u8(alloy_rlp::EMPTY_LIST_CODE);
    }
}

fn encode_signature(sig: &TxSignature, out: &mut dyn BufMut) {
    sig.y_parity.encode(out);
    sig.r.encode(out);
    sig.s.encode(out);
}

/// Wraps an already-encoded payload in an RLP list header.
fn encode_list_payload(payload: &[u8], out: &mut dyn BufMut) {
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(out);
    out.put_slice(payload);
}

/// `type || rlp([fields])`, given a closure writing the list payload.
fn typed_envelope(tx_type: u8, write_fields: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
    let mut payload = Vec::new();
    write_fields(&mut payload);
    let mut out = Vec::with_capacity(payload.len() + 6);
    out.put_u8(tx_type);
    encode_list_payload(&payload, &mut out);
    out
}

fn hash_of(encoded: &[u8]) -> B256 {
    keccak256(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::{LocalWallet, address_of};
    use alloy_primitives::FixedBytes;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
    use w3drive_core::Blob;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn common() -> TxCommon {
        TxCommon {
            chain_id: 3333,
            nonce: 7,
            max_priority_fee_per_gas: U256::from(1_000_000_000u64),
            max_fee_per_gas: U256::from(3_000_000_000u64),
            gas_limit: 210_000,
            to: Address::repeat_byte(0xcc),
            value: U256::ZERO,
            data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
        }
    }

    fn blob_tx() -> UnsignedBlobTx {
        UnsignedBlobTx {
            common: common(),
            max_fee_per_blob_gas: U256::from(30_000_000_000u64),
            blob_versioned_hashes: vec![B256::repeat_byte(0x01)],
            sidecar: BlobSidecar {
                blobs: vec![Blob::zeroed()],
                commitments: vec![FixedBytes::<48>::repeat_byte(0x02)],
                proofs: vec![FixedBytes::<48>::repeat_byte(0x03)],
            },
        }
    }

    fn recover(hash: B256, sig: &TxSignature) -> Address {
        let rsv = sig.to_rsv_bytes();
        let signature = Signature::from_slice(&rsv[..64]).unwrap();
        let recid = RecoveryId::from_byte(rsv[64] - 27).unwrap();
        address_of(&VerifyingKey::recover_from_prehash(hash.as_slice(), &signature, recid).unwrap())
    }

    #[test]
    fn test_eip1559_envelope() {
        let wallet = LocalWallet::from_hex(DEV_KEY).unwrap();
        let unsigned = UnsignedEip1559Tx { common: common() };
        let signing_hash = unsigned.signing_hash();
        let signed = unsigned.sign(&wallet).unwrap();

        let encoded = signed.encoded();
        assert_eq!(encoded[0], EIP1559_TX_TYPE);
        let header = Header::decode(&mut &encoded[1..]).unwrap();
        assert!(header.list);
        assert_eq!(header.payload_length + header.length() + 1, encoded.len());

        assert_eq!(signed.hash(), keccak256(&encoded));
        assert_eq!(recover(signing_hash, signed.signature()), wallet.address());
    }

    #[test]
    fn test_blob_tx_hash_excludes_sidecar() {
        let wallet = LocalWallet::from_hex(DEV_KEY).unwrap();
        let signed = blob_tx().sign(&wallet).unwrap();

        let canonical = signed.encoded();
        let network = signed.network_encoded();
        assert_eq!(canonical[0], BLOB_TX_TYPE);
        assert_eq!(network[0], BLOB_TX_TYPE);
        assert!(network.len() > canonical.len() + w3drive_core::BLOB_SIZE);
        assert_eq!(signed.hash(), keccak256(&canonical));

        // The network wrapper's first element is the canonical field list.
        let mut body = &network[1..];
        let outer = Header::decode(&mut body).unwrap();
        assert!(outer.list);
        let inner_start = body;
        let inner = Header::decode(&mut body).unwrap();
        let inner_len = inner.length() + inner.payload_length;
        assert_eq!(&inner_start[..inner_len], &canonical[1..]);
    }

    #[test]
    fn test_blob_tx_signature_recovers() {
        let wallet = LocalWallet::from_hex(DEV_KEY).unwrap();
        let unsigned = blob_tx();
        let signing_hash = unsigned.signing_hash();
        let signed = unsigned.sign(&wallet).unwrap();
        assert_eq!(recover(signing_hash, signed.signature()), wallet.address());
    }

    #[test]
    fn test_signing_hash_covers_blob_fields() {
        let a = blob_tx();
        let mut b = blob_tx();
        b.blob_versioned_hashes[0] = B256::repeat_byte(0x09);
        assert_ne!(a.signing_hash(), b.signing_hash());

        // Commitments and proofs are not signed over.
        let mut c = blob_tx();
        c.sidecar.proofs[0] = FixedBytes::<48>::repeat_byte(0x07);
        assert_eq!(a.signing_hash(), c.signing_hash());
    }
}
