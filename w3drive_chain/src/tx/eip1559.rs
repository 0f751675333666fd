use alloy_primitives::B256;

use super::{EIP1559_TX_TYPE, TxCommon, encode_signature, hash_of, typed_envelope};
use crate::error::ChainResult;
use crate::wallet::{LocalWallet, TxSignature};

/// Dynamic-fee transaction used for plain contract calls and transfers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedEip1559Tx {
    pub common: TxCommon,
}

impl UnsignedEip1559Tx {
    pub fn signing_hash(&self) -> B256 {
        hash_of(&typed_envelope(EIP1559_TX_TYPE, |out| {
            self.common.encode_fields(out)
        }))
    }

    pub fn sign(self, wallet: &LocalWallet) -> ChainResult<SignedEip1559Tx> {
        let signature = wallet.sign_hash(self.signing_hash())?;
        Ok(SignedEip1559Tx {
            tx: self,
            signature,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEip1559Tx {
    tx: UnsignedEip1559Tx,
    signature: TxSignature,
}

impl SignedEip1559Tx {
    pub fn tx(&self) -> &UnsignedEip1559Tx {
        &self.tx
    }

    pub fn signature(&self) -> &TxSignature {
        &self.signature
    }

    /// Raw bytes for `eth_sendRawTransaction`.
    pub fn encoded(&self) -> Vec<u8> {
        typed_envelope(EIP1559_TX_TYPE, |out| {
            self.tx.common.encode_fields(out);
            encode_signature(&self.signature, out);
        })
    }

    pub fn hash(&self) -> B256 {
        hash_of(&self.encoded())
    }
}
