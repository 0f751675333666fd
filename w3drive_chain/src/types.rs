use alloy_primitives::{B256, U64, U256};
use serde::Deserialize;

/// Terminal outcome of a broadcast transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainReceipt {
    pub transaction_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
}

impl ChainReceipt {
    /// True once the transaction is included in a block.
    pub fn is_mined(&self) -> bool {
        self.block_number.is_some()
    }
}

/// Receipt as returned by `eth_getTransactionReceipt`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub block_number: Option<U64>,
}

impl From<RpcReceipt> for ChainReceipt {
    fn from(r: RpcReceipt) -> Self {
        ChainReceipt {
            transaction_hash: r.transaction_hash,
            success: r.status.is_some_and(|s| s == U64::from(1)),
            block_number: r.block_number.map(|n| n.to::<u64>()),
        }
    }
}

/// Suggested EIP-1559 fee fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSuggestion {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}
