//! Assembles unsigned transaction envelopes, filling in whatever the caller
//! left open from the node.

use alloy_primitives::{Address, B256, Bytes, U256};
use tokio::sync::OnceCell;

use crate::error::{ChainError, ChainResult};
use crate::node::NodeClient;
use crate::tx::{BlobSidecar, TxCommon, UnsignedBlobTx, UnsignedEip1559Tx};

/// 30 gwei.
pub const DEFAULT_MAX_FEE_PER_BLOB_GAS: u64 = 30_000_000_000;

/// Transaction fields chosen by the caller. `None` fields are resolved from
/// the node: chain id via `eth_chainId`, nonce via the pending transaction
/// count, gas via `eth_estimateGas` and fees via the node's fee suggestion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub chain_id: Option<u64>,
    pub nonce: Option<u64>,
    pub gas_limit: Option<u64>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub max_fee_per_blob_gas: Option<U256>,
}

impl TxRequest {
    pub fn call(to: Address, data: Bytes, value: U256) -> Self {
        Self {
            to,
            data,
            value,
            ..Default::default()
        }
    }
}

pub struct BlobTransactionBuilder {
    node: NodeClient,
    from: Address,
    chain_id: OnceCell<u64>,
}

impl BlobTransactionBuilder {
    pub fn new(node: NodeClient, from: Address) -> Self {
        Self {
            node,
            from,
            chain_id: OnceCell::new(),
        }
    }

    pub fn from_address(&self) -> Address {
        self.from
    }

    pub fn node(&self) -> &NodeClient {
        &self.node
    }

    /// The node's chain id, looked up once and cached.
    pub async fn chain_id(&self) -> ChainResult<u64> {
        self.chain_id
            .get_or_try_init(|| self.node.chain_id())
            .await
            .copied()
    }

    async fn resolve(&self, request: TxRequest) -> ChainResult<(TxCommon, Option<U256>)> {
        let node_chain_id = self.chain_id().await?;
        let chain_id = match request.chain_id {
            None => node_chain_id,
            Some(requested) if requested == node_chain_id => requested,
            Some(requested) => {
                return Err(ChainError::InvalidNetwork {
                    node: node_chain_id,
                    requested,
                });
            }
        };

        let nonce = match request.nonce {
            Some(nonce) => nonce,
            None => self.node.pending_nonce(self.from).await?,
        };

        let gas_limit = match request.gas_limit {
            Some(gas) => gas,
            None => {
                self.node
                    .estimate_gas(self.from, request.to, &request.data, request.value)
                    .await?
            }
        };

        let (max_fee_per_gas, max_priority_fee_per_gas) =
            match (request.max_fee_per_gas, request.max_priority_fee_per_gas) {
                (Some(max_fee), Some(tip)) => (max_fee, tip),
                (max_fee, tip) => {
                    let suggested = self.node.fee_suggestion().await?;
                    (
                        max_fee.unwrap_or(suggested.max_fee_per_gas),
                        tip.unwrap_or(suggested.max_priority_fee_per_gas),
                    )
                }
            };

        tracing::debug!(
            chain_id,
            nonce,
            gas_limit,
            %max_fee_per_gas,
            %max_priority_fee_per_gas,
            "resolved transaction fields"
        );

        let common = TxCommon {
            chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to: request.to,
            value: request.value,
            data: request.data,
        };
        Ok((common, request.max_fee_per_blob_gas))
    }

    /// Builds a blob-carrying transaction for `sidecar`.
    pub async fn build_blob_tx(
        &self,
        request: TxRequest,
        blob_versioned_hashes: Vec<B256>,
        sidecar: BlobSidecar,
    ) -> ChainResult<UnsignedBlobTx> {
        let (common, max_fee_per_blob_gas) = self.resolve(request).await?;
        Ok(UnsignedBlobTx {
            common,
            max_fee_per_blob_gas: max_fee_per_blob_gas
                .unwrap_or(U256::from(DEFAULT_MAX_FEE_PER_BLOB_GAS)),
            blob_versioned_hashes,
            sidecar,
        })
    }

    /// Builds a plain dynamic-fee transaction.
    pub async fn build_call(&self, request: TxRequest) -> ChainResult<UnsignedEip1559Tx> {
        let (common, _) = self.resolve(request).await?;
        Ok(UnsignedEip1559Tx { common })
    }
}
