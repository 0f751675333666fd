//! Typed access to the node's JSON-RPC methods.

use std::sync::Arc;

use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ChainError, ChainResult};
use crate::rpc::RpcTransport;
use crate::types::{ChainReceipt, FeeSuggestion, RpcReceipt};

/// Balance lookups for arbitrary accounts.
#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn balance_of(&self, address: Address) -> ChainResult<U256>;
}

#[derive(Clone)]
pub struct NodeClient {
    transport: Arc<dyn RpcTransport>,
}

impl NodeClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> ChainResult<T> {
        let value = self.transport.request(method, params).await?;
        serde_json::from_value(value).map_err(|e| ChainError::decode(method, e))
    }

    /// Like `request`, but maps `null` and `"0x"` to `None`.
    async fn request_opt<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> ChainResult<Option<T>> {
        let value = self.transport.request(method, params).await?;
        match value {
            Value::Null => Ok(None),
            Value::String(ref s) if s == "0x" => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ChainError::decode(method, e)),
        }
    }

    pub async fn chain_id(&self) -> ChainResult<u64> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to())
    }

    /// Nonce including transactions still in the pool.
    pub async fn pending_nonce(&self, address: Address) -> ChainResult<u64> {
        let nonce: U64 = self
            .request("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        Ok(nonce.to())
    }

    pub async fn balance(&self, address: Address) -> ChainResult<U256> {
        self.request("eth_getBalance", json!([address, "latest"]))
            .await
    }

    /// Suggests fees as `maxFee = 2 * baseFee + tip`.
    pub async fn fee_suggestion(&self) -> ChainResult<FeeSuggestion> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Block {
            base_fee_per_gas: Option<U256>,
        }

        let tip: U256 = self.request("eth_maxPriorityFeePerGas", json!([])).await?;
        let block: Block = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let base_fee = block
            .base_fee_per_gas
            .ok_or_else(|| ChainError::decode("eth_getBlockByNumber", "missing baseFeePerGas"))?;

        Ok(FeeSuggestion {
            max_fee_per_gas: base_fee.saturating_mul(U256::from(2)).saturating_add(tip),
            max_priority_fee_per_gas: tip,
        })
    }

    /// Simulates a call and returns its gas estimate.
    pub async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: &Bytes,
        value: U256,
    ) -> ChainResult<u64> {
        let params = json!([{ "from": from, "to": to, "data": data, "value": value }]);
        match self.request_opt::<U64>("eth_estimateGas", params).await {
            Ok(Some(gas)) => Ok(gas.to()),
            Ok(None) | Err(ChainError::Rpc { .. }) => Err(ChainError::EstimateReverted),
            Err(e) => Err(e),
        }
    }

    /// Read-only contract call against the latest block.
    pub async fn call(&self, from: Option<Address>, to: Address, data: &Bytes) -> ChainResult<Bytes> {
        let mut tx = json!({ "to": to, "data": data });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }
        Ok(self
            .request_opt::<Bytes>("eth_call", json!([tx, "latest"]))
            .await?
            .unwrap_or_default())
    }

    pub async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<B256> {
        let raw = format!("0x{}", hex::encode(raw));
        self.request_opt("eth_sendRawTransaction", json!([raw]))
            .await?
            .ok_or(ChainError::NotAccepted)
    }

    /// Returns the receipt once one exists, `None` while pending.
    pub async fn transaction_receipt(&self, hash: B256) -> ChainResult<Option<ChainReceipt>> {
        let receipt: Option<RpcReceipt> = self
            .request_opt("eth_getTransactionReceipt", json!([hash]))
            .await?;
        Ok(receipt.map(ChainReceipt::from))
    }
}

#[async_trait]
impl BalanceReader for NodeClient {
    async fn balance_of(&self, address: Address) -> ChainResult<U256> {
        self.balance(address).await
    }
}
