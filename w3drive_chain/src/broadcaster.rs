//! Signs envelopes with a local key, submits them and waits for receipts.

use std::time::Duration;

use alloy_primitives::B256;

use crate::error::{ChainError, ChainResult};
use crate::node::NodeClient;
use crate::tx::{UnsignedBlobTx, UnsignedEip1559Tx};
use crate::types::ChainReceipt;
use crate::wallet::LocalWallet;

/// How receipts are polled after broadcasting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// `None` polls until a receipt shows up.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

pub struct TransactionBroadcaster {
    node: NodeClient,
    wallet: LocalWallet,
    poll: PollConfig,
}

impl TransactionBroadcaster {
    pub fn new(node: NodeClient, wallet: LocalWallet, poll: PollConfig) -> Self {
        Self { node, wallet, poll }
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    /// Signs and submits a blob transaction in its network form (with sidecar).
    pub async fn send_blob_tx(&self, tx: UnsignedBlobTx) -> ChainResult<B256> {
        let blobs = tx.sidecar.blobs.len();
        let signed = tx.sign(&self.wallet)?;
        let expected = signed.hash();
        let hash = self
            .node
            .send_raw_transaction(&signed.network_encoded())
            .await?;
        if hash != expected {
            tracing::warn!(%hash, %expected, "node reported an unexpected transaction hash");
        }
        tracing::info!(%hash, blobs, "blob transaction sent");
        Ok(hash)
    }

    pub async fn send_eip1559_tx(&self, tx: UnsignedEip1559Tx) -> ChainResult<B256> {
        let signed = tx.sign(&self.wallet)?;
        let hash = self.node.send_raw_transaction(&signed.encoded()).await?;
        tracing::info!(%hash, "transaction sent");
        Ok(hash)
    }

    /// Polls `eth_getTransactionReceipt` until the transaction is mined.
    ///
    /// Transport errors while polling count as an attempt and are retried.
    pub async fn wait_for_receipt(&self, hash: B256) -> ChainResult<ChainReceipt> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            match self.node.transaction_receipt(hash).await {
                Ok(Some(receipt)) if receipt.is_mined() => {
                    tracing::debug!(%hash, attempts, success = receipt.success, "receipt received");
                    return Ok(receipt);
                }
                Ok(_) => tracing::trace!(%hash, attempts, "transaction not mined yet"),
                Err(e) if e.is_network() => {
                    tracing::warn!(%hash, attempts, "receipt poll failed: {e}")
                }
                Err(e) => return Err(e),
            }

            if self.poll.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(ChainError::ReceiptTimeout { hash, attempts });
            }
            tokio::time::sleep(self.poll.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ScriptedTransport, receipt_json};
    use crate::tx::{BlobSidecar, TxCommon};
    use alloy_primitives::{Address, Bytes, FixedBytes, U256};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use w3drive_core::Blob;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn broadcaster(max_attempts: Option<u32>) -> (Arc<ScriptedTransport>, TransactionBroadcaster) {
        let transport = Arc::new(ScriptedTransport::new());
        let node = NodeClient::new(transport.clone());
        let wallet = LocalWallet::from_hex(DEV_KEY).unwrap();
        let poll = PollConfig {
            interval: Duration::ZERO,
            max_attempts,
        };
        (transport, TransactionBroadcaster::new(node, wallet, poll))
    }

    fn blob_tx() -> UnsignedBlobTx {
        UnsignedBlobTx {
            common: TxCommon {
                chain_id: 3333,
                nonce: 0,
                max_priority_fee_per_gas: U256::from(1),
                max_fee_per_gas: U256::from(2),
                gas_limit: 100_000,
                to: Address::repeat_byte(0xcc),
                value: U256::ZERO,
                data: Bytes::new(),
            },
            max_fee_per_blob_gas: U256::from(3),
            blob_versioned_hashes: vec![B256::repeat_byte(1)],
            sidecar: BlobSidecar {
                blobs: vec![Blob::zeroed()],
                commitments: vec![FixedBytes::ZERO],
                proofs: vec![FixedBytes::ZERO],
            },
        }
    }

    #[tokio::test]
    async fn test_polls_until_mined() {
        let (transport, broadcaster) = broadcaster(None);
        let hash = B256::repeat_byte(7);
        transport
            .push("eth_getTransactionReceipt", Value::Null)
            .push("eth_getTransactionReceipt", Value::Null)
            .push("eth_getTransactionReceipt", receipt_json(hash, true));

        let receipt = broadcaster.wait_for_receipt(hash).await.unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.transaction_hash, hash);
        assert_eq!(transport.call_count("eth_getTransactionReceipt"), 3);
    }

    #[tokio::test]
    async fn test_failed_status_is_returned() {
        let (transport, broadcaster) = broadcaster(None);
        let hash = B256::repeat_byte(7);
        transport.push("eth_getTransactionReceipt", receipt_json(hash, false));
        let receipt = broadcaster.wait_for_receipt(hash).await.unwrap();
        assert!(!receipt.success);
    }

    #[tokio::test]
    async fn test_network_errors_are_retried() {
        let (transport, broadcaster) = broadcaster(None);
        let hash = B256::repeat_byte(7);
        transport
            .push_unavailable("eth_getTransactionReceipt")
            .push("eth_getTransactionReceipt", receipt_json(hash, true));
        assert!(broadcaster.wait_for_receipt(hash).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_rpc_errors_abort_polling() {
        let (transport, broadcaster) = broadcaster(None);
        transport.push_rpc_error("eth_getTransactionReceipt", -32000, "boom");
        let err = broadcaster
            .wait_for_receipt(B256::repeat_byte(7))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Rpc { code: -32000, .. }));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (transport, broadcaster) = broadcaster(Some(3));
        transport.set("eth_getTransactionReceipt", Value::Null);
        let err = broadcaster
            .wait_for_receipt(B256::repeat_byte(7))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::ReceiptTimeout { attempts: 3, .. }));
        assert_eq!(transport.call_count("eth_getTransactionReceipt"), 3);
    }

    #[tokio::test]
    async fn test_sends_network_form() {
        let (transport, broadcaster) = broadcaster(None);
        let expected = blob_tx().sign(broadcaster.wallet()).unwrap();
        transport.push("eth_sendRawTransaction", json!(expected.hash()));

        let hash = broadcaster.send_blob_tx(blob_tx()).await.unwrap();
        assert_eq!(hash, expected.hash());
        assert_eq!(
            transport.last_raw_transaction().unwrap(),
            expected.network_encoded()
        );
    }

    #[tokio::test]
    async fn test_rejected_send() {
        let (transport, broadcaster) = broadcaster(None);
        transport.push("eth_sendRawTransaction", Value::Null);
        let err = broadcaster.send_blob_tx(blob_tx()).await.unwrap_err();
        assert!(matches!(err, ChainError::NotAccepted));
    }
}
