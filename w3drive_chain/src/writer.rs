//! Write paths: plain contract calls and blob-carrying submissions.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use w3drive_core::Blob;

use crate::broadcaster::{PollConfig, TransactionBroadcaster};
use crate::builder::{BlobTransactionBuilder, TxRequest};
use crate::error::ChainResult;
use crate::node::NodeClient;
use crate::proof::BlobProofs;
use crate::types::ChainReceipt;
use crate::wallet::LocalWallet;

/// Sends state-changing contract calls from one account.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    fn address(&self) -> Address;

    /// Sends `data` to `to` and waits for the receipt.
    async fn send_call(&self, to: Address, data: Bytes, value: U256) -> ChainResult<ChainReceipt>;
}

/// Submits blob transactions from one account.
#[async_trait]
pub trait BlobSubmitter: Send + Sync {
    fn address(&self) -> Address;

    async fn balance(&self) -> ChainResult<U256>;

    /// Builds, signs and broadcasts a blob transaction carrying `blobs`, then
    /// waits for its receipt. A reverted transaction is an `Ok` receipt with
    /// `success == false`.
    async fn submit_blobs(
        &self,
        request: TxRequest,
        blobs: Vec<Blob>,
        proofs: BlobProofs,
    ) -> ChainResult<ChainReceipt>;
}

/// Builder and broadcaster bound to one local key.
pub struct ChainWriter {
    builder: BlobTransactionBuilder,
    broadcaster: TransactionBroadcaster,
}

impl ChainWriter {
    pub fn new(node: NodeClient, wallet: LocalWallet, poll: PollConfig) -> Self {
        let builder = BlobTransactionBuilder::new(node.clone(), wallet.address());
        let broadcaster = TransactionBroadcaster::new(node, wallet, poll);
        Self {
            builder,
            broadcaster,
        }
    }

    pub fn builder(&self) -> &BlobTransactionBuilder {
        &self.builder
    }

    pub fn broadcaster(&self) -> &TransactionBroadcaster {
        &self.broadcaster
    }
}

#[async_trait]
impl TransactionSender for ChainWriter {
    fn address(&self) -> Address {
        self.builder.from_address()
    }

    async fn send_call(&self, to: Address, data: Bytes, value: U256) -> ChainResult<ChainReceipt> {
        let tx = self.builder.build_call(TxRequest::call(to, data, value)).await?;
        let hash = self.broadcaster.send_eip1559_tx(tx).await?;
        self.broadcaster.wait_for_receipt(hash).await
    }
}

#[async_trait]
impl BlobSubmitter for ChainWriter {
    fn address(&self) -> Address {
        self.builder.from_address()
    }

    async fn balance(&self) -> ChainResult<U256> {
        self.builder.node().balance(self.builder.from_address()).await
    }

    async fn submit_blobs(
        &self,
        request: TxRequest,
        blobs: Vec<Blob>,
        proofs: BlobProofs,
    ) -> ChainResult<ChainReceipt> {
        let (versioned_hashes, sidecar) = proofs.into_sidecar(blobs)?;
        let tx = self
            .builder
            .build_blob_tx(request, versioned_hashes, sidecar)
            .await?;
        let hash = self.broadcaster.send_blob_tx(tx).await?;
        self.broadcaster.wait_for_receipt(hash).await
    }
}
