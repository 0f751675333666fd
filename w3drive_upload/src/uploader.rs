//! The upload state machine.
//!
//! ```text
//! Planning -> Clearing -> per batch { Proving -> BalanceCheck -> Submitting -> Confirming } -> Done
//!                                \-> (every chunk unchanged) skip batch
//! ```
//!
//! Batches run strictly one after another: each depends on the previous
//! batch's nonce and on the chunk hashes it wrote. Any failure aborts the
//! whole upload with one [`UploadError`]; chunks written before the failure
//! stay on-chain and are skipped as unchanged on the next attempt.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use w3drive_chain::{
    BlobSubmitter, FileContract, ProofService, TxRequest, encode_write_chunk,
};
use w3drive_core::{Blob, ChunkPlan, FileChunk, MAX_BLOBS_PER_TX};

use crate::address::{Gateway, storage_name};
use crate::error::UploadError;

/// Tunables of one [`Uploader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOptions {
    /// Maximum chunk length. `0`, `1` or anything above a blob's capacity
    /// means one full blob per chunk.
    pub max_chunk_len: usize,
    /// Blobs per transaction, clamped to `1..=MAX_BLOBS_PER_TX`.
    pub max_blobs_per_tx: usize,
    /// Payment per written chunk. Read from `upfrontPayment()` when `None`.
    ///
    /// A batch pays for its changed chunks only, not for every chunk in it:
    /// unchanged chunks are not resubmitted.
    pub per_chunk_cost: Option<U256>,
    /// Expected chain id, checked against the node before signing.
    pub chain_id: Option<u64>,
    pub max_fee_per_blob_gas: Option<U256>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            max_chunk_len: 0,
            max_blobs_per_tx: MAX_BLOBS_PER_TX,
            per_chunk_cost: None,
            chain_id: None,
            max_fee_per_blob_gas: None,
        }
    }
}

/// One file to upload on behalf of `account`.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub account: Address,
    pub dir_path: String,
    pub file_name: String,
    pub file_type: String,
    pub content: Bytes,
}

impl UploadRequest {
    /// The file's on-chain name.
    pub fn name(&self) -> String {
        storage_name(&self.dir_path, &self.file_name)
    }
}

/// Reported once per chunk, in ascending chunk order, after the chunk is
/// confirmed on-chain or found unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadProgress {
    pub chunk_index: u64,
    pub completed: usize,
    pub total: usize,
    pub unchanged: bool,
}

impl UploadProgress {
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        (self.completed * 100 / self.total) as u8
    }
}

/// Result of a finished upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOutcome {
    pub url: String,
    pub name: String,
    pub chunks_written: usize,
    pub chunks_unchanged: usize,
    pub transactions: Vec<B256>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Planning,
    Clearing,
    Proving,
    BalanceCheck,
    Submitting,
    Confirming,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Planning => "planning",
            Phase::Clearing => "clearing",
            Phase::Proving => "proving",
            Phase::BalanceCheck => "balance-check",
            Phase::Submitting => "submitting",
            Phase::Confirming => "confirming",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

/// What happened to one batch.
enum BatchOutcome {
    Unchanged,
    Written { transaction: B256, chunks: usize },
}

pub struct Uploader {
    contract: Arc<dyn FileContract>,
    submitter: Arc<dyn BlobSubmitter>,
    proofs: Arc<dyn ProofService>,
    gateway: Gateway,
    options: UploadOptions,
    cancel: CancellationToken,
}

impl Uploader {
    pub fn new(
        contract: Arc<dyn FileContract>,
        submitter: Arc<dyn BlobSubmitter>,
        proofs: Arc<dyn ProofService>,
        gateway: Gateway,
        mut options: UploadOptions,
    ) -> Self {
        options.max_blobs_per_tx = options.max_blobs_per_tx.clamp(1, MAX_BLOBS_PER_TX);
        Self {
            contract,
            submitter,
            proofs,
            gateway,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the upload before its next batch is sent. A batch
    /// already broadcast is always awaited.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads one file, calling `on_progress` for every chunk.
    pub async fn upload(
        &self,
        request: UploadRequest,
        on_progress: impl FnMut(UploadProgress),
    ) -> Result<UploadOutcome, UploadError> {
        let name = request.name();
        let span = tracing::debug_span!("upload", %name);
        self.run(request, name, on_progress).instrument(span).await
    }

    async fn run(
        &self,
        request: UploadRequest,
        name: String,
        mut on_progress: impl FnMut(UploadProgress),
    ) -> Result<UploadOutcome, UploadError> {
        tracing::debug!(phase = %Phase::Planning, size = request.content.len());
        let plan = ChunkPlan::new(request.content.clone(), self.options.max_chunk_len)?;
        let total = plan.chunk_count();

        tracing::debug!(phase = %Phase::Clearing, chunks = total);
        self.clear_stale(request.account, &name, total as u64).await?;

        let per_chunk_cost = match self.options.per_chunk_cost {
            Some(cost) => cost,
            None => self
                .contract
                .upfront_payment()
                .await
                .map_err(UploadError::read)?,
        };

        let mut outcome = UploadOutcome {
            url: self.gateway.content_address(&request.account, &name),
            name: name.clone(),
            chunks_written: 0,
            chunks_unchanged: 0,
            transactions: Vec::new(),
        };
        let mut completed = 0;
        for batch in plan.batches(self.options.max_blobs_per_tx) {
            let unchanged = match self
                .upload_batch(&request, &name, batch, per_chunk_cost)
                .await?
            {
                BatchOutcome::Unchanged => {
                    outcome.chunks_unchanged += batch.len();
                    true
                }
                BatchOutcome::Written {
                    transaction,
                    chunks,
                } => {
                    outcome.chunks_written += chunks;
                    outcome.chunks_unchanged += batch.len() - chunks;
                    outcome.transactions.push(transaction);
                    false
                }
            };
            for chunk in batch {
                completed += 1;
                on_progress(UploadProgress {
                    chunk_index: chunk.index,
                    completed,
                    total,
                    unchanged,
                });
            }
        }

        tracing::debug!(phase = %Phase::Done, written = outcome.chunks_written);
        tracing::info!(url = %outcome.url, "upload complete");
        Ok(outcome)
    }

    /// Removes the file first if the chain holds more chunks than the new
    /// plan, so a shorter re-upload leaves no trailing chunks behind.
    async fn clear_stale(
        &self,
        account: Address,
        name: &str,
        chunk_count: u64,
    ) -> Result<(), UploadError> {
        let stale = |reason: String| UploadError::StaleFileCheckFailed {
            name: name.to_owned(),
            reason,
        };

        let existing = self
            .contract
            .count_chunks(account, name.as_bytes())
            .await
            .map_err(|e| stale(e.to_string()))?;
        if existing <= chunk_count {
            return Ok(());
        }

        tracing::info!(existing, planned = chunk_count, "removing stale chunks");
        let receipt = self
            .contract
            .remove(account, name.as_bytes())
            .await
            .map_err(|e| stale(e.to_string()))?;
        if !receipt.success {
            return Err(stale(format!(
                "remove transaction {} failed",
                receipt.transaction_hash
            )));
        }
        Ok(())
    }

    async fn upload_batch(
        &self,
        request: &UploadRequest,
        name: &str,
        batch: &[FileChunk],
        per_chunk_cost: U256,
    ) -> Result<BatchOutcome, UploadError> {
        let mut changed = Vec::with_capacity(batch.len());
        for chunk in batch {
            let onchain = self
                .contract
                .get_chunk_hash(request.account, name.as_bytes(), chunk.index)
                .await
                .map_err(UploadError::read)?;
            if onchain != chunk.hash {
                changed.push(chunk);
            }
        }
        let first_chunk = batch.first().map(|c| c.index).unwrap_or_default();
        if changed.is_empty() {
            tracing::debug!(first_chunk, chunks = batch.len(), "batch unchanged, skipping");
            return Ok(BatchOutcome::Unchanged);
        }

        tracing::debug!(phase = %Phase::Proving, first_chunk, blobs = changed.len());
        let blobs = changed
            .iter()
            .map(|chunk| chunk.to_blob())
            .collect::<Result<Vec<Blob>, _>>()?;
        let proofs = self
            .proofs
            .generate(&blobs)
            .await
            .map_err(UploadError::ProofService)?;

        tracing::debug!(phase = %Phase::BalanceCheck, first_chunk);
        let required = per_chunk_cost.saturating_mul(U256::from(changed.len()));
        let available = self.submitter.balance().await.map_err(UploadError::read)?;
        if available < required {
            return Err(UploadError::InsufficientBalance {
                required,
                available,
            });
        }

        if self.cancel.is_cancelled() {
            return Err(UploadError::Cancelled {
                next_chunk: first_chunk,
            });
        }

        tracing::debug!(phase = %Phase::Submitting, first_chunk);
        let chunk_ids: Vec<u64> = changed.iter().map(|c| c.index).collect();
        let sizes: Vec<u64> = changed.iter().map(|c| c.len() as u64).collect();
        let data = encode_write_chunk(
            request.account,
            name.as_bytes(),
            request.file_type.as_bytes(),
            &chunk_ids,
            &sizes,
        );
        let tx = TxRequest {
            chain_id: self.options.chain_id,
            max_fee_per_blob_gas: self.options.max_fee_per_blob_gas,
            ..TxRequest::call(self.contract.address(), data, required)
        };
        let receipt = self
            .submitter
            .submit_blobs(tx, blobs, proofs)
            .await
            .map_err(UploadError::submit)?;
        tracing::debug!(phase = %Phase::Confirming, first_chunk, success = receipt.success);
        if !receipt.success {
            return Err(UploadError::WriteFailed {
                first_chunk,
                transaction: receipt.transaction_hash,
            });
        }

        tracing::info!(
            tx = %receipt.transaction_hash,
            chunks = ?chunk_ids,
            "batch confirmed"
        );
        Ok(BatchOutcome::Written {
            transaction: receipt.transaction_hash,
            chunks: changed.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let p = UploadProgress {
            chunk_index: 0,
            completed: 1,
            total: 3,
            unchanged: false,
        };
        assert_eq!(p.percent(), 33);
        let done = UploadProgress {
            completed: 3,
            ..p
        };
        assert_eq!(done.percent(), 100);
    }

    #[test]
    fn test_request_name() {
        let req = UploadRequest {
            account: Address::ZERO,
            dir_path: "docs".into(),
            file_name: "a.txt".into(),
            file_type: "text/plain".into(),
            content: Bytes::from_static(b"x"),
        };
        assert_eq!(req.name(), "docs/a.txt");
    }
}
