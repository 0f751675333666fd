//! Client for the remote KZG commitment/proof service.

use std::time::Duration;

use alloy_primitives::{B256, FixedBytes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use w3drive_core::Blob;

use crate::error::{ChainError, ChainResult};
use crate::tx::BlobSidecar;

pub const DEFAULT_PROOF_SERVICE_URL: &str = "https://api.w3link.io:3001/generate";

/// Versioned hashes, commitments and proofs for a list of blobs, in the
/// same order as the blobs.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobProofs {
    pub versioned_hashes: Vec<B256>,
    pub commitments: Vec<FixedBytes<48>>,
    pub proofs: Vec<FixedBytes<48>>,
}

impl BlobProofs {
    fn check_len(&self, blobs: usize) -> ChainResult<()> {
        if self.versioned_hashes.len() != blobs
            || self.commitments.len() != blobs
            || self.proofs.len() != blobs
        {
            return Err(ChainError::ProofService(format!(
                "expected {blobs} entries, got {} hashes, {} commitments, {} proofs",
                self.versioned_hashes.len(),
                self.commitments.len(),
                self.proofs.len()
            )));
        }
        Ok(())
    }

    /// Pairs the proofs with their blobs, ready for the transaction envelope.
    pub fn into_sidecar(self, blobs: Vec<Blob>) -> ChainResult<(Vec<B256>, BlobSidecar)> {
        self.check_len(blobs.len())?;
        Ok((
            self.versioned_hashes,
            BlobSidecar {
                blobs,
                commitments: self.commitments,
                proofs: self.proofs,
            },
        ))
    }
}

#[async_trait]
pub trait ProofService: Send + Sync {
    async fn generate(&self, blobs: &[Blob]) -> ChainResult<BlobProofs>;
}

#[derive(Serialize)]
struct GenerateRequest {
    blobs: Vec<String>,
}

pub struct HttpProofService {
    url: String,
    http_client: reqwest::Client,
}

impl HttpProofService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> ChainResult<Self> {
        Ok(Self {
            url: url.into(),
            http_client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl ProofService for HttpProofService {
    async fn generate(&self, blobs: &[Blob]) -> ChainResult<BlobProofs> {
        let request = GenerateRequest {
            blobs: blobs.iter().map(Blob::to_hex).collect(),
        };
        tracing::debug!(blobs = blobs.len(), url = %self.url, "requesting blob proofs");

        let res = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::ProofService(e.to_string()))?;
        if !res.status().is_success() {
            return Err(ChainError::ProofService(format!(
                "HTTP status {}",
                res.status()
            )));
        }
        let proofs: BlobProofs = res
            .json()
            .await
            .map_err(|e| ChainError::ProofService(e.to_string()))?;
        proofs.check_len(blobs.len())?;
        Ok(proofs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let json = format!(
            r#"{{"versionedHashes":["0x{}"],"commitments":["0x{}"],"proofs":["0x{}"]}}"#,
            "01".repeat(32),
            "02".repeat(48),
            "03".repeat(48)
        );
        let proofs: BlobProofs = serde_json::from_str(&json).unwrap();
        assert_eq!(proofs.versioned_hashes[0], B256::repeat_byte(1));
        assert_eq!(proofs.commitments[0], FixedBytes::<48>::repeat_byte(2));
    }

    #[test]
    fn test_sidecar_requires_matching_counts() {
        let proofs = BlobProofs {
            versioned_hashes: vec![B256::ZERO],
            commitments: vec![],
            proofs: vec![],
        };
        assert!(matches!(
            proofs.into_sidecar(vec![Blob::zeroed()]),
            Err(ChainError::ProofService(_))
        ));
    }
}
