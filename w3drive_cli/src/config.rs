use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use w3drive_chain::{DEFAULT_MAX_FEE_PER_BLOB_GAS, DEFAULT_PROOF_SERVICE_URL, PollConfig};
use w3drive_core::MAX_BLOBS_PER_TX;
use w3drive_upload::{Gateway, UploadOptions};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct W3DriveConfig {
    pub chain: ChainConfig,
    pub contract: ContractConfig,
    #[serde(default)]
    pub proof_service: ProofServiceConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    pub rpc_url: String,
    /// Checked against `eth_chainId` before signing.
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default = "default_rpc_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractConfig {
    pub address: Address,
    pub gateway_domain: String,
    /// Subdomain used in content addresses. Defaults to the contract address.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Domain shown in the sign-in message.
    #[serde(default = "default_sign_in_domain")]
    pub sign_in_domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofServiceConfig {
    #[serde(default = "default_proof_service_url")]
    pub url: String,
    #[serde(default = "default_proof_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProofServiceConfig {
    fn default() -> Self {
        Self {
            url: default_proof_service_url(),
            timeout_secs: default_proof_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadConfig {
    /// `0` or `1` keeps one full blob per chunk.
    #[serde(default)]
    pub max_chunk_len: usize,
    #[serde(default = "default_max_blobs_per_tx")]
    pub max_blobs_per_tx: usize,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,
    #[serde(default = "default_max_fee_per_blob_gas")]
    pub max_fee_per_blob_gas: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: 0,
            max_blobs_per_tx: default_max_blobs_per_tx(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: None,
            max_fee_per_blob_gas: default_max_fee_per_blob_gas(),
        }
    }
}

/// Key files, relative to the config file's directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Hex private key of the primary account.
    pub secret_key_file: String,
    /// Encoded drive key of the current session.
    #[serde(default = "default_session_key_file")]
    pub session_key_file: String,
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_sign_in_domain() -> String {
    "w3drive".to_owned()
}

fn default_proof_service_url() -> String {
    DEFAULT_PROOF_SERVICE_URL.to_owned()
}

fn default_proof_timeout_secs() -> u64 {
    30
}

fn default_max_blobs_per_tx() -> usize {
    MAX_BLOBS_PER_TX
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_fee_per_blob_gas() -> u64 {
    DEFAULT_MAX_FEE_PER_BLOB_GAS
}

fn default_session_key_file() -> String {
    "session.key".to_owned()
}

impl W3DriveConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("could not parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let max_blobs = self.upload.max_blobs_per_tx;
        if max_blobs == 0 || max_blobs > MAX_BLOBS_PER_TX {
            bail!("upload.max_blobs_per_tx must be between 1 and {MAX_BLOBS_PER_TX}, got {max_blobs}");
        }
        Ok(())
    }

    pub fn gateway(&self) -> Gateway {
        let identifier = self
            .contract
            .identifier
            .clone()
            .unwrap_or_else(|| self.contract.address.to_checksum(None));
        Gateway::new(identifier, &self.contract.gateway_domain)
    }

    pub fn poll(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.upload.poll_interval_secs),
            max_attempts: self.upload.max_poll_attempts,
        }
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            max_chunk_len: self.upload.max_chunk_len,
            max_blobs_per_tx: self.upload.max_blobs_per_tx,
            per_chunk_cost: None,
            chain_id: self.chain.chain_id,
            max_fee_per_blob_gas: Some(U256::from(self.upload.max_fee_per_blob_gas)),
        }
    }
}

impl IdentityConfig {
    pub fn secret_key_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.secret_key_file)
    }

    pub fn session_key_path(&self, config_dir: &Path) -> PathBuf {
        config_dir.join(&self.session_key_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: W3DriveConfig = toml::from_str(
            r#"
            [chain]
            rpc_url = "http://localhost:8545"

            [contract]
            address = "0x00000000000000000000000000000000000000cc"
            gateway_domain = "w3link.io"

            [identity]
            secret_key_file = "primary.secretkey"
            "#,
        )
        .unwrap();

        assert_eq!(config.chain.chain_id, None);
        assert_eq!(config.proof_service, ProofServiceConfig::default());
        assert_eq!(config.upload, UploadConfig::default());
        assert_eq!(config.identity.session_key_file, "session.key");

        let options = config.upload_options();
        assert_eq!(options.max_blobs_per_tx, 3);
        assert_eq!(options.per_chunk_cost, None);
        assert_eq!(config.poll().interval, Duration::from_secs(5));
        assert_eq!(
            config.gateway().identifier,
            config.contract.address.to_checksum(None)
        );
    }

    #[test]
    fn test_identifier_override() {
        let config: W3DriveConfig = toml::from_str(
            r#"
            [chain]
            rpc_url = "http://localhost:8545"
            chain_id = 3334

            [contract]
            address = "0x00000000000000000000000000000000000000cc"
            gateway_domain = "w3link.io"
            identifier = "drive"

            [upload]
            max_chunk_len = 1000
            max_poll_attempts = 60

            [identity]
            secret_key_file = "/keys/primary"
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.gateway(), Gateway::new("drive", "w3link.io"));
        assert_eq!(config.upload_options().chain_id, Some(3334));
        assert_eq!(config.poll().max_attempts, Some(60));
        assert_eq!(
            config.identity.secret_key_path(Path::new("/etc/w3drive")),
            PathBuf::from("/keys/primary")
        );
    }

    #[test]
    fn test_max_blobs_per_tx_out_of_range() {
        let base = r#"
            [chain]
            rpc_url = "http://localhost:8545"

            [contract]
            address = "0x00000000000000000000000000000000000000cc"
            gateway_domain = "w3link.io"

            [identity]
            secret_key_file = "primary.secretkey"
            "#;
        for (value, ok) in [(0, false), (1, true), (3, true), (4, false), (6, false)] {
            let text = format!("{base}\n[upload]\nmax_blobs_per_tx = {value}\n");
            let config: W3DriveConfig = toml::from_str(&text).unwrap();
            assert_eq!(config.validate().is_ok(), ok, "max_blobs_per_tx = {value}");
        }
    }
}
