use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use w3drive_chain::{ChainResult, FileContract};

/// A file as listed by the storage contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub time: DateTime<Utc>,
    pub name: String,
    pub file_type: String,
    pub url: String,
}

/// Listing and removal of an account's uploaded files.
pub struct FileManager {
    contract: Arc<dyn FileContract>,
}

impl FileManager {
    pub fn new(contract: Arc<dyn FileContract>) -> Self {
        Self { contract }
    }

    /// The account's files, oldest upload first.
    pub async fn list_files(&self, account: Address) -> ChainResult<Vec<StoredFile>> {
        let mut files: Vec<StoredFile> = self
            .contract
            .get_author_files(account)
            .await?
            .into_iter()
            .map(|f| StoredFile {
                time: i64::try_from(f.time)
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .unwrap_or_default(),
                name: String::from_utf8_lossy(&f.name).into_owned(),
                file_type: String::from_utf8_lossy(&f.file_type).into_owned(),
                url: f.url,
            })
            .collect();
        files.sort_by_key(|f| f.time);
        Ok(files)
    }

    /// Removes one file and reports whether the removal was mined successfully.
    pub async fn delete_file(&self, account: Address, name: &str) -> ChainResult<bool> {
        let receipt = self.contract.remove(account, name.as_bytes()).await?;
        tracing::info!(name, tx = %receipt.transaction_hash, success = receipt.success, "file removed");
        Ok(receipt.success)
    }

    /// Removes several files in one transaction.
    pub async fn delete_files(&self, account: Address, names: &[String]) -> ChainResult<bool> {
        let names: Vec<Vec<u8>> = names.iter().map(|n| n.as_bytes().to_vec()).collect();
        let receipt = self.contract.removes(account, &names).await?;
        tracing::info!(
            count = names.len(),
            tx = %receipt.transaction_hash,
            success = receipt.success,
            "files removed"
        );
        Ok(receipt.success)
    }
}
