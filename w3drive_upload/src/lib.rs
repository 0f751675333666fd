//! Uploading files to the storage contract and managing them afterwards.
//!
//! [`Uploader`] runs the chunk-diff upload: plan chunks, clear stale
//! chunks, then per batch of up to three blobs skip what is unchanged,
//! fetch proofs, check the balance and submit one blob transaction.
//! [`FileManager`] lists and removes uploaded files.

mod address;
mod error;
mod files;
mod uploader;

use std::sync::Arc;

use w3drive_chain::{ChainWriter, NodeClient, PollConfig};
use w3drive_session::Session;

pub use address::{Gateway, storage_name};
pub use error::UploadError;
pub use files::{FileManager, StoredFile};
pub use uploader::{UploadOptions, UploadOutcome, UploadProgress, UploadRequest, Uploader};

/// A blob submitter signing with the session key.
pub fn session_writer(
    node: NodeClient,
    session: &Session,
    poll: PollConfig,
) -> Result<Arc<ChainWriter>, UploadError> {
    let wallet = session.wallet().map_err(UploadError::Authentication)?;
    Ok(Arc::new(ChainWriter::new(node, wallet, poll)))
}
