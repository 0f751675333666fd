use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use tracing::info;
use w3drive_chain::HttpProofService;
use w3drive_upload::{UploadRequest, Uploader, session_writer};

use super::Clients;

pub async fn run_upload(
    clients: &Clients,
    path: PathBuf,
    dir: String,
    name: Option<String>,
    file_type: String,
) -> Result<()> {
    let file_name = match name {
        Some(name) => name,
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("cannot derive a file name from {}", path.display()))?,
    };
    let content = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let session = clients.require_session()?;
    let writer = session_writer(clients.node.clone(), &session, clients.config.poll())?;
    let proofs = HttpProofService::new(
        &clients.config.proof_service.url,
        Duration::from_secs(clients.config.proof_service.timeout_secs),
    )?;
    let uploader = Uploader::new(
        clients.session_contract(writer.clone()),
        writer,
        Arc::new(proofs),
        clients.config.gateway(),
        clients.config.upload_options(),
    );

    let cancel = uploader.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, stopping before the next batch");
            cancel.cancel();
        }
    });

    let request = UploadRequest {
        account: clients.account(),
        dir_path: dir,
        file_name,
        file_type,
        content: Bytes::from(content),
    };
    let outcome = uploader
        .upload(request, |progress| {
            info!(
                chunk = progress.chunk_index,
                unchanged = progress.unchanged,
                "{}% uploaded",
                progress.percent()
            );
        })
        .await
        .context("upload failed")?;

    println!(
        "uploaded {}: {} chunk(s) written, {} unchanged",
        outcome.name, outcome.chunks_written, outcome.chunks_unchanged
    );
    println!("{}", outcome.url);
    Ok(())
}
