use anyhow::{Context, Result, bail};
use w3drive_upload::{FileManager, session_writer};

use super::Clients;
use crate::FilesCmd;

pub async fn run_files(cmd: FilesCmd, clients: &Clients) -> Result<()> {
    match cmd {
        FilesCmd::List => {
            let files = FileManager::new(clients.primary_contract());
            let listed = files
                .list_files(clients.account())
                .await
                .context("failed to list files")?;
            for file in listed {
                println!(
                    "{}\t{}\t{}\t{}",
                    file.time.format("%Y-%m-%d %H:%M:%S"),
                    file.file_type,
                    file.name,
                    file.url
                );
            }
        }
        FilesCmd::Rm { names } => {
            // removals are authorized by the session key, like uploads
            let session = clients.require_session()?;
            let writer = session_writer(clients.node.clone(), &session, clients.config.poll())?;
            let files = FileManager::new(clients.session_contract(writer));
            let removed = match names.as_slice() {
                [name] => files.delete_file(clients.account(), name).await,
                names => files.delete_files(clients.account(), names).await,
            }
            .context("failed to remove files")?;
            if !removed {
                bail!("remove transaction failed");
            }
            println!("removed {} file(s)", names.len());
        }
    }
    Ok(())
}
