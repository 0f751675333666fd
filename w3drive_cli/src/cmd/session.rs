use anyhow::{Context, Result, bail};
use w3drive_cli::identity::{load_session, save_session};
use w3drive_session::SessionManager;

use super::Clients;
use crate::SessionCmd;

pub async fn run_session(cmd: SessionCmd, clients: &Clients) -> Result<()> {
    let manager = clients.session_manager();
    match cmd {
        SessionCmd::Create { password } => {
            let signature = sign_in(clients, &manager).await?;
            let Some(session) = manager.create_session(&signature, &password).await else {
                bail!("session registration failed, see the log for details");
            };
            save_session(&clients.session_key_path(), &session)?;
            println!("session registered: address={}", session.address);
        }
        SessionCmd::Restore { password } => {
            let signature = sign_in(clients, &manager).await?;
            let session = manager
                .restore_session(&signature, &password)
                .await
                .context("failed to restore session")?;
            let Some(session) = session else {
                bail!("no session is registered for this account, or the password is wrong");
            };
            save_session(&clients.session_key_path(), &session)?;
            println!("session restored: address={}", session.address);
        }
        SessionCmd::Show => {
            println!("account: {}", manager.account());
            match load_session(&clients.session_key_path())? {
                Some(session) => println!("local session: {}", session.address),
                None => println!("local session: none"),
            }
            let record = manager
                .query_session()
                .await
                .context("failed to read session record")?;
            match record {
                Some(record) => println!("registered session: {}", record.address),
                None => println!("registered session: none"),
            }
        }
        SessionCmd::Balance => {
            let session = clients.require_session()?;
            let balance = manager
                .query_balance(session.address)
                .await
                .context("failed to read session balance")?;
            println!("{balance}");
        }
        SessionCmd::Fund { amount } => {
            let session = clients.require_session()?;
            if !manager.transfer_gas(amount, session.address).await {
                bail!("transfer to {} failed", session.address);
            }
            println!("sent {amount} wei to {}", session.address);
        }
    }
    Ok(())
}

async fn sign_in(clients: &Clients, manager: &SessionManager) -> Result<String> {
    let chain_id = clients.chain_id().await?;
    manager
        .sign_seed(manager.account(), chain_id)
        .await
        .context("the primary key did not sign the sign-in message")
}
