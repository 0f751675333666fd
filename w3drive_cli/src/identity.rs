//! Key files of the CLI: the primary account key and the current session key.

use std::fs;
use std::path::Path;

use anyhow::Context;
use w3drive_chain::LocalWallet;
use w3drive_session::{DriveKey, Session};

use crate::init_config::write_atomic;

pub fn load_primary_wallet(path: &Path) -> anyhow::Result<LocalWallet> {
    let secret = fs::read_to_string(path)
        .with_context(|| format!("could not read primary key file {}", path.display()))?;
    LocalWallet::from_hex(&secret)
        .with_context(|| format!("invalid primary key in {}", path.display()))
}

/// The saved session, `None` if no session key file exists.
pub fn load_session(path: &Path) -> anyhow::Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let encoded = fs::read_to_string(path)
        .with_context(|| format!("could not read session key file {}", path.display()))?;
    let key = DriveKey::decode(&encoded)
        .with_context(|| format!("invalid session key in {}", path.display()))?;
    Ok(Some(Session::new(key)?))
}

pub fn save_session(path: &Path, session: &Session) -> anyhow::Result<()> {
    write_atomic(path, session.key.encode().as_bytes())
        .with_context(|| format!("could not write session key file {}", path.display()))
}
