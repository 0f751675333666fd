use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use w3drive_chain::{
    Address, ChainWriter, FileContract, HttpTransport, LocalWallet, NodeClient, RpcFileContract,
};
use w3drive_cli::W3DriveConfig;
use w3drive_cli::identity::{load_primary_wallet, load_session};
use w3drive_session::{Session, SessionManager, SessionStore};

mod files;
mod session;
mod upload;

pub use files::run_files;
pub use session::run_session;
pub use upload::run_upload;

pub async fn run_command(config_file: PathBuf, cmd: crate::Commands) -> Result<()> {
    match cmd {
        crate::Commands::Config { cmd } => cmd.run(&config_file),
        crate::Commands::Session { cmd } => run_session(cmd, &Clients::open(&config_file)?).await,
        crate::Commands::Upload {
            path,
            dir,
            name,
            file_type,
        } => run_upload(&Clients::open(&config_file)?, path, dir, name, file_type).await,
        crate::Commands::Files { cmd } => run_files(cmd, &Clients::open(&config_file)?).await,
    }
}

/// Everything the commands talk to, built from one config file.
pub struct Clients {
    pub config: W3DriveConfig,
    pub config_dir: PathBuf,
    pub node: NodeClient,
    pub primary: LocalWallet,
    pub primary_writer: Arc<ChainWriter>,
}

impl Clients {
    fn open(config_file: &Path) -> Result<Self> {
        let config = W3DriveConfig::load(config_file)?;
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let transport = HttpTransport::new(
            &config.chain.rpc_url,
            Duration::from_secs(config.chain.timeout_secs),
        )?;
        let node = NodeClient::new(Arc::new(transport));
        let primary = load_primary_wallet(&config.identity.secret_key_path(&config_dir))?;
        let primary_writer = Arc::new(ChainWriter::new(
            node.clone(),
            primary.clone(),
            config.poll(),
        ));

        Ok(Self {
            config,
            config_dir,
            node,
            primary,
            primary_writer,
        })
    }

    pub fn account(&self) -> Address {
        self.primary.address()
    }

    pub fn session_key_path(&self) -> PathBuf {
        self.config.identity.session_key_path(&self.config_dir)
    }

    /// The storage contract, with writes sent from the primary account.
    pub fn primary_contract(&self) -> Arc<dyn FileContract> {
        Arc::new(RpcFileContract::new(
            self.node.clone(),
            self.config.contract.address,
            self.primary_writer.clone(),
        ))
    }

    /// The storage contract, with writes signed by the session key.
    pub fn session_contract(&self, writer: Arc<ChainWriter>) -> Arc<dyn FileContract> {
        Arc::new(RpcFileContract::new(
            self.node.clone(),
            self.config.contract.address,
            writer,
        ))
    }

    pub fn session_manager(&self) -> SessionManager {
        SessionManager::new(
            Arc::new(self.primary.clone()),
            self.primary_contract(),
            self.primary_writer.clone(),
            Arc::new(self.node.clone()),
            Arc::new(SessionStore::new()),
            self.config.contract.sign_in_domain.clone(),
        )
    }

    /// The saved session, failing with a hint if there is none.
    pub fn require_session(&self) -> Result<Session> {
        load_session(&self.session_key_path())?.ok_or_else(|| {
            anyhow!("no session key found, run `w3drive session create --password ..` first")
        })
    }

    pub async fn chain_id(&self) -> Result<u64> {
        match self.config.chain.chain_id {
            Some(chain_id) => Ok(chain_id),
            None => self
                .node
                .chain_id()
                .await
                .context("could not read chain id from node"),
        }
    }
}
