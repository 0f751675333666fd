use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use alloy_primitives::Address;
use anyhow::{Context, anyhow};
use clap::Subcommand;
use rand::RngCore;
use toml_edit::{DocumentMut, Item, Table};
use tracing::info;
use w3drive_chain::LocalWallet;

#[derive(Subcommand)]
pub enum CmdConfig {
    /// Creates the config file if it doesn't exist and generates a primary key
    Init {
        /// JSON-RPC endpoint of the node
        #[arg(long, value_name = "URL")]
        rpc_url: String,
        /// Address of the storage contract
        #[arg(long, value_name = "ADDRESS")]
        contract: Address,
        /// Domain of the gateway serving uploaded files
        #[arg(long, value_name = "DOMAIN", default_value = "w3link.io")]
        gateway_domain: String,
        /// Expected chain id
        #[arg(long)]
        chain_id: Option<u64>,
    },
}

impl CmdConfig {
    pub fn run(self, config_file: &Path) -> anyhow::Result<()> {
        let config_dir = config_file
            .parent()
            .ok_or_else(|| anyhow!("config file {config_file:?} has no parent directory"))?;

        let mut doc = if config_file.exists() {
            fs::read_to_string(config_file)?
        } else {
            fs::create_dir_all(config_dir)?;
            "".to_owned()
        }
        .parse::<DocumentMut>()
        .context("could not parse config file")?;

        match self {
            Self::Init {
                rpc_url,
                contract,
                gateway_domain,
                chain_id,
            } => {
                let chain = table(&mut doc, "chain")?;
                chain.insert("rpc_url", rpc_url.into());
                if let Some(chain_id) = chain_id {
                    let chain_id = i64::try_from(chain_id)
                        .with_context(|| format!("chain id {chain_id} does not fit in a TOML integer"))?;
                    chain.insert("chain_id", chain_id.into());
                }

                let contract_table = table(&mut doc, "contract")?;
                contract_table.insert("address", contract.to_checksum(None).into());
                contract_table.insert("gateway_domain", gateway_domain.into());

                table(&mut doc, "proof_service")?
                    .entry("url")
                    .or_insert(w3drive_chain::DEFAULT_PROOF_SERVICE_URL.into());
                table(&mut doc, "upload")?
                    .entry("max_blobs_per_tx")
                    .or_insert(i64::try_from(w3drive_core::MAX_BLOBS_PER_TX)?.into());

                let secret_key_name = config_file
                    .with_extension("secretkey")
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_owned)
                    .ok_or_else(|| anyhow!("invalid config file name {config_file:?}"))?;
                let identity = table(&mut doc, "identity")?;
                identity
                    .entry("secret_key_file")
                    .or_insert(secret_key_name.as_str().into());
                let secret_key_name = identity
                    .get("secret_key_file")
                    .and_then(Item::as_str)
                    .unwrap_or(&secret_key_name)
                    .to_owned();

                write_secret_key_if_missing(&config_dir.join(secret_key_name))?;
            }
        }

        info!("writing to config file {config_file:?}");
        write_atomic(config_file, doc.to_string().as_bytes())
    }
}

fn table<'a>(doc: &'a mut DocumentMut, name: &str) -> anyhow::Result<&'a mut Table> {
    doc.entry(name)
        .or_insert(Item::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| anyhow!("`{name}` in config file is not a table"))
}

fn write_secret_key_if_missing(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        return Ok(());
    }
    info!("generating secure random primary key");
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let wallet = LocalWallet::from_bytes(&bytes)?;
    write_atomic(path, hex::encode(bytes).as_bytes())?;
    info!(address = %wallet.address(), "primary key written to {path:?}");
    Ok(())
}

/// Writes through a temporary file and renames it into place.
pub fn write_atomic(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let tmp_path: PathBuf = path.with_extension("tmp");
    let mut tmp = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;
    tmp.write_all(contents)?;
    tmp.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
