use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use directories::ProjectDirs;
use w3drive_cli::init_config::CmdConfig;

mod cmd;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Modify the w3drive config
    Config {
        #[command(subcommand)]
        cmd: CmdConfig,
    },
    /// Create, inspect and fund the session key that signs uploads
    Session {
        #[command(subcommand)]
        cmd: SessionCmd,
    },
    /// Upload a local file to the storage contract
    Upload {
        /// Local file path to upload
        path: PathBuf,
        /// Directory the file is stored under
        #[arg(long, value_name = "PATH", default_value = "")]
        dir: String,
        /// File name on-chain; defaults to the local file name
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        /// MIME type recorded with the file
        #[arg(long = "type", value_name = "MIME", default_value = "application/octet-stream")]
        file_type: String,
    },
    /// List and remove uploaded files
    Files {
        #[command(subcommand)]
        cmd: FilesCmd,
    },
}

#[derive(Subcommand)]
enum SessionCmd {
    /// Sign in, derive a session key and register it on-chain
    Create {
        #[arg(long)]
        password: String,
    },
    /// Re-derive a registered session key on this machine
    Restore {
        #[arg(long)]
        password: String,
    },
    /// Print the primary account, the session address and the on-chain record
    Show,
    /// Print the session address' balance in wei
    Balance,
    /// Send wei from the primary account to the session address
    Fund {
        /// Amount in wei
        amount: alloy_primitives::U256,
    },
}

#[derive(Subcommand)]
enum FilesCmd {
    /// List the primary account's files, oldest first
    List,
    /// Remove files by their on-chain name
    Rm {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    // Default config: ~/.config/w3drive/config.toml, key files next to it.
    let config_file = match cli.config {
        Some(path) => path,
        None => ProjectDirs::from("", "", "w3drive")
            .context("failed to determine config directory path")?
            .config_dir()
            .join("config.toml"),
    };

    cmd::run_command(config_file, cli.cmd).await
}
