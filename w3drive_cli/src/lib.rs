//! Configuration and key files of the `w3drive` command line client.

pub mod config;
pub mod identity;
pub mod init_config;

pub use config::W3DriveConfig;
