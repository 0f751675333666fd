use std::fs;

use alloy_primitives::Address;
use w3drive_cli::W3DriveConfig;
use w3drive_cli::identity::{load_primary_wallet, load_session, save_session};
use w3drive_cli::init_config::CmdConfig;
use w3drive_session::{DriveKey, Session};

fn init(rpc_url: &str) -> CmdConfig {
    CmdConfig::Init {
        rpc_url: rpc_url.to_owned(),
        contract: Address::repeat_byte(0xcc),
        gateway_domain: "w3link.io".to_owned(),
        chain_id: Some(3335),
    }
}

#[test]
fn test_init_writes_loadable_config_and_key() {
    let dir = tempfile::tempdir().unwrap();
    let config_file = dir.path().join("nested").join("config.toml");

    init("http://localhost:8545").run(&config_file).unwrap();

    let config = W3DriveConfig::load(&config_file).unwrap();
    assert_eq!(config.chain.rpc_url, "http://localhost:8545");
    assert_eq!(config.chain.chain_id, Some(3335));
    assert_eq!(config.contract.address, Address::repeat_byte(0xcc));
    assert_eq!(config.identity.secret_key_file, "config.secretkey");
    assert_eq!(config.upload.max_blobs_per_tx, 3);
    assert!(!config_file.with_extension("tmp").exists());

    let key_path = config.identity.secret_key_path(config_file.parent().unwrap());
    let wallet = load_primary_wallet(&key_path).unwrap();
    assert_ne!(wallet.address(), Address::ZERO);
}

#[test]
fn test_init_rejects_chain_id_beyond_toml_range() {
    let dir = tempfile::tempdir().unwrap();
    let config_file = dir.path().join("config.toml");

    let cmd = CmdConfig::Init {
        rpc_url: "http://localhost:8545".to_owned(),
        contract: Address::repeat_byte(0xcc),
        gateway_domain: "w3link.io".to_owned(),
        chain_id: Some(u64::MAX),
    };
    assert!(cmd.run(&config_file).is_err());
    assert!(!config_file.exists());
}

#[test]
fn test_load_rejects_oversized_batches() {
    let dir = tempfile::tempdir().unwrap();
    let config_file = dir.path().join("config.toml");
    init("http://localhost:8545").run(&config_file).unwrap();

    let text = fs::read_to_string(&config_file)
        .unwrap()
        .replace("max_blobs_per_tx = 3", "max_blobs_per_tx = 6");
    fs::write(&config_file, text).unwrap();
    assert!(W3DriveConfig::load(&config_file).is_err());
}

#[test]
fn test_init_twice_keeps_key_and_other_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config_file = dir.path().join("config.toml");

    init("http://localhost:8545").run(&config_file).unwrap();
    let key_path = dir.path().join("config.secretkey");
    let first_key = fs::read_to_string(&key_path).unwrap();

    let mut text = fs::read_to_string(&config_file).unwrap();
    text.push_str("\n# keep me\n");
    fs::write(&config_file, text).unwrap();

    init("http://node:8545").run(&config_file).unwrap();
    assert_eq!(fs::read_to_string(&key_path).unwrap(), first_key);

    let text = fs::read_to_string(&config_file).unwrap();
    assert!(text.contains("# keep me"));
    let config = W3DriveConfig::load(&config_file).unwrap();
    assert_eq!(config.chain.rpc_url, "http://node:8545");
}

#[test]
fn test_session_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.key");
    assert!(load_session(&path).unwrap().is_none());

    let session = Session::new(DriveKey::derive("0x1234", "pw")).unwrap();
    save_session(&path, &session).unwrap();

    let loaded = load_session(&path).unwrap().unwrap();
    assert_eq!(loaded.address, session.address);
    assert_eq!(loaded.key, session.key);

    fs::write(&path, "garbage").unwrap();
    assert!(load_session(&path).is_err());
}

#[test]
fn test_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(W3DriveConfig::load(&dir.path().join("absent.toml")).is_err());
}
