use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use w3drive_chain::LocalWallet;
use w3drive_chain::testutil::MemoryChain;
use w3drive_session::{SessionError, SessionManager, SessionStore, WalletSigner};

const PRIMARY_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

struct Harness {
    chain: Arc<MemoryChain>,
    store: Arc<SessionStore>,
    manager: SessionManager,
}

fn harness_with(signer: Arc<dyn WalletSigner>) -> Harness {
    let chain = Arc::new(MemoryChain::new(signer.address()));
    let store = Arc::new(SessionStore::new());
    let manager = SessionManager::new(
        signer,
        chain.clone(),
        chain.clone(),
        chain.clone(),
        store.clone(),
        "app.w3drive.io",
    );
    Harness {
        chain,
        store,
        manager,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(LocalWallet::from_hex(PRIMARY_KEY).unwrap()))
}

struct RejectingSigner;

#[async_trait]
impl WalletSigner for RejectingSigner {
    fn address(&self) -> Address {
        Address::repeat_byte(9)
    }

    async fn sign_message(&self, _message: &str) -> Result<String, SessionError> {
        Err(SessionError::Signer("user rejected the request".into()))
    }
}

#[tokio::test]
async fn test_sign_seed_is_stable() {
    let h = harness();
    let account = h.manager.account();
    let a = h.manager.sign_seed(account, 3333).await.unwrap();
    let b = h.manager.sign_seed(account, 3333).await.unwrap();
    assert_eq!(a, b);
    assert!(a.starts_with("0x"));
    assert_eq!(a.len(), 2 + 130);
}

#[tokio::test]
async fn test_sign_seed_rejection_is_none() {
    let h = harness_with(Arc::new(RejectingSigner));
    assert_eq!(h.manager.sign_seed(Address::repeat_byte(9), 1).await, None);
}

#[tokio::test]
async fn test_create_then_restore() {
    let h = harness();
    let account = h.manager.account();
    assert_eq!(h.manager.query_session().await.unwrap(), None);

    let signature = h.manager.sign_seed(account, 3333).await.unwrap();
    let session = h.manager.create_session(&signature, "hunter2").await.unwrap();
    assert_eq!(h.store.get(&account), Some(session.clone()));

    let record = h.manager.query_session().await.unwrap().unwrap();
    assert_eq!(record.address, session.address);
    // base64 text of a 12-byte nonce
    assert_eq!(record.iv.len(), 16);

    let key = h
        .manager
        .encrypt_session("hunter2", &signature, &record.iv, &record.encrypted)
        .unwrap();
    assert_eq!(key, session.key);

    h.store.clear();
    let restored = h
        .manager
        .restore_session(&signature, "hunter2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored, session);
    assert_eq!(h.manager.session(), Some(session));
}

#[tokio::test]
async fn test_wrong_password_or_tampered_record() {
    let h = harness();
    let account = h.manager.account();
    let signature = h.manager.sign_seed(account, 3333).await.unwrap();
    h.manager.create_session(&signature, "hunter2").await.unwrap();
    let record = h.manager.query_session().await.unwrap().unwrap();

    assert!(
        h.manager
            .encrypt_session("wrong", &signature, &record.iv, &record.encrypted)
            .is_none()
    );
    let mut tampered = record.encrypted.to_vec();
    tampered[0] ^= 0x80;
    assert!(
        h.manager
            .encrypt_session("hunter2", &signature, &record.iv, &tampered)
            .is_none()
    );
    assert_eq!(
        h.manager.restore_session(&signature, "wrong").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_failed_registration_is_empty() {
    let h = harness();
    h.chain.revert_submissions(true);
    let signature = h.manager.sign_seed(h.manager.account(), 1).await.unwrap();
    assert_eq!(h.manager.create_session(&signature, "pw").await, None);
    assert!(h.store.is_empty());

    h.chain.revert_submissions(false);
    h.chain.fail_submissions(true);
    assert_eq!(h.manager.create_session(&signature, "pw").await, None);
}

#[tokio::test]
async fn test_balance_and_transfer() {
    let h = harness();
    let account = h.manager.account();
    let to = Address::repeat_byte(0x77);
    h.chain.set_balance(account, U256::from(1_000));

    assert!(h.manager.transfer_gas(U256::from(400), to).await);
    assert_eq!(h.manager.query_balance(to).await.unwrap(), U256::from(400));
    assert_eq!(h.manager.query_balance(account).await.unwrap(), U256::from(600));

    assert!(!h.manager.transfer_gas(U256::from(10_000), to).await);
    h.chain.fail_submissions(true);
    assert!(!h.manager.transfer_gas(U256::from(1), to).await);
}
