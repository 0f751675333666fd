use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use w3drive_chain::{BalanceReader, ChainResult, FileContract, OnChainSession, TransactionSender};

use crate::crypto::{self, DriveKey, EncryptedSessionRecord};
use crate::error::SessionError;
use crate::keys::drive_id;
use crate::signer::WalletSigner;
use crate::siwe::sign_in_message;
use crate::store::{Session, SessionStore};

/// Creates, registers, restores and funds sessions for one primary account.
///
/// Contract writes (`createSession`) and gas transfers are sent from the
/// primary account through `sender`; `contract` must be bound to the same
/// account so that `getSession` reads that account's record.
pub struct SessionManager {
    signer: Arc<dyn WalletSigner>,
    contract: Arc<dyn FileContract>,
    sender: Arc<dyn TransactionSender>,
    balances: Arc<dyn BalanceReader>,
    store: Arc<SessionStore>,
    domain: String,
}

impl SessionManager {
    pub fn new(
        signer: Arc<dyn WalletSigner>,
        contract: Arc<dyn FileContract>,
        sender: Arc<dyn TransactionSender>,
        balances: Arc<dyn BalanceReader>,
        store: Arc<SessionStore>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            signer,
            contract,
            sender,
            balances,
            store,
            domain: domain.into(),
        }
    }

    pub fn account(&self) -> Address {
        self.signer.address()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The stored session for the primary account, if any.
    pub fn session(&self) -> Option<Session> {
        self.store.get(&self.account())
    }

    /// Asks the wallet to sign the sign-in message. `None` if the wallet
    /// refuses or fails.
    pub async fn sign_seed(&self, address: Address, network_id: u64) -> Option<String> {
        let message = sign_in_message(&self.domain, &address, network_id);
        match self.signer.sign_message(&message).await {
            Ok(signature) => Some(signature),
            Err(e) => {
                tracing::warn!(%address, "sign-in signature not obtained: {e}");
                None
            }
        }
    }

    /// Derives a session from `(signature, password)`, registers it on-chain
    /// and stores it. `None` unless the registration receipt reports success.
    pub async fn create_session(&self, signature: &str, password: &str) -> Option<Session> {
        match self.try_create_session(signature, password).await {
            Ok(session) => {
                self.store.save(self.account(), session.clone());
                Some(session)
            }
            Err(e) => {
                tracing::warn!("session registration failed: {e}");
                None
            }
        }
    }

    async fn try_create_session(
        &self,
        signature: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        let session = Session::new(DriveKey::derive(signature, password))?;
        let record = crypto::encrypt(&session.key, drive_id(&session.address).as_bytes())?;

        tracing::debug!(session = %session.address, "registering session");
        let receipt = self
            .contract
            .create_session(
                session.address,
                Bytes::from(record.onchain_iv()),
                Bytes::from(record.data),
            )
            .await?;
        if !receipt.success {
            return Err(SessionError::NotRegistered);
        }
        tracing::info!(
            session = %session.address,
            tx = %receipt.transaction_hash,
            "session registered"
        );
        Ok(session)
    }

    /// The account's on-chain session record, `None` if none is registered.
    pub async fn query_session(&self) -> ChainResult<Option<OnChainSession>> {
        let record = self.contract.get_session().await?;
        Ok(record.is_registered().then_some(record))
    }

    /// Re-derives the drive key and checks it against a stored record.
    ///
    /// `None` for a wrong password, a different signature or a tampered
    /// record alike.
    pub fn encrypt_session(
        &self,
        password: &str,
        signature: &str,
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Option<DriveKey> {
        let key = DriveKey::derive(signature, password);
        let iv = EncryptedSessionRecord::parse_onchain_iv(iv).ok()?;
        crypto::decrypt(&key, &iv, ciphertext).ok()?;
        Some(key)
    }

    /// Restores a previously registered session from `(signature, password)`
    /// and stores it. `Ok(None)` if no session is registered or the
    /// credentials do not open it.
    pub async fn restore_session(
        &self,
        signature: &str,
        password: &str,
    ) -> Result<Option<Session>, SessionError> {
        let Some(record) = self.query_session().await? else {
            return Ok(None);
        };
        let Some(key) = self.encrypt_session(password, signature, &record.iv, &record.encrypted)
        else {
            return Ok(None);
        };
        let session = Session::new(key)?;
        if session.address != record.address {
            return Err(SessionError::AddressMismatch(session.address));
        }
        self.store.save(self.account(), session.clone());
        Ok(Some(session))
    }

    pub async fn query_balance(&self, address: Address) -> ChainResult<U256> {
        self.balances.balance_of(address).await
    }

    /// Sends `amount` wei from the primary account to `to`. `false` on any
    /// failure.
    pub async fn transfer_gas(&self, amount: U256, to: Address) -> bool {
        match self.sender.send_call(to, Bytes::new(), amount).await {
            Ok(receipt) => {
                tracing::info!(%to, %amount, success = receipt.success, "gas transfer mined");
                receipt.success
            }
            Err(e) => {
                tracing::warn!(%to, %amount, "gas transfer failed: {e}");
                false
            }
        }
    }
}
