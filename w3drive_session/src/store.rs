use alloy_primitives::Address;
use dashmap::DashMap;
use w3drive_chain::LocalWallet;

use crate::crypto::DriveKey;
use crate::error::SessionError;
use crate::keys::session_wallet;

/// A registered session: the drive key and the session address it yields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub key: DriveKey,
    pub address: Address,
}

impl Session {
    pub fn new(key: DriveKey) -> Result<Self, SessionError> {
        let address = session_wallet(&key)?.address();
        Ok(Self { key, address })
    }

    /// The wallet that signs the session's transactions.
    pub fn wallet(&self) -> Result<LocalWallet, SessionError> {
        session_wallet(&self.key)
    }
}

/// Process-wide session storage, keyed by primary account.
///
/// Holds at most one session: saving a session drops every other entry,
/// including those of other accounts.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Address, Session>,
}

impl SessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, account: Address, session: Session) {
        self.sessions.clear();
        self.sessions.insert(account, session);
    }

    pub fn get(&self, account: &Address) -> Option<Session> {
        self.sessions.get(account).map(|s| s.clone())
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(password: &str) -> Session {
        Session::new(DriveKey::derive("0xsig", password)).unwrap()
    }

    #[test]
    fn test_save_overwrites_every_account() {
        let store = SessionStore::new();
        let alice = Address::repeat_byte(1);
        let bob = Address::repeat_byte(2);

        store.save(alice, session("a"));
        assert_eq!(store.get(&alice), Some(session("a")));

        store.save(bob, session("b"));
        assert_eq!(store.get(&alice), None);
        assert_eq!(store.get(&bob), Some(session("b")));

        store.save(bob, session("c"));
        assert_eq!(store.get(&bob), Some(session("c")));
    }

    #[test]
    fn test_clear() {
        let store = SessionStore::new();
        assert!(store.is_empty());
        store.save(Address::repeat_byte(1), session("a"));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_session_address_matches_wallet() {
        let s = session("a");
        assert_eq!(s.wallet().unwrap().address(), s.address);
    }
}
