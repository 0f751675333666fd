//! In-memory stand-ins for the chain, the proof service and the JSON-RPC
//! transport.
//!
//! Enable the `testutil` feature in a dev-dependency to use them:
//!
//! ```toml
//! [dev-dependencies]
//! w3drive_chain = { workspace = true, features = ["testutil"] }
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use alloy_primitives::{Address, B256, Bytes, FixedBytes, U256, keccak256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use w3drive_core::{Blob, Hash};

use crate::builder::TxRequest;
use crate::contract::{AuthorFile, FileContract, IFileStorage, OnChainSession};
use crate::error::{ChainError, ChainResult};
use crate::node::BalanceReader;
use crate::proof::{BlobProofs, ProofService};
use crate::rpc::RpcTransport;
use crate::types::ChainReceipt;
use crate::writer::{BlobSubmitter, TransactionSender};

#[derive(Clone, Debug, Default)]
struct StoredFile {
    file_type: Vec<u8>,
    time: u64,
    /// chunk index -> (hash of the chunk bytes, chunk length)
    chunks: BTreeMap<u64, (Hash, u64)>,
}

/// A transaction accepted by [`MemoryChain`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedTx {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    /// Number of blobs carried, zero for plain calls.
    pub blob_count: usize,
    pub success: bool,
}

/// A chain holding one storage contract, seen from one account.
///
/// Contract reads and plain calls act as `account`; blob submissions are
/// sent from `submitter`, which defaults to the same address. Submitted
/// `writeChunk` calls are decoded and the chunk hashes recorded, so a
/// later `get_chunk_hash` returns the keccak-256 of the chunk bytes.
pub struct MemoryChain {
    account: Address,
    submitter: Address,
    contract: Address,
    files: DashMap<(Address, Vec<u8>), StoredFile>,
    sessions: DashMap<Address, OnChainSession>,
    balances: DashMap<Address, U256>,
    upfront_payment: AtomicU64,
    clock: AtomicU64,
    transactions: Mutex<Vec<SubmittedTx>>,
    fail_submissions: AtomicBool,
    reject_estimates: AtomicBool,
    revert_submissions: AtomicBool,
    /// Blob submissions still allowed to succeed, `usize::MAX` for unlimited.
    successes_left: AtomicUsize,
}

impl MemoryChain {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            submitter: account,
            contract: Address::repeat_byte(0xcc),
            files: DashMap::new(),
            sessions: DashMap::new(),
            balances: DashMap::new(),
            upfront_payment: AtomicU64::new(0),
            clock: AtomicU64::new(1_700_000_000),
            transactions: Mutex::new(Vec::new()),
            fail_submissions: AtomicBool::new(false),
            reject_estimates: AtomicBool::new(false),
            revert_submissions: AtomicBool::new(false),
            successes_left: AtomicUsize::new(usize::MAX),
        }
    }

    /// Sends blob transactions from `submitter` instead of the account.
    pub fn with_submitter(mut self, submitter: Address) -> Self {
        self.submitter = submitter;
        self
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.balances.insert(address, balance);
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.balances.get(&address).map(|b| *b).unwrap_or_default()
    }

    pub fn set_upfront_payment(&self, wei: u64) {
        self.upfront_payment.store(wei, Ordering::SeqCst);
    }

    /// Makes every following submission fail before it reaches the chain.
    pub fn fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::SeqCst);
    }

    /// Makes every following blob submission fail gas estimation.
    pub fn reject_estimates(&self, reject: bool) {
        self.reject_estimates.store(reject, Ordering::SeqCst);
    }

    /// Makes every following submission mine with a failed status.
    pub fn revert_submissions(&self, revert: bool) {
        self.revert_submissions.store(revert, Ordering::SeqCst);
        if !revert {
            self.successes_left.store(usize::MAX, Ordering::SeqCst);
        }
    }

    /// Lets `n` more blob submissions succeed, then reverts the rest.
    pub fn revert_blob_submissions_after(&self, n: usize) {
        self.successes_left.store(n, Ordering::SeqCst);
    }

    fn take_blob_success(&self) -> bool {
        self.successes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok()
    }

    /// Seeds a chunk hash as if it had been written earlier.
    pub fn put_chunk(&self, author: Address, name: &[u8], index: u64, data: &[u8]) {
        let mut file = self.files.entry((author, name.to_vec())).or_default();
        file.time = self.tick();
        file.chunks
            .insert(index, (Hash::new(data), data.len() as u64));
    }

    pub fn chunk_indices(&self, author: Address, name: &[u8]) -> Vec<u64> {
        self.files
            .get(&(author, name.to_vec()))
            .map(|f| f.chunks.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn session_of(&self, address: Address) -> Option<OnChainSession> {
        self.sessions.get(&address).map(|s| s.clone())
    }

    pub fn transactions(&self) -> Vec<SubmittedTx> {
        self.lock_transactions().clone()
    }

    pub fn blob_transactions(&self) -> Vec<SubmittedTx> {
        self.transactions()
            .into_iter()
            .filter(|tx| tx.blob_count > 0)
            .collect()
    }

    fn lock_transactions(&self) -> std::sync::MutexGuard<'_, Vec<SubmittedTx>> {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn record(&self, tx: SubmittedTx) -> ChainReceipt {
        let success = tx.success;
        let mut txs = self.lock_transactions();
        txs.push(tx);
        let n = txs.len() as u64;
        ChainReceipt {
            transaction_hash: keccak256(n.to_be_bytes()),
            success,
            block_number: Some(n),
        }
    }

    fn debit(&self, from: Address, value: U256) -> bool {
        let mut balance = self.balances.entry(from).or_default();
        if *balance < value {
            return false;
        }
        *balance -= value;
        true
    }

    fn apply_call(&self, from: Address, to: Address, data: &Bytes, value: U256) -> bool {
        if !self.debit(from, value) {
            return false;
        }
        if to != self.contract {
            *self.balances.entry(to).or_default() += value;
            return true;
        }

        if let Ok(call) = IFileStorage::createSessionCall::abi_decode(data) {
            self.sessions.insert(
                from,
                OnChainSession {
                    address: call.addr,
                    iv: call.iv,
                    encrypted: call.encrypt,
                },
            );
        } else if let Ok(call) = IFileStorage::removeCall::abi_decode(data) {
            self.files.remove(&(call.author, call.name.to_vec()));
        } else if let Ok(call) = IFileStorage::removesCall::abi_decode(data) {
            for name in call.names {
                self.files.remove(&(call.author, name.to_vec()));
            }
        } else {
            return false;
        }
        true
    }
}

#[async_trait]
impl FileContract for MemoryChain {
    fn address(&self) -> Address {
        self.contract
    }

    async fn create_session(
        &self,
        addr: Address,
        iv: Bytes,
        encrypted: Bytes,
    ) -> ChainResult<ChainReceipt> {
        let data = IFileStorage::createSessionCall {
            addr,
            iv,
            encrypt: encrypted,
        }
        .abi_encode();
        TransactionSender::send_call(self, self.contract, data.into(), U256::ZERO).await
    }

    async fn get_session(&self) -> ChainResult<OnChainSession> {
        Ok(self.session_of(self.account).unwrap_or_default())
    }

    async fn upfront_payment(&self) -> ChainResult<U256> {
        Ok(U256::from(self.upfront_payment.load(Ordering::SeqCst)))
    }

    async fn remove(&self, author: Address, name: &[u8]) -> ChainResult<ChainReceipt> {
        let data = IFileStorage::removeCall {
            author,
            name: Bytes::copy_from_slice(name),
        }
        .abi_encode();
        TransactionSender::send_call(self, self.contract, data.into(), U256::ZERO).await
    }

    async fn removes(&self, author: Address, names: &[Vec<u8>]) -> ChainResult<ChainReceipt> {
        let data = IFileStorage::removesCall {
            author,
            names: names.iter().map(|n| Bytes::copy_from_slice(n)).collect(),
        }
        .abi_encode();
        TransactionSender::send_call(self, self.contract, data.into(), U256::ZERO).await
    }

    async fn count_chunks(&self, author: Address, name: &[u8]) -> ChainResult<u64> {
        Ok(self
            .files
            .get(&(author, name.to_vec()))
            .map(|f| f.chunks.len() as u64)
            .unwrap_or(0))
    }

    async fn get_chunk_hash(
        &self,
        author: Address,
        name: &[u8],
        chunk_index: u64,
    ) -> ChainResult<Hash> {
        Ok(self
            .files
            .get(&(author, name.to_vec()))
            .and_then(|f| f.chunks.get(&chunk_index).map(|(hash, _)| *hash))
            .unwrap_or(Hash::ZERO))
    }

    async fn get_author_files(&self, author: Address) -> ChainResult<Vec<AuthorFile>> {
        let mut files: Vec<AuthorFile> = self
            .files
            .iter()
            .filter(|entry| entry.key().0 == author)
            .map(|entry| AuthorFile {
                time: entry.time,
                name: Bytes::copy_from_slice(&entry.key().1),
                file_type: Bytes::copy_from_slice(&entry.file_type),
                url: String::new(),
            })
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

#[async_trait]
impl TransactionSender for MemoryChain {
    fn address(&self) -> Address {
        self.account
    }

    async fn send_call(&self, to: Address, data: Bytes, value: U256) -> ChainResult<ChainReceipt> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(ChainError::Unavailable("injected failure".into()));
        }
        let success = !self.revert_submissions.load(Ordering::SeqCst)
            && self.apply_call(self.account, to, &data, value);
        Ok(self.record(SubmittedTx {
            from: self.account,
            to,
            value,
            data,
            blob_count: 0,
            success,
        }))
    }
}

#[async_trait]
impl BlobSubmitter for MemoryChain {
    fn address(&self) -> Address {
        self.submitter
    }

    async fn balance(&self) -> ChainResult<U256> {
        Ok(self.balance_of(self.submitter))
    }

    async fn submit_blobs(
        &self,
        request: TxRequest,
        blobs: Vec<Blob>,
        proofs: BlobProofs,
    ) -> ChainResult<ChainReceipt> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(ChainError::Unavailable("injected failure".into()));
        }
        if self.reject_estimates.load(Ordering::SeqCst) {
            return Err(ChainError::EstimateReverted);
        }
        let (_, sidecar) = proofs.into_sidecar(blobs)?;
        let call = IFileStorage::writeChunkCall::abi_decode(&request.data)?;

        let mut success = !self.revert_submissions.load(Ordering::SeqCst)
            && self.take_blob_success()
            && call.chunkIds.len() == sidecar.blobs.len()
            && call.sizes.len() == sidecar.blobs.len();
        success = success && self.debit(self.submitter, request.value);

        if success {
            let time = self.tick();
            let mut file = self
                .files
                .entry((call.author, call.name.to_vec()))
                .or_default();
            file.file_type = call.fileType.to_vec();
            file.time = time;
            for ((id, size), blob) in call.chunkIds.iter().zip(&call.sizes).zip(&sidecar.blobs) {
                let size: usize = size.saturating_to();
                let data: Vec<u8> = blob.payload_chunks().flatten().copied().take(size).collect();
                file.chunks
                    .insert(id.saturating_to(), (Hash::new(&data), size as u64));
            }
        }

        Ok(self.record(SubmittedTx {
            from: self.submitter,
            to: request.to,
            value: request.value,
            data: request.data,
            blob_count: sidecar.blobs.len(),
            success,
        }))
    }
}

#[async_trait]
impl BalanceReader for MemoryChain {
    async fn balance_of(&self, address: Address) -> ChainResult<U256> {
        Ok(MemoryChain::balance_of(self, address))
    }
}

/// Proof service that derives placeholder commitments from the blob bytes.
#[derive(Default)]
pub struct FakeProofService {
    calls: AtomicUsize,
    blobs_seen: AtomicUsize,
    fail: AtomicBool,
}

impl FakeProofService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn blobs_seen(&self) -> usize {
        self.blobs_seen.load(Ordering::SeqCst)
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProofService for FakeProofService {
    async fn generate(&self, blobs: &[Blob]) -> ChainResult<BlobProofs> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.blobs_seen.fetch_add(blobs.len(), Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ChainError::ProofService("injected failure".into()));
        }

        let mut proofs = BlobProofs {
            versioned_hashes: Vec::with_capacity(blobs.len()),
            commitments: Vec::with_capacity(blobs.len()),
            proofs: Vec::with_capacity(blobs.len()),
        };
        for blob in blobs {
            let digest = keccak256(blob.as_bytes());
            let mut versioned = digest;
            versioned[0] = 0x01;
            proofs.versioned_hashes.push(versioned);
            proofs.commitments.push(FixedBytes::<48>::left_padding_from(digest.as_slice()));
            proofs.proofs.push(FixedBytes::<48>::right_padding_from(digest.as_slice()));
        }
        Ok(proofs)
    }
}

enum Scripted {
    Result(Value),
    RpcError(i64, String),
    Unavailable,
}

/// JSON-RPC transport answering from scripted responses.
///
/// Queued responses for a method are consumed in order; once the queue is
/// empty the sticky response set with [`ScriptedTransport::set`] is used.
/// Unscripted methods fail with [`ChainError::Unavailable`].
#[derive(Default)]
pub struct ScriptedTransport {
    queued: DashMap<String, VecDeque<Scripted>>,
    sticky: DashMap<String, Value>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, method: &str, result: Value) -> &Self {
        self.sticky.insert(method.to_owned(), result);
        self
    }

    pub fn push(&self, method: &str, result: Value) -> &Self {
        self.enqueue(method, Scripted::Result(result))
    }

    pub fn push_rpc_error(&self, method: &str, code: i64, message: &str) -> &Self {
        self.enqueue(method, Scripted::RpcError(code, message.to_owned()))
    }

    pub fn push_unavailable(&self, method: &str) -> &Self {
        self.enqueue(method, Scripted::Unavailable)
    }

    fn enqueue(&self, method: &str, response: Scripted) -> &Self {
        self.queued
            .entry(method.to_owned())
            .or_default()
            .push_back(response);
        self
    }

    /// All requests seen so far, in order.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }

    /// The last raw transaction passed to `eth_sendRawTransaction`.
    pub fn last_raw_transaction(&self) -> Option<Vec<u8>> {
        self.calls()
            .into_iter()
            .rev()
            .find(|(m, _)| m == "eth_sendRawTransaction")
            .and_then(|(_, params)| {
                let raw = params.get(0)?.as_str()?;
                hex::decode(raw.trim_start_matches("0x")).ok()
            })
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn request(&self, method: &str, params: Value) -> ChainResult<Value> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((method.to_owned(), params));

        let queued = self
            .queued
            .get_mut(method)
            .and_then(|mut queue| queue.pop_front());
        match queued {
            Some(Scripted::Result(value)) => Ok(value),
            Some(Scripted::RpcError(code, message)) => Err(ChainError::Rpc { code, message }),
            Some(Scripted::Unavailable) => Err(ChainError::Unavailable(method.to_owned())),
            None => self
                .sticky
                .get(method)
                .map(|v| v.clone())
                .ok_or_else(|| ChainError::Unavailable(format!("no response scripted for {method}"))),
        }
    }
}

/// A mined, successful receipt in JSON-RPC form.
pub fn receipt_json(hash: B256, success: bool) -> Value {
    serde_json::json!({
        "transactionHash": hash,
        "status": if success { "0x1" } else { "0x0" },
        "blockNumber": "0x10",
    })
}
