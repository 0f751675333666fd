//! Typed call surface of the storage contract.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use w3drive_core::Hash;

use crate::error::ChainResult;
use crate::node::NodeClient;
use crate::types::ChainReceipt;
use crate::writer::TransactionSender;

sol! {
    interface IFileStorage {
        function createSession(address addr, bytes memory iv, bytes memory encrypt) external;
        function getSession() external view returns (address addr, bytes memory iv, bytes memory encrypt);
        function upfrontPayment() external view returns (uint256);
        function writeChunk(address author, bytes memory name, bytes memory fileType, uint256[] memory chunkIds, uint256[] memory sizes) external payable;
        function remove(address author, bytes memory name) external returns (uint256);
        function removes(address author, bytes[] memory names) external;
        function countChunks(address author, bytes memory name) external view returns (uint256);
        function getChunkHash(address author, bytes memory name, uint256 chunkId) external view returns (bytes32);
        function getAuthorFiles(address author) external view returns (uint256[] memory times, bytes[] memory names, bytes[] memory types, string[] memory urls);
    }
}

/// Session record as stored on-chain for the calling account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OnChainSession {
    pub address: Address,
    pub iv: Bytes,
    pub encrypted: Bytes,
}

impl OnChainSession {
    /// An empty IV is the contract's "no session registered" sentinel.
    pub fn is_registered(&self) -> bool {
        !self.iv.is_empty()
    }
}

/// One entry of `getAuthorFiles`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorFile {
    /// Upload time, unix seconds.
    pub time: u64,
    pub name: Bytes,
    pub file_type: Bytes,
    pub url: String,
}

/// One method per storage contract function. `writeChunk` is not here: it
/// travels inside a blob transaction, see [`encode_write_chunk`].
#[async_trait]
pub trait FileContract: Send + Sync {
    /// Address of the contract.
    fn address(&self) -> Address;

    async fn create_session(
        &self,
        addr: Address,
        iv: Bytes,
        encrypted: Bytes,
    ) -> ChainResult<ChainReceipt>;

    async fn get_session(&self) -> ChainResult<OnChainSession>;

    async fn upfront_payment(&self) -> ChainResult<U256>;

    async fn remove(&self, author: Address, name: &[u8]) -> ChainResult<ChainReceipt>;

    async fn removes(&self, author: Address, names: &[Vec<u8>]) -> ChainResult<ChainReceipt>;

    async fn count_chunks(&self, author: Address, name: &[u8]) -> ChainResult<u64>;

    /// The stored chunk hash, or [`Hash::ZERO`] if the chunk is absent.
    async fn get_chunk_hash(&self, author: Address, name: &[u8], chunk_index: u64)
    -> ChainResult<Hash>;

    async fn get_author_files(&self, author: Address) -> ChainResult<Vec<AuthorFile>>;
}

/// ABI-encoded `writeChunk` call data.
pub fn encode_write_chunk(
    author: Address,
    name: &[u8],
    file_type: &[u8],
    chunk_ids: &[u64],
    sizes: &[u64],
) -> Bytes {
    IFileStorage::writeChunkCall {
        author,
        name: Bytes::copy_from_slice(name),
        fileType: Bytes::copy_from_slice(file_type),
        chunkIds: chunk_ids.iter().map(|&i| U256::from(i)).collect(),
        sizes: sizes.iter().map(|&s| U256::from(s)).collect(),
    }
    .abi_encode()
    .into()
}

/// [`FileContract`] over JSON-RPC. Reads go through `eth_call` with the
/// sender as `from`; writes go through the sender.
pub struct RpcFileContract {
    node: NodeClient,
    address: Address,
    sender: Arc<dyn TransactionSender>,
}

impl RpcFileContract {
    pub fn new(node: NodeClient, address: Address, sender: Arc<dyn TransactionSender>) -> Self {
        Self {
            node,
            address,
            sender,
        }
    }

    async fn read<C: SolCall + Send>(&self, call: C) -> ChainResult<C::Return> {
        let data: Bytes = call.abi_encode().into();
        let ret = self
            .node
            .call(Some(self.sender.address()), self.address, &data)
            .await?;
        Ok(C::abi_decode_returns(&ret)?)
    }

    async fn write<C: SolCall + Send>(&self, call: C) -> ChainResult<ChainReceipt> {
        tracing::debug!(function = C::SIGNATURE, "sending contract call");
        self.sender
            .send_call(self.address, call.abi_encode().into(), U256::ZERO)
            .await
    }
}

#[async_trait]
impl FileContract for RpcFileContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn create_session(
        &self,
        addr: Address,
        iv: Bytes,
        encrypted: Bytes,
    ) -> ChainResult<ChainReceipt> {
        self.write(IFileStorage::createSessionCall {
            addr,
            iv,
            encrypt: encrypted,
        })
        .await
    }

    async fn get_session(&self) -> ChainResult<OnChainSession> {
        let ret = self.read(IFileStorage::getSessionCall {}).await?;
        Ok(OnChainSession {
            address: ret.addr,
            iv: ret.iv,
            encrypted: ret.encrypt,
        })
    }

    async fn upfront_payment(&self) -> ChainResult<U256> {
        self.read(IFileStorage::upfrontPaymentCall {}).await
    }

    async fn remove(&self, author: Address, name: &[u8]) -> ChainResult<ChainReceipt> {
        self.write(IFileStorage::removeCall {
            author,
            name: Bytes::copy_from_slice(name),
        })
        .await
    }

    async fn removes(&self, author: Address, names: &[Vec<u8>]) -> ChainResult<ChainReceipt> {
        self.write(IFileStorage::removesCall {
            author,
            names: names.iter().map(|n| Bytes::copy_from_slice(n)).collect(),
        })
        .await
    }

    async fn count_chunks(&self, author: Address, name: &[u8]) -> ChainResult<u64> {
        let count = self
            .read(IFileStorage::countChunksCall {
                author,
                name: Bytes::copy_from_slice(name),
            })
            .await?;
        Ok(count.saturating_to())
    }

    async fn get_chunk_hash(
        &self,
        author: Address,
        name: &[u8],
        chunk_index: u64,
    ) -> ChainResult<Hash> {
        let hash = self
            .read(IFileStorage::getChunkHashCall {
                author,
                name: Bytes::copy_from_slice(name),
                chunkId: U256::from(chunk_index),
            })
            .await?;
        Ok(hash.into())
    }

    async fn get_author_files(&self, author: Address) -> ChainResult<Vec<AuthorFile>> {
        let ret = self
            .read(IFileStorage::getAuthorFilesCall { author })
            .await?;
        Ok(ret
            .times
            .into_iter()
            .zip(ret.names)
            .zip(ret.types)
            .zip(ret.urls)
            .map(|(((time, name), file_type), url)| AuthorFile {
                time: time.saturating_to(),
                name,
                file_type,
                url,
            })
            .collect())
    }
}
