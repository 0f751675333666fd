//! Chain access for w3drive.
//!
//! - [`rpc`] and [`node`]: JSON-RPC transport and the typed node methods used
//!   by the client
//! - [`contract`]: the storage contract call surface
//! - [`tx`], [`builder`] and [`broadcaster`]: locally built, locally signed
//!   dynamic-fee and blob transactions
//! - [`proof`]: the remote KZG commitment/proof service
//! - [`writer`]: the write paths the session and upload layers depend on

pub mod broadcaster;
pub mod builder;
pub mod contract;
mod error;
pub mod node;
pub mod proof;
pub mod rpc;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod tx;
mod types;
pub mod wallet;
pub mod writer;

pub use broadcaster::{PollConfig, TransactionBroadcaster};
pub use builder::{BlobTransactionBuilder, DEFAULT_MAX_FEE_PER_BLOB_GAS, TxRequest};
pub use contract::{AuthorFile, FileContract, OnChainSession, RpcFileContract, encode_write_chunk};
pub use error::{ChainError, ChainResult};
pub use node::{BalanceReader, NodeClient};
pub use proof::{BlobProofs, DEFAULT_PROOF_SERVICE_URL, HttpProofService, ProofService};
pub use rpc::{HttpTransport, RpcTransport};
pub use types::{ChainReceipt, FeeSuggestion};
pub use wallet::{LocalWallet, TxSignature};
pub use writer::{BlobSubmitter, ChainWriter, TransactionSender};

pub use alloy_primitives::{Address, B256, Bytes, U256};
