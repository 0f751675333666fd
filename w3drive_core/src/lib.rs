//! Core w3drive types.
//!
//! ## Wire-stable
//!
//! - Content hashes (`hash::Hash`, keccak-256), compared against the storage
//!   contract's `getChunkHash`
//! - The blob layout (`blob`): 4096 field elements of 32 bytes, first byte of
//!   each element reserved as zero padding
//!
//! ## Helpers
//!
//! - Chunk planning and batching (`chunk::ChunkPlan`)

pub mod blob;
pub mod chunk;
pub mod hash;

pub use blob::{BLOB_CAPACITY, BLOB_SIZE, Blob, CodecError};
pub use chunk::{ChunkPlan, FileChunk, MAX_BLOBS_PER_TX};
pub use hash::Hash;
