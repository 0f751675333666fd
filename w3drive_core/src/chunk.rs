//! Splitting a file into content-addressed chunks, one blob per chunk.
//!
//! Chunk boundaries depend only on the file size and the maximum chunk
//! length, never on content, so re-planning the same file is deterministic.

use bytes::Bytes;

use crate::Hash;
use crate::blob::{BLOB_CAPACITY, Blob, CodecError, encode_blobs};

/// Blobs submitted in one transaction at most.
pub const MAX_BLOBS_PER_TX: usize = 3;

/// A contiguous byte range of the source file and its keccak-256 hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileChunk {
    pub index: u64,
    pub data: Bytes,
    pub hash: Hash,
}

impl FileChunk {
    pub fn new(index: u64, data: Bytes) -> Self {
        let hash = Hash::new(&data);
        Self { index, data, hash }
    }

    /// True (unpadded) byte length of the chunk.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encodes the chunk into its single blob.
    pub fn to_blob(&self) -> Result<Blob, CodecError> {
        let mut blobs = encode_blobs(&self.data)?;
        match (blobs.pop(), blobs.is_empty()) {
            (Some(blob), true) => Ok(blob),
            _ => Err(CodecError::InvalidInput("chunk exceeds blob capacity")),
        }
    }
}

/// The deterministic chunk layout of one file.
#[derive(Clone, Debug)]
pub struct ChunkPlan {
    chunks: Vec<FileChunk>,
    chunk_len: usize,
    file_size: u64,
}

impl ChunkPlan {
    /// Plans the chunks of `content`.
    ///
    /// `max_chunk_len` caps the payload of each chunk. Values of 0 or 1 turn
    /// client-side pre-chunking off and values above the blob capacity are
    /// clamped to it, so every chunk always fits in one blob.
    pub fn new(content: Bytes, max_chunk_len: usize) -> Result<Self, CodecError> {
        if content.is_empty() {
            return Err(CodecError::InvalidInput("cannot plan an empty file"));
        }
        let chunk_len = Self::effective_chunk_len(max_chunk_len);
        let file_size = content.len() as u64;

        let mut chunks = Vec::with_capacity(content.len().div_ceil(chunk_len));
        let mut offset = 0;
        while offset < content.len() {
            let end = usize::min(offset + chunk_len, content.len());
            chunks.push(FileChunk::new(
                chunks.len() as u64,
                content.slice(offset..end),
            ));
            offset = end;
        }

        Ok(Self {
            chunks,
            chunk_len,
            file_size,
        })
    }

    pub fn effective_chunk_len(max_chunk_len: usize) -> usize {
        if max_chunk_len <= 1 {
            BLOB_CAPACITY
        } else {
            max_chunk_len.min(BLOB_CAPACITY)
        }
    }

    pub fn chunks(&self) -> &[FileChunk] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Groups chunks into batches of at most `max_per_batch`, in ascending
    /// chunk-index order. `max_per_batch` is clamped to `1..=MAX_BLOBS_PER_TX`.
    pub fn batches(&self, max_per_batch: usize) -> std::slice::Chunks<'_, FileChunk> {
        self.chunks.chunks(max_per_batch.clamp(1, MAX_BLOBS_PER_TX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(len: usize) -> Bytes {
        Bytes::from((0..len).map(|i| (i % 13) as u8 + 1).collect::<Vec<_>>())
    }

    #[test]
    fn test_empty_file_is_rejected() {
        assert!(ChunkPlan::new(Bytes::new(), 1).is_err());
    }

    #[test]
    fn test_no_prechunking_uses_blob_capacity() {
        let plan = ChunkPlan::new(content(200_000), 1).unwrap();
        assert_eq!(plan.chunk_count(), 2);
        assert_eq!(plan.chunks()[0].len(), 126_976);
        assert_eq!(plan.chunks()[1].len(), 73_024);
        assert_eq!(plan.batches(MAX_BLOBS_PER_TX).count(), 1);
    }

    #[test]
    fn test_four_chunks_make_two_batches() {
        let plan = ChunkPlan::new(content(3 * BLOB_CAPACITY + 1), 0).unwrap();
        let sizes: Vec<usize> = plan.batches(MAX_BLOBS_PER_TX).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 1]);
    }

    #[test]
    fn test_batch_size_is_clamped() {
        let plan = ChunkPlan::new(content(4 * BLOB_CAPACITY + 1), 0).unwrap();
        let sizes: Vec<usize> = plan.batches(6).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 2]);
        let sizes: Vec<usize> = plan.batches(0).map(|b| b.len()).collect();
        assert_eq!(sizes, vec![1; 5]);
    }

    #[test]
    fn test_max_chunk_len_is_respected_and_clamped() {
        let plan = ChunkPlan::new(content(1000), 300).unwrap();
        let lens: Vec<usize> = plan.chunks().iter().map(FileChunk::len).collect();
        assert_eq!(lens, vec![300, 300, 300, 100]);

        assert_eq!(ChunkPlan::effective_chunk_len(usize::MAX), BLOB_CAPACITY);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let a = ChunkPlan::new(content(300_000), 1).unwrap();
        let b = ChunkPlan::new(content(300_000), 1).unwrap();
        assert_eq!(a.chunks(), b.chunks());
        let indices: Vec<u64> = a.chunks().iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_chunk_hash_is_keccak_of_raw_bytes() {
        let plan = ChunkPlan::new(content(10), 1).unwrap();
        let chunk = &plan.chunks()[0];
        assert_eq!(chunk.hash, Hash::new(&chunk.data));
        assert!(chunk.to_blob().is_ok());
    }
}
