use w3drive_core::blob::{BLOB_CAPACITY, decode_blobs, encode_blobs};
use w3drive_core::{ChunkPlan, MAX_BLOBS_PER_TX};

/// Deterministic pseudo-random bytes whose last byte is never zero.
fn sample(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    let mut out: Vec<u8> = (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 56) as u8
        })
        .collect();
    if let Some(last) = out.last_mut()
        && *last == 0
    {
        *last = 1;
    }
    out
}

#[test]
fn roundtrip_for_lengths_around_stride_and_blob_boundaries() {
    let lengths = [
        1,
        30,
        31,
        32,
        62,
        4095 * 31,
        BLOB_CAPACITY - 1,
        BLOB_CAPACITY,
        BLOB_CAPACITY + 1,
        2 * BLOB_CAPACITY + 31,
    ];
    for (seed, len) in lengths.into_iter().enumerate() {
        let data = sample(len, seed as u64);
        let blobs = encode_blobs(&data).expect("encode");
        assert_eq!(blobs.len(), len.div_ceil(BLOB_CAPACITY));
        assert_eq!(decode_blobs(&blobs).expect("decode"), data, "len {len}");
    }
}

#[test]
fn trailing_zero_payload_is_lost_on_decode() {
    let data = vec![1, 2, 3, 0, 0];
    let blobs = encode_blobs(&data).unwrap();
    assert_eq!(decode_blobs(&blobs).unwrap(), vec![1, 2, 3]);
}

#[test]
fn batches_follow_blob_count() {
    let two = ChunkPlan::new(sample(BLOB_CAPACITY + 10, 1).into(), 1).unwrap();
    let batches: Vec<_> = two.batches(MAX_BLOBS_PER_TX).collect();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);

    let four = ChunkPlan::new(sample(3 * BLOB_CAPACITY + 10, 2).into(), 1).unwrap();
    let sizes: Vec<usize> = four.batches(MAX_BLOBS_PER_TX).map(<[_]>::len).collect();
    assert_eq!(sizes, vec![3, 1]);
}
