use criterion::{Criterion, criterion_group, criterion_main};
use w3drive_core::blob::{decode_blobs, encode_blobs};

fn bench_encode(c: &mut Criterion) {
    let small = vec![7u8; 4 * 1024];
    let large = vec![7u8; 1024 * 1024];

    let mut group = c.benchmark_group("blob_codec_encode");
    group.bench_function("encode_4k", |b| {
        b.iter(|| encode_blobs(&small).unwrap());
    });
    group.bench_function("encode_1mb", |b| {
        b.iter(|| encode_blobs(&large).unwrap());
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let blobs = encode_blobs(&vec![7u8; 1024 * 1024]).unwrap();

    c.bench_function("decode_1mb", |b| {
        b.iter(|| decode_blobs(&blobs).unwrap());
    });
}

criterion_group!(blob_codec, bench_encode, bench_decode);
criterion_main!(blob_codec);
