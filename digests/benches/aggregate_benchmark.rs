use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use digests::{Algorithm, MultiDigest, StreamChunker};

const SIZE: usize = 8 * 1024 * 1024;

fn sample() -> Vec<u8> {
    let mut state = 0x1234_5678u32;
    (0..SIZE)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

fn bench_all_algorithms(c: &mut Criterion) {
    let data = sample();
    let mut pool = MultiDigest::new(&Algorithm::ALL).unwrap();

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Bytes(SIZE as u64));
    group.sample_size(10);
    group.bench_function("all_algorithms_1mib_chunks", |b| {
        b.iter(|| {
            let chunker = StreamChunker::new(data.as_slice(), 1024 * 1024).unwrap();
            pool.run(chunker, |_, _| {}).unwrap()
        })
    });
    group.finish();
}

fn bench_single_algorithm(c: &mut Criterion) {
    let data = sample();

    let mut group = c.benchmark_group("single");
    group.throughput(Throughput::Bytes(SIZE as u64));
    group.sample_size(10);
    for algorithm in [Algorithm::Crc32, Algorithm::Sha256, Algorithm::SpamSum] {
        let mut pool = MultiDigest::new(&[algorithm]).unwrap();
        group.bench_function(algorithm.key(), |b| {
            b.iter(|| {
                let chunker = StreamChunker::new(data.as_slice(), 1024 * 1024).unwrap();
                pool.run(chunker, |_, _| {}).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_all_algorithms, bench_single_algorithm);
criterion_main!(benches);
