//! Virtual file engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kvfile_core::{OpenMode, VirtualFile, Whence, PAGE_SIZE};
use kvfile_storage::MemoryStore;

/// Create patterned content of the given size.
fn patterned_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Benchmark whole-file writes across page counts.
fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_write");

    for pages in [1usize, 4, 16].iter() {
        let size = pages * PAGE_SIZE as usize + 17;
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pages), &size, |b, &size| {
            let content = patterned_content(size);

            b.iter(|| {
                let store = MemoryStore::new();
                let mut file =
                    VirtualFile::open(Box::new(store), "bench", OpenMode::ReadWrite).unwrap();
                file.write(black_box(&content), 1).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark full-file reads across page counts.
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_read");

    for pages in [1usize, 4, 16].iter() {
        let size = pages * PAGE_SIZE as usize + 17;
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pages), &size, |b, &size| {
            let store = MemoryStore::new();
            let content = patterned_content(size);
            let mut file =
                VirtualFile::open(Box::new(store), "bench", OpenMode::ReadWrite).unwrap();
            file.write(&content, 1).unwrap();

            b.iter(|| {
                file.seek(0, Whence::Start).unwrap();
                let bytes = file.read(black_box(1), black_box(size)).unwrap();
                black_box(bytes);
            });
        });
    }

    group.finish();
}

/// Benchmark seek/tell, which never touch the store.
fn bench_seek(c: &mut Criterion) {
    let store = MemoryStore::new();
    let mut file = VirtualFile::open(Box::new(store), "bench", OpenMode::ReadWrite).unwrap();
    file.write(&patterned_content(4 * PAGE_SIZE as usize), 1)
        .unwrap();

    c.bench_function("engine_seek_tell", |b| {
        b.iter(|| {
            file.seek(black_box(3 * i64::from(PAGE_SIZE) + 11), Whence::Start)
                .unwrap();
            black_box(file.tell());
        });
    });
}

criterion_group!(benches, bench_write, bench_read, bench_seek);
criterion_main!(benches);
