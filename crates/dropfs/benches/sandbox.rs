//! Benchmarks for path resolution and command dispatch.
//!
//! Resolution runs on every operation, so its cost sets the floor for
//! everything else. Dispatch measures a full `ls`/`cat` round trip.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dropfs_core::Limits;
use dropfs_sandbox::SandboxFs;
use dropfs_shell::CommandDispatcher;
use std::sync::Arc;
use tempfile::tempdir;

/// Create `count` files spread over ten directories.
fn populate(root: &std::path::Path, count: usize) {
    for i in 0..count {
        let dir = root.join(format!("dir_{}", i % 10));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("file_{i}.txt")), format!("line {i}\n")).unwrap();
    }
}

fn resolve_benchmark(c: &mut Criterion) {
    let temp_dir = tempdir().unwrap();
    populate(temp_dir.path(), 100);
    let store = SandboxFs::open(temp_dir.path(), Limits::default()).unwrap();
    let resolver = store.engine().resolver();

    let mut group = c.benchmark_group("resolve");

    for path in ["dir_3/file_3.txt", "dir_3/./../dir_3/file_3.txt", "new/deep/nested/file.txt"] {
        group.bench_with_input(BenchmarkId::new("inside", path), path, |b, path| {
            b.iter(|| black_box(resolver.resolve(path)));
        });
    }

    group.bench_function("lexical_escape", |b| {
        b.iter(|| black_box(resolver.resolve("dir_3/../../../etc/passwd")));
    });

    group.finish();
}

fn dispatch_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("dispatch");

    for file_count in &[10, 100, 1_000] {
        // Skip large benchmarks in CI
        if *file_count > 100 && std::env::var("CI").is_ok() {
            continue;
        }

        let temp_dir = tempdir().unwrap();
        populate(temp_dir.path(), *file_count);
        let store = SandboxFs::open(temp_dir.path(), Limits::default()).unwrap();
        let dispatcher = Arc::new(CommandDispatcher::new(Arc::new(store)));

        group.bench_with_input(
            BenchmarkId::new("ls", format!("{file_count}_files")),
            file_count,
            |b, _| {
                b.to_async(&rt).iter(|| {
                    let dispatcher = dispatcher.clone();
                    async move { black_box(dispatcher.run("ls dir_0").await) }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("cat", format!("{file_count}_files")),
            file_count,
            |b, _| {
                b.to_async(&rt).iter(|| {
                    let dispatcher = dispatcher.clone();
                    async move { black_box(dispatcher.run("cat dir_1/file_1.txt").await) }
                });
            },
        );
    }

    group.bench_function("unknown_verb", |b| {
        let temp_dir = tempdir().unwrap();
        let store = SandboxFs::open(temp_dir.path(), Limits::default()).unwrap();
        let dispatcher = Arc::new(CommandDispatcher::new(Arc::new(store)));
        b.to_async(&rt).iter(|| {
            let dispatcher = dispatcher.clone();
            async move { black_box(dispatcher.run("chmod 777 file").await) }
        });
    });

    group.finish();
}

criterion_group!(benches, resolve_benchmark, dispatch_benchmark);
criterion_main!(benches);
