//! Line differ and replay benchmarks.
//!
//! Compares the greedy (first match) and LCS differs on synthetic text,
//! and measures full-chain replay through the in-memory store.
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench diff_strategies
//! # With a custom filter:
//! cargo bench --bench diff_strategies -- replay
//! ```

use std::fmt::Write as _;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use keyvc::chain::{CommitChain, CommitRecord};
use keyvc::reconstruct::last_cat;
use keyvc::store::MemoryStore;
use keyvc_core::model::{DiffStrategy, Key, encode};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `n` lines of source-like text; every tenth line repeats.
fn make_text(n: usize, seed: usize) -> String {
    let mut out = String::new();
    for i in 0..n {
        if i % 10 == 0 {
            out.push_str("}\n");
        } else {
            let _ = writeln!(out, "    let v{i} = compute({});", i * seed % 97);
        }
    }
    out
}

/// `text` with every seventh line rewritten.
fn edit_text(text: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i % 7 == 3 {
                format!("{line} // edited")
            } else {
                line.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Benchmark: diff
// ---------------------------------------------------------------------------

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    for &n in &[100_usize, 1_000] {
        let old = make_text(n, 3);
        let new = edit_text(&old);
        group.throughput(Throughput::Elements(n as u64));

        for strategy in [DiffStrategy::Greedy, DiffStrategy::Lcs] {
            group.bench_with_input(BenchmarkId::new(strategy.to_string(), n), &n, |b, _| {
                b.iter(|| strategy.differ().diff(&old, &new));
            });
        }
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: encoded size
// ---------------------------------------------------------------------------

/// Payload size per strategy (measured once, printed; not a timing benchmark).
fn bench_payload_size(c: &mut Criterion) {
    let old = make_text(1_000, 5);
    let new = edit_text(&old);
    for strategy in [DiffStrategy::Greedy, DiffStrategy::Lcs] {
        let bytes = encode(&strategy.differ().diff(&old, &new)).len();
        eprintln!("payload/{strategy}: {bytes} bytes");
    }
    c.bench_function("payload/encode-greedy", |b| {
        let script = DiffStrategy::Greedy.differ().diff(&old, &new);
        b.iter(|| encode(&script));
    });
}

// ---------------------------------------------------------------------------
// Benchmark: chain replay
// ---------------------------------------------------------------------------

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for &revisions in &[10_usize, 50] {
        let store = MemoryStore::new();
        let chain = CommitChain::live(&store);
        let key = Key::new("src/lib.rs").expect("valid key");

        let mut base = String::new();
        let mut text = make_text(300, 1);
        for ts in 0..revisions {
            let record = CommitRecord::text_snapshot(DiffStrategy::Greedy.differ(), &base, &text);
            chain.append(&key, &record, ts as u64 + 1).expect("append");
            base = text.clone();
            text = edit_text(&text);
        }

        group.throughput(Throughput::Elements(revisions as u64));
        group.bench_with_input(BenchmarkId::new("revisions", revisions), &revisions, |b, _| {
            b.iter(|| last_cat(&chain, &key).expect("replay"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_diff, bench_payload_size, bench_replay);
criterion_main!(benches);
