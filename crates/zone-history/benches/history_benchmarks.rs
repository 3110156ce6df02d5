//! Command log throughput.
//!
//! Measures recording, and a full undo/redo sweep over a long history.
//!
//! Run with: `cargo bench --bench history_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use zone_history::CommandLog;

fn filled_log(entries: usize) -> (CommandLog<Vec<u32>>, Vec<u32>) {
    let mut log = CommandLog::new();
    let mut target = Vec::with_capacity(entries);
    for i in 0..entries as u32 {
        target.push(i);
        log.record_fn(
            |t: &mut Vec<u32>| {
                t.pop();
            },
            move |t: &mut Vec<u32>| t.push(i),
            "push",
        );
    }
    (log, target)
}

fn bench_record(c: &mut Criterion) {
    c.bench_function("record_1000", |b| {
        b.iter(|| {
            let (log, target) = filled_log(1_000);
            black_box((log.len(), target.len()));
        });
    });
}

fn bench_undo_redo_sweep(c: &mut Criterion) {
    let (mut log, mut target) = filled_log(1_000);

    c.bench_function("undo_redo_sweep_1000", |b| {
        b.iter(|| {
            while log.undo(&mut target) {}
            while log.redo(&mut target) {}
            black_box(target.len());
        });
    });
}

criterion_group!(benches, bench_record, bench_undo_redo_sweep);
criterion_main!(benches);
