//! Benchmarks for response classification.
//!
//! Measures `classify` over a realistic mixed batch (agent text plus
//! structured strategy/transaction/vault records) and over a batch made
//! mostly of records that get dropped.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use optimal_chat::protocol::{RawResponseRecord, ResponseAction, ResponseContent};
use optimal_chat::replayer::{ConversationScript, ScriptTurn};
use optimal_chat::classify;

/// Demo script records repeated to `len` entries.
fn mixed_batch(len: usize) -> Vec<RawResponseRecord> {
    let script = ConversationScript::demo();
    let records: Vec<_> = script.turns().iter().filter_map(ScriptTurn::to_record).collect();
    records.iter().cycle().take(len).cloned().collect()
}

/// Batch where every other record is unknown or unsuccessful.
fn dropped_batch(len: usize) -> Vec<RawResponseRecord> {
    (0..len)
        .map(|i| match i % 3 {
            0 => RawResponseRecord::new("a", ResponseAction::from("CONTINUE"), "", ResponseContent::succeeded()),
            1 => RawResponseRecord::new("a", ResponseAction::Transaction, "", ResponseContent::failed()),
            _ => RawResponseRecord::agent_text("a", format!("reply {}", i)),
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let small = mixed_batch(8);
    let large = mixed_batch(1000);
    let dropped = dropped_batch(1000);

    let mut group = c.benchmark_group("classify");

    group.bench_function("mixed_batch_8", |b| b.iter(|| classify(black_box(&small))));
    group.bench_function("mixed_batch_1000", |b| b.iter(|| classify(black_box(&large))));
    group.bench_function("mostly_dropped_1000", |b| {
        b.iter(|| classify(black_box(&dropped)))
    });

    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
