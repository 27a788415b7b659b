//! Loader throughput benchmarks
//!
//! Measures a full load (parse, validate, normalize, deliver) from memory
//! for collections at and below the default game limit.
//!
//! Run: cargo bench --bench load_throughput

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use octoarcade::services::normalize_game;
use octoarcade::{ConfigurationLoader, LoaderSettings, MemorySource};
use serde_json::{Value, json};
use std::hint::black_box;

fn game(i: usize) -> Value {
    json!({
        "id": format!("game_{i}"),
        "name": format!("Arcade Game {i}"),
        "genre": ["Action", "Puzzle", "Shooter", "Racing"][i % 4],
        "year": 1980 + (i % 20),
        "players": 1 + (i % 4),
        "description": "A classic arcade title",
        "controls": { "move": "joystick", "fire": "button A" },
        "screenshot": "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk",
        "rom": "UEsDBBQAAAAIAAAAIQA"
    })
}

fn document(count: usize) -> String {
    let games: Vec<Value> = (0..count).map(game).collect();
    json!({
        "name": "Benchmark Cabinet",
        "version": "1.0.0",
        "games": games
    })
    .to_string()
}

fn bench_full_load(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let loader = ConfigurationLoader::new(LoaderSettings {
        yield_delay_ms: 0,
        ..LoaderSettings::default()
    });

    let mut group = c.benchmark_group("full_load");
    for count in [75usize, 250, 1000] {
        let source = MemorySource::new("bench.json", document(count));
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &source, |b, source| {
            b.iter(|| {
                let result = runtime
                    .block_on(loader.load(source, |_, _| {}, |chunk, _, _| {
                        black_box(chunk.len());
                    }))
                    .unwrap();
                black_box(result.total_games)
            })
        });
    }
    group.finish();
}

fn bench_normalize_entry(c: &mut Criterion) {
    let entry = game(7);
    let sparse = json!({ "name": 1942 });

    c.bench_function("normalize_full_entry", |b| {
        b.iter(|| normalize_game(black_box(&entry), 7, 0).unwrap())
    });
    c.bench_function("normalize_sparse_entry", |b| {
        b.iter(|| normalize_game(black_box(&sparse), 3, 0).unwrap())
    });
}

criterion_group!(benches, bench_full_load, bench_normalize_entry);
criterion_main!(benches);
