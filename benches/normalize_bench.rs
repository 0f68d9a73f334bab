//! Benchmarks for the per-keystroke and per-unlock hot paths.
//!
//! `normalize_digits` runs on every keystroke in the CI field and
//! `fingerprint` runs on every PIN attempt, so both should stay far below a
//! frame budget on kiosk hardware.
//!
//! # Run Benchmarks
//!
//! ```sh
//! cargo bench --bench normalize_bench
//! cargo bench --bench normalize_bench -- normalize
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use guestgate_core::{Ci, Pin, fingerprint, normalize_digits};
use std::hint::black_box;

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for (name, input) in [
        ("plain", "12345678"),
        ("decorated", "1.234.567-8"),
        ("noisy", "ci: 1 . 2 3 4 . 5 6 7 - 8 (door 2)"),
    ] {
        group.bench_with_input(BenchmarkId::new("digits", name), input, |b, input| {
            b.iter(|| normalize_digits(black_box(input)))
        });
    }

    group.bench_function("ci_parse", |b| {
        b.iter(|| Ci::parse(black_box("1.234.567-8")))
    });

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    group.bench_function("raw", |b| b.iter(|| fingerprint(black_box("4821"))));

    let stored = fingerprint("48213377");
    group.bench_function("pin_attempt", |b| {
        b.iter(|| {
            let pin = Pin::parse(black_box("4821-3377")).unwrap();
            pin.fingerprint() == stored
        })
    });

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_fingerprint);
criterion_main!(benches);
