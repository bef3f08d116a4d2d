//! # LSIBC Algorithm Benchmarks
//!
//! Epoch workflows run inside block execution, so the per-chain math must
//! stay cheap as validator sets grow:
//!
//! | Algorithm | Target |
//! |-----------|--------|
//! | Undelegation allocation | < 100us for 200 validators |
//! | Rebalance moves | < 1ms for 200 validators |
//! | Weight redistribution | < 100us for 200 validators |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lsibc_core::{
    allocate_undelegation, generate_redelegations, redistribute_weight, Dec, Validator,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn validator_set(size: usize) -> Vec<Validator> {
    let mut rng = StdRng::seed_from_u64(size as u64);
    let weight = Dec::from_ratio(1, size as u128).unwrap_or(Dec::ONE);
    (0..size)
        .map(|i| {
            Validator::new(
                format!("val{}", i),
                rng.gen_range(1_000..10_000_000u128),
                weight,
            )
        })
        .collect()
}

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("undelegation-allocation");

    for size in [10, 50, 200] {
        let validators = validator_set(size);
        let total: u128 = validators.iter().map(|v| v.delegated_amount).sum::<u128>() / 3;

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("allocate", size), &validators, |b, vs| {
            b.iter(|| black_box(allocate_undelegation(vs, total)))
        });
    }
    group.finish();
}

fn bench_rebalance(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebalance");

    for size in [10, 50, 200] {
        let validators = validator_set(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("moves", size), &validators, |b, vs| {
            b.iter(|| black_box(generate_redelegations(vs, 0)))
        });
    }
    group.finish();
}

fn bench_redistribute(c: &mut Criterion) {
    let mut group = c.benchmark_group("weights");

    for size in [10, 50, 200] {
        let validators = validator_set(size);

        group.bench_with_input(BenchmarkId::new("redistribute", size), &validators, |b, vs| {
            b.iter(|| {
                let mut set = vs.clone();
                black_box(redistribute_weight(&mut set, "val0"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_allocation, bench_rebalance, bench_redistribute);
criterion_main!(benches);
