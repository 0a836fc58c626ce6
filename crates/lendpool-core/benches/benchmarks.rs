//! Lendpool Performance Benchmarks
//!
//! Hot paths of the lending core:
//! - Borrow quoting (utilization, rate, interest)
//! - Accrued value projection (annual and continuous)
//! - Full deposit/borrow units of work against in-memory collaborators

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use lendpool_common::{AccountId, CompoundingMode, PoolConfig, PoolLedger, SECONDS_PER_YEAR};
use lendpool_core::infra::{InMemoryAssetLedger, InMemoryPoolStore, ManualClock};
use lendpool_core::{quote_borrow, AccrualOracle, LendingPool, LinearRateCurve, PoolServices};

const SOL: u64 = 1_000_000_000;

// ============ QUOTE BENCHMARKS ============

fn bench_quote_borrow(c: &mut Criterion) {
    let mut group = c.benchmark_group("quote");

    let mut ledger = PoolLedger::new("sol".into(), "usdc".into(), "isol".into(), 0);
    ledger.total_deposited = 5 * SOL;

    for principal in [SOL / 10, 2_500_000_000, 3_465_000_000].iter() {
        group.bench_with_input(BenchmarkId::new("principal", principal), principal, |b, &p| {
            b.iter(|| quote_borrow(black_box(&ledger), &LinearRateCurve, black_box(p)))
        });
    }

    group.finish();
}

// ============ ACCRUAL BENCHMARKS ============

fn bench_accrued_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("accrual");

    let cases = [
        ("whole_year", SECONDS_PER_YEAR),
        ("half_year", SECONDS_PER_YEAR / 2),
        ("one_day", 86_400),
    ];

    for mode in [CompoundingMode::Annual, CompoundingMode::Continuous] {
        let oracle = AccrualOracle::new(mode);
        for (name, elapsed) in cases.iter() {
            group.bench_function(format!("{:?}/{}", mode, name), |b| {
                b.iter(|| {
                    oracle.accrued_value(black_box(5 * SOL), black_box(6930), black_box(*elapsed))
                })
            });
        }
    }

    group.finish();
}

// ============ UNIT OF WORK BENCHMARKS ============

fn bench_units_of_work(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit_of_work");
    group.measurement_time(Duration::from_secs(5));

    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = PoolConfig::default();
    let assets = Arc::new(InMemoryAssetLedger::new());
    assets.create_asset("sol".into(), None);
    assets.create_asset("usdc".into(), None);
    assets.create_asset("isol".into(), Some(config.mint_authority.clone()));

    let lender = AccountId::new("lender");
    assets.fund(&"sol".into(), &lender, u64::MAX / 2).unwrap();

    let services = PoolServices::new(
        assets.clone(),
        Arc::new(InMemoryPoolStore::new()),
        Arc::new(ManualClock::new(0)),
    );
    let pool = rt.block_on(async {
        let pool = LendingPool::initialize(
            config,
            services,
            "sol".into(),
            "usdc".into(),
            "isol".into(),
        )
        .await
        .unwrap();
        pool.register_depositor(&lender).await.unwrap();
        // Deep liquidity so unit-sized borrows never exhaust the pool
        pool.deposit(&lender, u64::MAX / 4).await.unwrap();
        pool
    });

    group.bench_function("deposit", |b| {
        b.iter(|| rt.block_on(pool.deposit(black_box(&lender), black_box(1))).unwrap())
    });

    // One loan per borrower, so every iteration gets a fresh funded account
    let next_borrower = AtomicU64::new(0);
    group.bench_function("borrow", |b| {
        b.iter_batched(
            || {
                let n = next_borrower.fetch_add(1, Ordering::Relaxed);
                let borrower = AccountId::new(format!("borrower-{}", n));
                assets.fund(&"usdc".into(), &borrower, 1).unwrap();
                borrower
            },
            |borrower| rt.block_on(pool.borrow(black_box(&borrower), 1, 1)).unwrap(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(quote, bench_quote_borrow);

criterion_group!(accrual, bench_accrued_value);

criterion_group!(unit_of_work, bench_units_of_work);

criterion_main!(quote, accrual, unit_of_work);
