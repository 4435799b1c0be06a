use std::collections::HashSet;

use chrono::{Duration, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use procura_core::{ProductId, SaleId};
use procura_replenishment::{ProductSnapshot, ReplenishmentCalculator, SaleLine, SaleSnapshot};

fn catalog(size: usize) -> (Vec<ProductSnapshot>, Vec<SaleSnapshot>) {
    let now = Utc::now();
    let products: Vec<ProductSnapshot> = (0..size)
        .map(|i| {
            ProductSnapshot::new(ProductId::new())
                .with_stock((i % 50) as i64)
                .with_reorder_point(20)
                .with_lead_time_days((i % 21) as i64)
                .with_unit_cost(1_250)
        })
        .collect();

    // Ten sales per product spread over 45 days (a third fall outside the window).
    let sales = products
        .iter()
        .flat_map(|p| {
            (0..10).map(move |k| {
                SaleSnapshot::new(
                    SaleId::new(),
                    now - Duration::days(k * 4 + 1),
                    vec![SaleLine::new(p.product_id, 1 + k)],
                )
            })
        })
        .collect();

    (products, sales)
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("replenishment_compute");
    let calculator = ReplenishmentCalculator::default();
    let pending: HashSet<ProductId> = HashSet::new();

    for size in [100usize, 1_000, 10_000] {
        let (products, sales) = catalog(size);
        let as_of = Utc::now();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                black_box(calculator.compute(
                    black_box(&products),
                    black_box(&sales),
                    &pending,
                    as_of,
                ))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute);
criterion_main!(benches);
