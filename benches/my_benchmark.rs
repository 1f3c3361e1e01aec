use coltab::{
    Aggregation, AggregationRegistry, Clause, ColumnData, DistinctConfig, DistinctStrategy, Filter,
    GroupByConfig, NewTableConfig, Operator, Order, Table,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::collections::HashMap;
use std::hint::black_box;

fn setup_table(n: usize) -> Table {
    let data = HashMap::from([
        ("id".to_string(), ColumnData::Int((0..n as i64).collect())),
        (
            "age".to_string(),
            ColumnData::Int((0..n).map(|i| (i % 100) as i64).collect()),
        ),
        (
            "score".to_string(),
            ColumnData::Float(
                (0..n)
                    .map(|i| if i % 17 == 0 { f64::NAN } else { (i % 1000) as f64 / 10.0 })
                    .collect(),
            ),
        ),
        (
            "name".to_string(),
            ColumnData::String((0..n).map(|i| format!("user{}", i % 5000)).collect()),
        ),
        (
            "city".to_string(),
            ColumnData::String((0..n).map(|i| format!("city{}", i % 40)).collect()),
        ),
        (
            "active".to_string(),
            ColumnData::Bool((0..n).map(|i| i % 2 == 0).collect()),
        ),
    ]);
    Table::new(data, NewTableConfig::new().enum_column("city"))
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("Filter_Performance");

    for n in [10000, 100000].iter() {
        let table = setup_table(*n);
        group.bench_with_input(BenchmarkId::new("int_eq", n), n, |b, _| {
            b.iter(|| black_box(table.filter(Filter::new("age", Operator::Eq, 42))));
        });
        group.bench_with_input(BenchmarkId::new("enum_like", n), n, |b, _| {
            b.iter(|| black_box(table.filter(Filter::new("city", Operator::Like, "city1%"))));
        });
        group.bench_with_input(BenchmarkId::new("string_like", n), n, |b, _| {
            b.iter(|| black_box(table.filter(Filter::new("name", Operator::Like, "user1%"))));
        });
        group.bench_with_input(BenchmarkId::new("or_not", n), n, |b, _| {
            let clause = Clause::or([
                Filter::new("age", Operator::Lt, 10).into(),
                Clause::not(Filter::new("score", Operator::Gte, 5.0)),
            ]);
            b.iter(|| black_box(table.filter(clause.clone())));
        });
    }
    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sort_Performance");

    for n in [10000, 100000].iter() {
        let table = setup_table(*n);
        group.bench_with_input(BenchmarkId::new("two_keys", n), n, |b, _| {
            let orders = [Order::asc("city"), Order::desc("score")];
            b.iter(|| black_box(table.sort(&orders)));
        });
        group.bench_with_input(BenchmarkId::new("string_key", n), n, |b, _| {
            let orders = [Order::asc("name")];
            b.iter(|| black_box(table.sort(&orders)));
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("GroupBy_Performance");
    let registry = AggregationRegistry::default();

    for n in [10000, 100000].iter() {
        let table = setup_table(*n);
        group.bench_with_input(BenchmarkId::new("sum_by_city_age", n), n, |b, _| {
            b.iter(|| {
                let result = table
                    .group_by(GroupByConfig::new().columns(["city", "age"]))
                    .aggregate(&[Aggregation::new("sum", "score")], &registry);
                black_box(result);
            });
        });
    }
    group.finish();
}

fn bench_distinct(c: &mut Criterion) {
    let mut group = c.benchmark_group("Distinct_Performance");

    for n in [10000, 100000].iter() {
        let table = setup_table(*n);
        for strategy in [DistinctStrategy::Sort, DistinctStrategy::Hash] {
            let id = BenchmarkId::new(format!("{strategy:?}"), n);
            group.bench_with_input(id, n, |b, _| {
                let config = DistinctConfig::new()
                    .columns(["name", "city"])
                    .strategy(strategy);
                b.iter(|| black_box(table.distinct(config.clone())));
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_filter,
    bench_sort,
    bench_group_by,
    bench_distinct
);
criterion_main!(benches);
