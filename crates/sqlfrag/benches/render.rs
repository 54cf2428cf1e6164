use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlfrag::{Fragment, and, comma, ident, sql};

/// Build a fragment with `n` columns and `n` bound conditions:
/// SELECT col0, col1, ... FROM t WHERE col0 = $1 AND col1 = $2 ...
fn build_select(n: usize) -> Fragment {
    let cols = comma((0..n).map(|i| ident(&format!("col{i}")).unwrap()));
    let conds = and((0..n).map(|i| {
        let col = ident(&format!("col{i}")).unwrap();
        sql!("" {col} " = " {i as i64})
    }));
    sql!("SELECT " {cols} " FROM t WHERE " {conds})
}

fn bench_first_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/first_query");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || build_select(n),
                |f| black_box(f.query().len()),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_memoized_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/values");

    for n in [1, 10, 100] {
        let f = build_select(n);
        let _ = f.query();
        group.bench_with_input(BenchmarkId::from_parameter(n), &f, |b, f| {
            b.iter(|| black_box(f.values().unwrap()));
        });
    }

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/flatten");

    for n in [5, 50, 500] {
        let f = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &f, |b, f| {
            b.iter(|| black_box(f.flatten()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_first_render,
    bench_memoized_values,
    bench_flatten
);
criterion_main!(benches);
