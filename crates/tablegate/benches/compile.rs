use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tablegate::{QueryParams, SqlBuilder, classify, compile_count, compile_select};

/// A query string with `n` filters cycling through every filter syntax.
fn query_string(n: usize) -> String {
    let mut parts = Vec::with_capacity(n + 4);
    for i in 0..n {
        let value = match i % 4 {
            0 => format!("{i}"),
            1 => format!("_lkv{i}_lk"),
            2 => format!("{i},{},{}", i + 1, i + 2),
            _ => format!("{i},_null"),
        };
        parts.push(format!("col{i}={value}"));
    }
    parts.push("_orderby=col0&_ordertype=desc".to_string());
    parts.push("_limit=50&_offset=100".to_string());
    parts.push("_cmp=id,name,email".to_string());
    parts.join("&")
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("tablegate/classify");

    for n in [1, 5, 20, 100] {
        let params = QueryParams::parse(&query_string(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &params, |b, params| {
            b.iter(|| black_box(classify(params)));
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("tablegate/compile_select");

    for n in [1, 5, 20, 100] {
        let spec = classify(&QueryParams::parse(&query_string(n))).spec;
        group.bench_with_input(BenchmarkId::from_parameter(n), &spec, |b, spec| {
            b.iter(|| black_box(compile_select(spec, "users")));
        });
    }

    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("tablegate/parse_classify_compile");

    for n in [1, 5, 20, 100] {
        let qs = query_string(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &qs, |b, qs| {
            b.iter(|| {
                let spec = classify(&QueryParams::parse(qs)).spec;
                black_box(compile_select(&spec, "users"));
                black_box(compile_count(&spec, "users"));
            });
        });
    }

    group.finish();
}

fn bench_bind_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("tablegate/push_bind_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut sql = SqlBuilder::new("SELECT * FROM t WHERE id IN (");
                sql.push_bind_list(values.iter().copied());
                sql.push(")");
                black_box(sql.to_sql());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classify,
    bench_compile,
    bench_end_to_end,
    bench_bind_list
);
criterion_main!(benches);
