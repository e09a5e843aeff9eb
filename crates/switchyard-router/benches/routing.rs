//! Route tree benchmarks.
//!
//! Run with: `cargo bench -p switchyard-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use switchyard_router::RouteTree;

fn build_tree(num_routes: usize) -> RouteTree<usize> {
    let mut tree = RouteTree::new();

    for i in 0..num_routes / 2 {
        tree.register(Method::GET, &format!("/api/v1/resource{i}"), vec![i])
            .expect("literal route");
    }

    for i in 0..num_routes / 2 {
        tree.register(Method::GET, &format!("/api/v1/resource{i}/*"), vec![i])
            .expect("wildcard route");
    }

    tree
}

fn bench_literal_match(c: &mut Criterion) {
    let tree = build_tree(100);

    c.bench_function("literal_match", |b| {
        b.iter(|| {
            black_box(tree.lookup(&Method::GET, "/api/v1/resource25"));
        });
    });
}

fn bench_wildcard_match(c: &mut Criterion) {
    let tree = build_tree(100);

    c.bench_function("wildcard_match", |b| {
        b.iter(|| {
            black_box(tree.lookup(&Method::GET, "/api/v1/resource25/12345"));
        });
    });
}

fn bench_miss(c: &mut Criterion) {
    let tree = build_tree(100);

    c.bench_function("miss", |b| {
        b.iter(|| {
            black_box(tree.lookup(&Method::GET, "/api/v1/nonexistent/path"));
        });
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [10, 50, 100, 500, 1000] {
        let tree = build_tree(num_routes);

        group.bench_with_input(
            BenchmarkId::new("literal_match", num_routes),
            &num_routes,
            |b, &n| {
                let path = format!("/api/v1/resource{}", n / 4);
                b.iter(|| black_box(tree.lookup(&Method::GET, &path)));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_literal_match,
    bench_wildcard_match,
    bench_miss,
    bench_scaling
);
criterion_main!(benches);
