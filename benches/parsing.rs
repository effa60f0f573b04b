use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mscript_index::{IndexerConfig, PathEngine};
use std::fs;

fn build_fixture_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("square.m"), "function y = square(x)\ny = x^2;\nend\n").unwrap();
    fs::create_dir_all(dir.path().join("+mypkg")).unwrap();
    fs::write(
        dir.path().join("+mypkg/helper.m"),
        "function y = helper(x)\ny = square(x) + 1;\nend\n",
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("@Widget")).unwrap();
    fs::write(
        dir.path().join("@Widget/Widget.m"),
        "classdef Widget\n  properties\n    Count (1,1) double = 0\n  end\n  methods\n    function obj = Widget(n)\n      obj.Count = n;\n    end\n  end\nend\n",
    )
    .unwrap();
    dir
}

fn bench_addpath(c: &mut Criterion) {
    let dir = build_fixture_tree();
    c.bench_function("addpath_small_tree", |b| {
        b.iter(|| {
            let mut engine = PathEngine::new(IndexerConfig::default()).unwrap();
            engine.addpath(black_box(dir.path()), false, true).unwrap();
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let dir = build_fixture_tree();
    let mut engine = PathEngine::new(IndexerConfig::default()).unwrap();
    engine.addpath(dir.path(), false, true).unwrap();
    c.bench_function("resolve_dotted_name", |b| {
        b.iter(|| {
            black_box(engine.resolve("mypkg.helper", &[]));
        });
    });
}

criterion_group!(benches, bench_addpath, bench_resolve);
criterion_main!(benches);
