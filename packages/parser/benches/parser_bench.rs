use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quill_parser::{parse, tokenize, Root, Serializer};

const SMALL: &str = "ƒ sum(a•# b•#) a + b\nsum(1 2)";

fn large_source() -> String {
    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!(
            "value{i}•#: {i} + 1\nƒ f{i}(x•# y•[''], z•?: ⊤) z ? x · value{i} [\"a\" \"b\"]\nf{i}(value{i} [] ⊥)\n"
        ));
    }
    source
}

fn parse_small(c: &mut Criterion) {
    c.bench_function("parse_small", |b| b.iter(|| parse(black_box(SMALL))));
}

fn parse_large(c: &mut Criterion) {
    let source = large_source();
    c.bench_function("parse_600_lines", |b| b.iter(|| parse(black_box(&source))));
}

fn tokenize_only(c: &mut Criterion) {
    let source = large_source();
    c.bench_function("tokenize_only", |b| b.iter(|| tokenize(black_box(&source))));
}

fn render_and_index(c: &mut Criterion) {
    let program = parse(&large_source());
    c.bench_function("render_600_lines", |b| {
        b.iter(|| Serializer::lexed(black_box(&program)).render())
    });
    c.bench_function("index_600_lines", |b| b.iter(|| Root::new(black_box(program.clone()))));
}

criterion_group!(benches, parse_small, parse_large, tokenize_only, render_and_index);
criterion_main!(benches);
