//! Benchmarks for markdown parsing and link rewriting.

use convind_editor::markdown::{Arena, MarkdownEngine};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_parse_simple(c: &mut Criterion) {
    let engine = MarkdownEngine::default();
    let md = "# Hello\n\nWorld";
    c.bench_function("parse_simple", |b| {
        b.iter(|| {
            let arena = Arena::new();
            engine.parse(&arena, black_box(md)).root().children().count()
        })
    });
}

fn bench_parse_and_rewrite(c: &mut Criterion) {
    let engine = MarkdownEngine::default();
    let md = include_str!("../tests/fixtures/page.md");
    c.bench_function("parse_and_rewrite", |b| {
        b.iter(|| {
            let arena = Arena::new();
            let doc = engine.parse(&arena, black_box(md));
            engine.rewrite_links(&doc)
        })
    });
}

criterion_group!(benches, bench_parse_simple, bench_parse_and_rewrite);
criterion_main!(benches);
