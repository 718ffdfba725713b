use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use workflow_catalog_query::lexer::tokenize;
use workflow_catalog_query::parser::Parser;
use workflow_catalog_query::sql_compiler::SqlCompiler;
use workflow_catalog_query::wildcard::Pattern;
use workflow_catalog_query::{Query, WorkflowMetadata};

const QUERIES: [(&str, &str); 3] = [
    ("simple", r#"generic_information("I","E")"#),
    (
        "medium",
        r#"generic_information("I", "E") OR generic_information("C", "E") AND variable("CPU", "%")"#,
    ),
    (
        "complex",
        r#"generic_information("I", "E") AND generic_information("type", "public") AND variable("CPU", "%") OR generic_information("C", "E") AND variable("CPU", "%") OR name="Amazon""#,
    ),
];

// A catalog page of records with a few generic information and variable entries each
fn records(count: usize) -> Vec<WorkflowMetadata> {
    (0..count)
        .map(|i| {
            WorkflowMetadata::new(format!("workflow-{}", i))
                .with_project_name(if i % 3 == 0 { "Fabien" } else { "" })
                .with_generic_information(if i % 2 == 0 { "I" } else { "C" }, "E")
                .with_generic_information("type", if i % 4 == 0 { "public" } else { "private" })
                .with_variable("CPU", format!("{}", i % 8))
        })
        .collect()
}

fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_performance");

    for (name, query) in QUERIES {
        group.bench_with_input(BenchmarkId::new("tokenize", name), &query, |b, &query| {
            b.iter(|| black_box(tokenize(black_box(query)).unwrap()))
        });
    }

    group.finish();
}

fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_performance");

    for (name, query) in QUERIES {
        let tokens = tokenize(query).unwrap();

        group.bench_with_input(BenchmarkId::new("parse", name), &tokens, |b, tokens| {
            b.iter(|| {
                let parser = Parser::new(black_box(tokens.clone()));
                black_box(parser.parse().expect("query should parse"))
            })
        });
    }

    group.finish();
}

fn benchmark_wildcard(c: &mut Criterion) {
    let patterns = [("exact", "Fabien"), ("prefix", "Fab%"), ("infix", "%b%e%")];

    let mut group = c.benchmark_group("wildcard_performance");

    for (name, raw) in patterns {
        let pattern = Pattern::new(raw);
        group.bench_with_input(BenchmarkId::new("matches", name), &pattern, |b, pattern| {
            b.iter(|| black_box(pattern.matches(black_box("Fabien Viale"))))
        });
    }

    group.finish();
}

fn benchmark_filter(c: &mut Criterion) {
    let page = records(1000);

    let mut group = c.benchmark_group("filter_performance");

    for (name, source) in QUERIES {
        let query = Query::parse(source).unwrap();
        group.bench_with_input(BenchmarkId::new("filter_1000", name), &query, |b, query| {
            b.iter(|| black_box(query.filter(black_box(&page)).len()))
        });
    }

    group.finish();
}

fn benchmark_sql_compiler(c: &mut Criterion) {
    let compiler = SqlCompiler::new();

    let mut group = c.benchmark_group("sql_compiler_performance");

    for (name, source) in QUERIES {
        let query = Query::parse(source).unwrap();
        group.bench_with_input(BenchmarkId::new("compile", name), &query, |b, query| {
            b.iter(|| black_box(compiler.compile(black_box(query.predicate()))))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_parser,
    benchmark_wildcard,
    benchmark_filter,
    benchmark_sql_compiler
);
criterion_main!(benches);
