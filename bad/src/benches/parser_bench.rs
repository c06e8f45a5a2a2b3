use bad::core::check::check;
use bad::core::context::Context;
use bad::core::lex::lex;
use bad::core::parse::parse;
use bad::core::state::{CompilationConfiguration, ProgramSource};
use bad::core::symbols::SymbolTable;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::path::PathBuf;

fn config() -> CompilationConfiguration {
    CompilationConfiguration::new(ProgramSource::Text {
        name: "bench.b".into(),
        text: String::new(),
    })
}

fn generated_program(functions: usize) -> String {
    let mut source = String::new();
    for i in 0..functions {
        source.push_str(&format!(
            "f{i}(a, b) {{\n  extrn g, v;\n  auto t 0;\n  while (a < b) {{\n    t =+ v[a++] * 2 + (b ? g(t, a) : -t);\n    if (t > 100) goto out;\n  }}\nout:\n  switch (t) {{ case 1: t = 0; case 'x': t--; }}\n  return (t);\n}}\n\n"
        ));
    }
    source.push_str("v[100];\n");
    source
}

fn bench_parse_small(c: &mut Criterion) {
    let config = config();
    let source = generated_program(5);
    c.bench_function("parse_small", |b| {
        b.iter(|| {
            let ctx = Context::new(PathBuf::from("bench.b"), source.clone());
            let tokens = lex(&ctx, &config);
            let parsed = parse(&tokens, &ctx, &config);
            black_box(parsed.program.defs.len())
        })
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let config = config();
    let source = generated_program(500);
    c.bench_function("parse_large", |b| {
        b.iter(|| {
            let ctx = Context::new(PathBuf::from("bench.b"), source.clone());
            let tokens = lex(&ctx, &config);
            let parsed = parse(&tokens, &ctx, &config);
            black_box(parsed.program.defs.len())
        })
    });
}

fn bench_parse_with_errors(c: &mut Criterion) {
    let config = config();
    let source = "f() { x = ; }\ng() { return (1 }\nok 1;\n".repeat(200);
    c.bench_function("parse_with_errors", |b| {
        b.iter(|| {
            let ctx = Context::new(PathBuf::from("bench.b"), source.clone());
            let tokens = lex(&ctx, &config);
            black_box(parse(&tokens, &ctx, &config).diagnostics.len())
        })
    });
}

fn bench_check_and_symbols(c: &mut Criterion) {
    let config = config();
    let source = generated_program(200);
    c.bench_function("check_and_symbols", |b| {
        b.iter(|| {
            let ctx = Context::new(PathBuf::from("bench.b"), source.clone());
            let tokens = lex(&ctx, &config);
            let parsed = parse(&tokens, &ctx, &config);
            let diagnostics = check(&parsed.program, &ctx, &config);
            let table = SymbolTable::build(&parsed.program, &ctx, &config);
            black_box((diagnostics.len(), table.symbols.len()))
        })
    });
}

criterion_group!(
    benches,
    bench_parse_small,
    bench_parse_large,
    bench_parse_with_errors,
    bench_check_and_symbols
);
criterion_main!(benches);
