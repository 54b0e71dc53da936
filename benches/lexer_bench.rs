use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mita::lexer::tokenize;
use mita::{Context, parse_program, parse_str};

// A reasonably complex input string for benchmarking
const BENCH_INPUT: &str = r#"
; Fibonacci, counted down through both branches
(muhe(
    (yafib (mita (si)
        (dala ((shato si 0) 0)
            (da (dala ((aba si du) unu)
                (da (celi (yafib (movo si du)) (yafib (movo si unu))))
            ))
        )
    ))
))

(muhe (
    (even (mita (n) (dala ((shato n 0) da) (da (odd (movo n 1))))))
    (odd (mita (n) (dala ((shato n 0) nye) (da (even (movo n 1))))))
))

; Some calls
(yafib 10)
(even 12)
(lalalakukucha '((1 2) (3 4) ((5 6)) (7 8)))
'("string with spaces" da nye 123 -10 (a . b))
'("string with escapes \"\\\"" nya nil mani)
"#;

const FIB: &str = r#"
(muhe(
    (yafib (mita (si)
        (dala ((shato si 0) 0)
            (da (dala ((aba si du) unu)
                (da (celi (yafib (movo si du)) (yafib (movo si unu))))
            ))
        )
    ))
))
"#;

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize", |b| {
        b.iter(|| tokenize(black_box(BENCH_INPUT)))
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_program", |b| {
        b.iter(|| parse_program(black_box(BENCH_INPUT)))
    });
}

fn bench_fib(c: &mut Criterion) {
    let mut group = c.benchmark_group("yafib");
    let definition = match parse_str(FIB) {
        Ok(expr) => expr,
        Err(e) => panic!("benchmark program does not parse: {}", e),
    };
    for n in [5, 10, 15] {
        let call = match parse_str(&format!("(yafib {})", n)) {
            Ok(expr) => expr,
            Err(e) => panic!("benchmark call does not parse: {}", e),
        };
        group.bench_with_input(BenchmarkId::from_parameter(n), &call, |b, call| {
            let mut ctx = Context::default();
            if let Err(e) = ctx.evaluate(&definition) {
                panic!("definition failed: {}", e);
            }
            b.iter(|| ctx.evaluate(black_box(call)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_parse, bench_fib);
criterion_main!(benches);
