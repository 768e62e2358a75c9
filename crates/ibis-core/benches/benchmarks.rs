use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ibis_core::parser::ParsedFile;
use ibis_core::semantic::flow::{exit_predecessors, is_redundant_jump};
use ibis_core::semantic::{ControlFlowGraph, are_equivalent_stmt_lists};
use swc_ecma_ast::Stmt;

fn generate_control_flow_heavy(functions: usize) -> String {
    let mut code = String::with_capacity(functions * 400);
    code.push_str("// Generated control-flow heavy file for benchmarking\n\n");

    for i in 0..functions {
        code.push_str(&format!(
            r#"function worker{i}(items, limit) {{
    let total = 0;
    for (let j = 0; j < items.length; j++) {{
        const item = items[j];
        if (item == null) continue;
        switch (item.kind) {{
            case 'skip': continue;
            case 'stop': return total;
            default: total += item.weight;
        }}
        while (total > limit) {{
            total -= limit;
            if (total === 0) break;
        }}
    }}
    try {{
        publish{i}(total);
    }} catch (e) {{
        log(e);
    }} finally {{
        flush();
    }}
    return total;
}}

"#,
            i = i
        ));
    }

    code
}

fn top_level_stmts(file: &ParsedFile) -> Vec<Stmt> {
    file.module()
        .expect("benchmark code must parse")
        .body
        .iter()
        .filter_map(|item| item.as_stmt().cloned())
        .collect()
}

fn function_bodies(stmts: &[Stmt]) -> Vec<&[Stmt]> {
    stmts
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Decl(swc_ecma_ast::Decl::Fn(func)) => {
                func.function.body.as_ref().map(|b| b.stmts.as_slice())
            }
            _ => None,
        })
        .collect()
}

fn bench_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");

    let code = generate_control_flow_heavy(50);
    let lines = code.lines().count();

    group.throughput(Throughput::Elements(lines as u64));
    group.bench_function("parse_control_flow_heavy", |b| {
        b.iter(|| ParsedFile::from_source(black_box("benchmark.js"), black_box(&code)))
    });

    group.finish();
}

fn bench_cfg_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("cfg");

    let code = generate_control_flow_heavy(50);
    let file = ParsedFile::from_source("benchmark.js", &code);
    let stmts = top_level_stmts(&file);
    let bodies = function_bodies(&stmts);

    group.throughput(Throughput::Elements(bodies.len() as u64));
    group.bench_function("build_50_function_bodies", |b| {
        b.iter(|| {
            for body in &bodies {
                let cfg = ControlFlowGraph::from_statements(black_box(body))
                    .expect("supported constructs only");
                black_box(cfg.block_count());
            }
        })
    });

    group.bench_function("build_and_query", |b| {
        b.iter(|| {
            for body in &bodies {
                let cfg = ControlFlowGraph::from_statements(black_box(body))
                    .expect("supported constructs only");
                let exits = exit_predecessors(&cfg);
                let redundant = cfg
                    .blocks()
                    .filter(|block| is_redundant_jump(&cfg, block.id))
                    .count();
                black_box((exits.len(), redundant));
            }
        })
    });

    for size in [10, 25, 50] {
        group.bench_with_input(BenchmarkId::new("bodies", size), &size, |b, &size| {
            let subset = &bodies[..size];
            b.iter(|| {
                for body in subset {
                    let cfg = ControlFlowGraph::from_statements(black_box(body))
                        .expect("supported constructs only");
                    black_box(cfg.block_count());
                }
            })
        });
    }

    group.finish();
}

fn bench_equivalence(c: &mut Criterion) {
    let mut group = c.benchmark_group("equivalence");

    let code = generate_control_flow_heavy(50);
    let file = ParsedFile::from_source("benchmark.js", &code);
    let stmts = top_level_stmts(&file);
    let bodies = function_bodies(&stmts);

    // Every generated body has the same shape, so all-pairs comparison in
    // relaxed mode exercises the full recursion depth.
    group.bench_function("all_pairs_strict", |b| {
        b.iter(|| {
            let mut matches = 0usize;
            for (i, a) in bodies.iter().enumerate() {
                for b in &bodies[i + 1..] {
                    if are_equivalent_stmt_lists(black_box(a), black_box(b), false) {
                        matches += 1;
                    }
                }
            }
            black_box(matches)
        })
    });

    group.bench_function("all_pairs_relaxed", |b| {
        b.iter(|| {
            let mut matches = 0usize;
            for (i, a) in bodies.iter().enumerate() {
                for b in &bodies[i + 1..] {
                    if are_equivalent_stmt_lists(black_box(a), black_box(b), true) {
                        matches += 1;
                    }
                }
            }
            black_box(matches)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parsing, bench_cfg_construction, bench_equivalence);
criterion_main!(benches);
