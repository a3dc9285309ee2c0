// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use noiir_variants::{Engine, EntityId, Rule, RuleTrigger, TriggerKind};

fn engine_with_checkboxes(n: usize) -> Engine {
    let mut engine = Engine::new();
    for i in 0..n {
        engine.mount(
            format!("cb{i}"),
            "unchecked",
            [
                Rule::new(TriggerKind::Click).cycle(["unchecked", "checked"]),
                Rule::new(RuleTrigger::Hover).guard("unchecked").to("hot"),
            ],
        );
    }
    engine
}

fn engine_with_listen_chain(n: usize) -> Engine {
    let mut engine = Engine::new();
    engine.mount("n0", "off", [Rule::new(TriggerKind::Click).cycle(["off", "on"])]);
    for i in 1..n {
        let prev = format!("n{}", i - 1);
        engine.mount(
            format!("n{i}"),
            "off",
            [Rule::new(TriggerKind::Listen).listen_to(prev, None).cycle(["off", "on"])],
        );
    }
    engine
}

fn bench_click(c: &mut Criterion) {
    let mut group = c.benchmark_group("click");
    for &n in &[16usize, 128, 1024] {
        let mut engine = engine_with_checkboxes(n);
        let target = format!("cb{}", n / 2);
        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("toggle_among_n{n}"), |b| {
            b.iter(|| black_box(engine.click(&target).len()));
        });
    }
    group.finish();
}

fn bench_hover_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("hover_path");
    for &n in &[16usize, 128] {
        let mut engine = engine_with_checkboxes(n);
        let paths: Vec<Vec<EntityId>> = (0..n)
            .map(|i| vec![EntityId::from(format!("cb{i}"))])
            .collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("sweep_n{n}"), |b| {
            b.iter(|| {
                let mut commits = 0;
                for p in &paths {
                    commits += engine.update_pointer_path(p).len();
                }
                commits += engine.clear_pointer_path().len();
                black_box(commits)
            });
        });
    }
    group.finish();
}

fn bench_listen_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("listen_chain");
    for &n in &[8usize, 64, 256] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("propagate_n{n}"), |b| {
            b.iter_batched(
                || engine_with_listen_chain(n),
                |mut engine| black_box(engine.click("n0").len()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_click, bench_hover_path, bench_listen_chain);
criterion_main!(benches);
