//! Performance benchmarks for the Strata window stack
//!
//! These benchmarks cover the hot paths of a busy UI: opening and closing
//! windows, ticking running transitions and stack bookkeeping.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use strata::{
    config::WindowTemplate,
    manager::{stack::WindowStack, templates::NoResources},
    HeadlessSurface, StrataConfig, WindowFlags, WindowId, WindowKind, WindowManager, WindowParts,
};

fn kinds(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Window{}", i)).collect()
}

fn manager(kinds: &[String], transition: &str) -> WindowManager {
    let mut config = StrataConfig::default();
    for kind in kinds {
        config.windows.insert(WindowTemplate::new(kind.as_str(), transition).with_flags(WindowFlags {
            destroy_after_close: false,
            ..WindowFlags::default()
        }));
    }

    let factory = |_: &WindowKind, _: &WindowTemplate| -> strata::Result<WindowParts> {
        Ok(WindowParts::new(HeadlessSurface::new().shared()))
    };
    WindowManager::new(
        config,
        factory,
        NoResources,
        HeadlessSurface::new(),
        HeadlessSurface::new(),
    )
}

/// Benchmark fast open/close cycles over different stack depths
fn bench_open_close_fast(c: &mut Criterion) {
    let mut group = c.benchmark_group("open_close_fast");

    for depth in [1usize, 8, 32].iter() {
        let names = kinds(*depth);
        group.bench_function(format!("depth_{}", depth), |b| {
            b.iter_batched(
                || manager(&names, "combined"),
                |mut manager| {
                    for name in &names {
                        black_box(manager.open_fast(name.as_str()).ok());
                    }
                    manager.close_all_fast();
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark animated transitions driven frame by frame
fn bench_animated_cycle(c: &mut Criterion) {
    let names = kinds(8);
    let frame = Duration::from_millis(16);

    c.bench_function("animated_open_close_8", |b| {
        b.iter_batched(
            || manager(&names, "all"),
            |mut manager| {
                for name in &names {
                    black_box(manager.open(name.as_str()).ok());
                }
                manager.close_all(false);
                while !manager.scheduler().is_idle() {
                    manager.scheduler().tick(frame);
                }
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark reopening cached windows out of stack order
fn bench_reopen_reorder(c: &mut Criterion) {
    let names = kinds(16);
    let mut manager = manager(&names, "instant");
    for name in &names {
        let _ = manager.open_fast(name.as_str());
    }

    c.bench_function("reopen_bottom_window", |b| {
        b.iter(|| {
            let bottom = manager
                .windows()
                .first()
                .map(|w| w.borrow().kind().clone());
            if let Some(kind) = bottom {
                black_box(manager.open_fast(kind).ok());
            }
        });
    });
}

/// Benchmark raw stack bookkeeping
fn bench_window_stack(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_stack");

    for size in [10u64, 100, 500].iter() {
        group.bench_function(format!("raise_all_{}", size), |b| {
            b.iter_batched(
                || {
                    let mut stack = WindowStack::new();
                    for id in 0..*size {
                        stack.push(WindowId(id));
                    }
                    stack
                },
                |mut stack| {
                    for id in 0..*size {
                        black_box(stack.raise_or_push(WindowId(id)));
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark configuration parsing
fn bench_configuration(c: &mut Criterion) {
    let mut config = StrataConfig::default();
    for name in kinds(20) {
        config.windows.insert(WindowTemplate::new(name.as_str(), "pos"));
    }
    let toml_string = toml::to_string(&config).unwrap_or_default();

    c.bench_function("config_parse", |b| {
        b.iter(|| {
            let parsed: Result<StrataConfig, _> = toml::from_str(black_box(&toml_string));
            black_box(parsed.ok())
        });
    });
}

criterion_group!(
    benches,
    bench_open_close_fast,
    bench_animated_cycle,
    bench_reopen_reorder,
    bench_window_stack,
    bench_configuration
);

criterion_main!(benches);
