//! Hit-testing benchmarks for JuhRadial MX
//!
//! The cursor is hit-tested on every `CursorMoved` signal and every 16 ms poll
//! in toggle mode, so these paths must stay far below a frame.

use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use juhradial_overlay::actions::default_actions;
use juhradial_overlay::cursor::{CursorPosition, MenuPlacement};
use juhradial_overlay::geometry::{slice_at, subitem_at, CENTER_ZONE_RADIUS, MENU_RADIUS};
use juhradial_overlay::overlay::RadialMenu;

fn benchmark_slice_at(c: &mut Criterion) {
    let points: Vec<(f64, f64)> = (0..360)
        .map(|deg| {
            let rad = (deg as f64).to_radians();
            (100.0 * rad.sin(), -100.0 * rad.cos())
        })
        .collect();

    c.bench_function("slice_at_full_circle", |b| {
        b.iter(|| {
            for &(dx, dy) in &points {
                black_box(slice_at(
                    black_box(dx),
                    black_box(dy),
                    CENTER_ZONE_RADIUS as f64,
                    MENU_RADIUS as f64,
                ));
            }
        })
    });
}

fn benchmark_subitem_at(c: &mut Criterion) {
    c.bench_function("subitem_at_miss", |b| {
        b.iter(|| black_box(subitem_at(black_box(7), 4, black_box(0.0), black_box(-250.0))))
    });
}

fn benchmark_toggle_hover(c: &mut Criterion) {
    let mut menu = RadialMenu::new(default_actions(), CENTER_ZONE_RADIUS);
    let t0 = Instant::now();
    menu.on_show(1000, 500, t0, |x, y| MenuPlacement { x, y, monitor: None });
    menu.on_hide(t0);

    let mut step = 0i32;
    c.bench_function("toggle_poll_cursor", |b| {
        b.iter(|| {
            step = (step + 7) % 360;
            let rad = (step as f64).to_radians();
            let pos = CursorPosition::new(
                1000 + (120.0 * rad.sin()) as i32,
                500 - (120.0 * rad.cos()) as i32,
            );
            black_box(menu.poll_cursor(pos))
        })
    });
}

criterion_group!(
    benches,
    benchmark_slice_at,
    benchmark_subitem_at,
    benchmark_toggle_hover
);

criterion_main!(benches);
