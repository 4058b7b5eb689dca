use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tarn::altitude_grid::AltitudeGrid;
use tarn::colour::ColourScheme;
use tarn::render::render;
use tarn::water::suspect_water;

/// One 10km square of rolling terrain with a flat lake in the middle.
/// Seeded so every run benchmarks the same square.
fn synthetic_square() -> AltitudeGrid {
    let size = 200u32;
    let mut rng = StdRng::seed_from_u64(42);
    let mut grid = AltitudeGrid::new(size, size, 50);
    for y in 0..size {
        for x in 0..size {
            let rolling = ((x as f32 / 9.0).sin() + (y as f32 / 13.0).cos())
                * 120.0
                + 250.0
                + rng.random_range(-2.0..2.0);
            grid.set_altitude(x, y, (rolling * 10.0).round() / 10.0);
        }
    }
    for y in 80..120 {
        for x in 70..140 {
            grid.set_altitude(x, y, 187.3);
        }
    }
    grid
}

fn benchmark_water_detection(c: &mut Criterion) {
    let grid = synthetic_square();

    c.bench_function("water_detection", |b| {
        b.iter(|| suspect_water(black_box(&grid)))
    });
}

fn benchmark_render(c: &mut Criterion) {
    let grid = synthetic_square();
    let mask = suspect_water(&grid);
    let scheme = ColourScheme::standard();

    c.bench_function("render", |b| {
        b.iter(|| {
            render(
                black_box(&grid),
                black_box(Some(&mask)),
                black_box(scheme),
                490.0,
            )
        })
    });
}

fn criterion_config() -> Criterion {
    Criterion::default().sample_size(10)
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = benchmark_water_detection, benchmark_render
}
criterion_main!(benches);
