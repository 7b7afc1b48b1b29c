use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reanalysis_pipeline::tabulate::tabulate;
use reanalysis_pipeline::{CoordinateValues, Dimension, GridDataset, GridField};

/// One day of hourly means on a 41 x 41 cell grid at 0.75° spacing.
fn synthetic_grid() -> GridDataset {
    let (hours, rows, cols) = (24, 41, 41);
    let start = NaiveDate::from_ymd_opt(2023, 7, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start time");
    let times = (0..hours).map(|h| start + Duration::hours(h as i64)).collect();
    let latitudes = (0..rows).map(|i| 60.0 - 0.75 * i as f64).collect();
    let longitudes = (0..cols).map(|i| -10.0 + 0.75 * i as f64).collect();
    let kelvin = (0..hours * rows * cols)
        .map(|i| 280.0 + (i % 97) as f64 * 0.25)
        .collect();

    GridDataset::new(vec![
        Dimension::new("valid_time", hours),
        Dimension::new("latitude", rows),
        Dimension::new("longitude", cols),
    ])
    .with_coordinate("valid_time", CoordinateValues::Time(times))
    .and_then(|d| d.with_coordinate("latitude", CoordinateValues::Numeric(latitudes)))
    .and_then(|d| d.with_coordinate("longitude", CoordinateValues::Numeric(longitudes)))
    .and_then(|d| {
        d.with_field(GridField::new(
            "t2m",
            &["valid_time", "latitude", "longitude"],
            kelvin,
        ))
    })
    .expect("consistent synthetic grid")
}

fn bench_flatten(c: &mut Criterion) {
    let grid = synthetic_grid();
    c.bench_function("to_dataframe", |b| {
        b.iter(|| black_box(&grid).to_dataframe())
    });
    c.bench_function("tabulate", |b| {
        b.iter(|| tabulate(black_box(grid.clone())))
    });
}

criterion_group!(benches, bench_flatten);
criterion_main!(benches);
