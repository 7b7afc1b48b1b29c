use crate::render::error::RenderError;
use crate::render::views::TimeSeriesPoint;
use crate::render::{drawing_error, padded_range, FONT};
use chrono::{DateTime, Duration, NaiveDateTime};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

pub const TIME_SERIES_SIZE: (u32, u32) = (1000, 600);
pub const TIME_SERIES_TITLE: &str = "Daily Cycle (July 2023)";
const SERIES_LABEL: &str = "Temperature (°C)";
const CRIMSON: RGBColor = RGBColor(220, 20, 60);

const MARKER_RADIUS: i32 = 4;

/// Draws `points` as a crimson line with filled circular markers and saves the PNG at `path`.
/// Points missing a time or a temperature are not drawn.
pub fn draw_time_series(points: &[TimeSeriesPoint], path: &Path) -> Result<(), RenderError> {
    let root = BitMapBackend::new(path, TIME_SERIES_SIZE).into_drawing_area();
    draw_time_series_on(&root, points, path)?;
    root.present().map_err(drawing_error(path))
}

/// Draws the figure on `root` and returns the pixel position of every marker. `path` only
/// labels errors.
pub(crate) fn draw_time_series_on<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    points: &[TimeSeriesPoint],
    path: &Path,
) -> Result<Vec<(i32, i32)>, RenderError> {
    let series: Vec<(NaiveDateTime, f64)> = points
        .iter()
        .filter_map(|p| Some((p.time?, p.temperature_c?)))
        .collect();

    let (start, end) = time_range(series.iter().map(|(t, _)| *t));
    let (low, high) = padded_range(series.iter().map(|(_, v)| *v));

    root.fill(&WHITE).map_err(drawing_error(path))?;

    let mut chart = ChartBuilder::on(root)
        .caption(TIME_SERIES_TITLE, (FONT, 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(RangedDateTime::from(start..end), low..high)
        .map_err(drawing_error(path))?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.25))
        .x_desc("Time")
        .y_desc(SERIES_LABEL)
        .x_label_formatter(&|t: &NaiveDateTime| t.format("%m-%d %H:%M").to_string())
        .draw()
        .map_err(drawing_error(path))?;

    chart
        .draw_series(LineSeries::new(series.iter().copied(), CRIMSON.stroke_width(2)))
        .map_err(drawing_error(path))?
        .label(SERIES_LABEL)
        .legend(|(x, y)| {
            EmptyElement::at((x, y))
                + PathElement::new(vec![(0, 0), (20, 0)], CRIMSON.stroke_width(2))
                + Circle::new((10, 0), MARKER_RADIUS, CRIMSON.filled())
        });
    chart
        .draw_series(
            series
                .iter()
                .map(|&point| Circle::new(point, MARKER_RADIUS, CRIMSON.filled())),
        )
        .map_err(drawing_error(path))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(drawing_error(path))?;

    Ok(series.iter().map(|point| chart.backend_coord(point)).collect())
}

/// Earliest and latest timestamp, widened by half an hour each way when they coincide.
fn time_range(times: impl Iterator<Item = NaiveDateTime>) -> (NaiveDateTime, NaiveDateTime) {
    let (start, end) = times.fold(None, |range, t| match range {
        None => Some((t, t)),
        Some((start, end)) => Some((t.min(start), t.max(end))),
    })
    .unwrap_or_else(|| {
        let epoch = DateTime::UNIX_EPOCH.naive_utc();
        (epoch, epoch)
    });

    if start == end {
        (start - Duration::minutes(30), end + Duration::minutes(30))
    } else {
        (start, end)
    }
}
