use crate::render::colormap::ColorScale;
use crate::render::error::RenderError;
use crate::render::views::GridCellMean;
use crate::render::{drawing_error, padded_range, FONT};
use plotters::prelude::*;
use std::path::Path;

pub const HEATMAP_SIZE: (u32, u32) = (800, 600);
pub const HEATMAP_TITLE: &str = "Mean Heatmap - Chambéry Area (July 2023)";
const COLOR_BAR_LABEL: &str = "Average Temperature (°C)";
const COLOR_BAR_WIDTH: u32 = 130;
const COLOR_BAR_STEPS: usize = 100;
/// Cell size used when an axis has a single coordinate (native EAC4 resolution).
const DEFAULT_SPACING: f64 = 0.75;

/// One filled square of the heatmap, in (longitude, latitude) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSquare {
    pub corners: [(f64, f64); 2],
    pub color: RGBColor,
}

/// Everything the heatmap draws, before it is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapLayout {
    pub squares: Vec<CellSquare>,
    pub longitude_range: (f64, f64),
    pub latitude_range: (f64, f64),
    pub scale: ColorScale,
}

/// One uniformly sized square per grid cell centred on (longitude, latitude), coloured by its
/// mean temperature on a scale spanning all cell means.
pub fn layout(cells: &[GridCellMean]) -> HeatmapLayout {
    let half_lon = grid_spacing(cells.iter().map(|c| c.longitude)) / 2.0;
    let half_lat = grid_spacing(cells.iter().map(|c| c.latitude)) / 2.0;
    let scale = ColorScale::from_values(cells.iter().map(|c| c.mean_temperature_c))
        .unwrap_or(ColorScale { min: 0.0, max: 1.0 });

    let squares = cells
        .iter()
        .map(|cell| CellSquare {
            corners: [
                (cell.longitude - half_lon, cell.latitude - half_lat),
                (cell.longitude + half_lon, cell.latitude + half_lat),
            ],
            color: scale.color(cell.mean_temperature_c),
        })
        .collect();

    HeatmapLayout {
        squares,
        longitude_range: extent(cells.iter().map(|c| c.longitude), half_lon),
        latitude_range: extent(cells.iter().map(|c| c.latitude), half_lat),
        scale,
    }
}

/// Draws the [`layout`] of `cells` next to a colour bar and saves the PNG at `path`.
pub fn draw_heatmap(cells: &[GridCellMean], path: &Path) -> Result<(), RenderError> {
    let HeatmapLayout {
        squares,
        longitude_range: (lon_min, lon_max),
        latitude_range: (lat_min, lat_max),
        scale,
    } = layout(cells);

    let root = BitMapBackend::new(path, HEATMAP_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(drawing_error(path))?;
    let (map_area, bar_area) = root.split_horizontally(HEATMAP_SIZE.0 - COLOR_BAR_WIDTH);

    let mut chart = ChartBuilder::on(&map_area)
        .caption(HEATMAP_TITLE, (FONT, 22))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(lon_min..lon_max, lat_min..lat_max)
        .map_err(drawing_error(path))?;

    chart
        .configure_mesh()
        .light_line_style(BLACK.mix(0.05))
        .bold_line_style(BLACK.mix(0.2))
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()
        .map_err(drawing_error(path))?;

    chart
        .draw_series(
            squares
                .iter()
                .map(|square| Rectangle::new(square.corners, square.color.filled())),
        )
        .map_err(drawing_error(path))?;

    draw_color_bar(&bar_area, scale, path)?;
    root.present().map_err(drawing_error(path))
}

fn draw_color_bar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    scale: ColorScale,
    path: &Path,
) -> Result<(), RenderError> {
    let (low, high) = padded_range([scale.min, scale.max]);
    let mut bar = ChartBuilder::on(area)
        .margin_top(55)
        .margin_bottom(60)
        .margin_right(10)
        .right_y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, low..high)
        .map_err(drawing_error(path))?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(COLOR_BAR_LABEL)
        .y_label_formatter(&|v: &f64| format!("{v:.1}"))
        .draw()
        .map_err(drawing_error(path))?;

    let step = (high - low) / COLOR_BAR_STEPS as f64;
    bar.draw_series((0..COLOR_BAR_STEPS).map(|i| {
        let bottom = low + step * i as f64;
        Rectangle::new(
            [(0.0, bottom), (1.0, bottom + step)],
            scale.color(bottom + step / 2.0).filled(),
        )
    }))
    .map_err(drawing_error(path))?;
    Ok(())
}

/// Smallest positive distance between two distinct coordinates.
fn grid_spacing(values: impl Iterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|gap| *gap > 0.0)
        .min_by(f64::total_cmp)
        .unwrap_or(DEFAULT_SPACING)
}

fn extent(values: impl Iterator<Item = f64>, half_cell: f64) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        });
    if min > max {
        return (-half_cell, half_cell);
    }
    (min - half_cell, max + half_cell)
}
