//! Stage three: draw the daily cycle and the spatial mean heatmap from the CSV table.

pub mod colormap;
pub mod error;
pub mod heatmap;
pub mod table;
pub mod time_series;
pub mod views;

pub use table::load_data;

use crate::config::RenderConfig;
use crate::render::error::RenderError;
use crate::render::heatmap::draw_heatmap;
use crate::render::time_series::draw_time_series;
use crate::render::views::{daily_cycle, grid_means};
use log::info;
use polars::prelude::DataFrame;
use std::path::Path;

const FONT: &str = "sans-serif";

/// Plots the first 24 rows of `df` and saves the figure at `path`.
pub fn plot_time_series(df: &DataFrame, path: &Path) -> Result<(), RenderError> {
    info!("📈 Generating time series plot...");
    let points = daily_cycle(df)?;
    draw_time_series(&points, path)?;
    info!("✅ Saved: {}", path.display());
    Ok(())
}

/// Plots the per-cell mean temperature of `df` and saves the figure at `path`.
pub fn plot_spatial_heatmap(df: &DataFrame, path: &Path) -> Result<(), RenderError> {
    info!("🗺️ Generating spatial heatmap...");
    let cells = grid_means(df)?;
    draw_heatmap(&cells, path)?;
    info!("✅ Saved: {}", path.display());
    Ok(())
}

/// Loads the table once and draws both figures, the time series first.
pub fn run(config: &RenderConfig) -> Result<(), RenderError> {
    let df = load_data(&config.input_path)?;
    plot_time_series(&df, &config.time_series_path)?;
    plot_spatial_heatmap(&df, &config.heatmap_path)
}

fn drawing_error<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> RenderError + '_ {
    move |e| RenderError::Drawing {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Range of the finite values, padded by 5% (or by 1 for a flat range) so markers at the
/// extremes stay inside the plot.
fn padded_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        });
    if min > max {
        return (0.0, 1.0);
    }
    let pad = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - pad, max + pad)
}
