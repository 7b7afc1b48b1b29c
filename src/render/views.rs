//! The two derived views the plots are drawn from.

use crate::render::error::RenderError;
use crate::tabulate::{LATITUDE_COLUMN, LONGITUDE_COLUMN, TEMPERATURE_COLUMN, TIME_COLUMN};
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Rows used for the daily cycle: the table is expected to start with one day of hourly data.
pub const HOURS_PER_DAY: usize = 24;

/// One row of the time series, as found in the table. Missing values stay missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub time: Option<NaiveDateTime>,
    pub temperature_c: Option<f64>,
}

/// Mean temperature of every row sharing one (latitude, longitude) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCellMean {
    pub latitude: f64,
    pub longitude: f64,
    pub mean_temperature_c: f64,
}

/// The first `min(24, height)` rows in file order, without sorting or deduplication.
pub fn daily_cycle(df: &DataFrame) -> Result<Vec<TimeSeriesPoint>, RenderError> {
    let subset = df.head(Some(HOURS_PER_DAY));

    let times = subset
        .column(TIME_COLUMN)?
        .as_materialized_series()
        .datetime()?
        .as_datetime_iter()
        .collect::<Vec<_>>();
    let temperatures = subset
        .column(TEMPERATURE_COLUMN)?
        .cast(&DataType::Float64)?;

    Ok(times
        .into_iter()
        .zip(temperatures.f64()?)
        .map(|(time, temperature_c)| TimeSeriesPoint {
            time,
            temperature_c,
        })
        .collect())
}

/// Groups all rows by their exact (latitude, longitude) pair and averages `Temperature_C`.
///
/// Groups appear in order of first occurrence. Missing temperatures are ignored; a group
/// without any temperature is left out.
pub fn grid_means(df: &DataFrame) -> Result<Vec<GridCellMean>, RenderError> {
    let grouped = df
        .clone()
        .lazy()
        .group_by_stable([col(LATITUDE_COLUMN), col(LONGITUDE_COLUMN)])
        .agg([col(TEMPERATURE_COLUMN).cast(DataType::Float64).mean()])
        .collect()?;

    let latitudes = grouped
        .column(LATITUDE_COLUMN)?
        .cast(&DataType::Float64)?;
    let longitudes = grouped
        .column(LONGITUDE_COLUMN)?
        .cast(&DataType::Float64)?;
    let means = grouped.column(TEMPERATURE_COLUMN)?;

    Ok(latitudes
        .f64()?
        .into_iter()
        .zip(longitudes.f64()?)
        .zip(means.f64()?)
        .filter_map(|((latitude, longitude), mean)| {
            Some(GridCellMean {
                latitude: latitude?,
                longitude: longitude?,
                mean_temperature_c: mean?,
            })
        })
        .collect())
}
