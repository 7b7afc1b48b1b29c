//! The request document submitted to the reanalysis data service.

use crate::config::{BoundingBox, ReanalysisMonth};
use serde::Serialize;

pub const TEMPERATURE_VARIABLE: &str = "2m_temperature";
pub const MONTHLY_MEAN_BY_HOUR: &str = "monthly_mean_by_hour_of_day";
pub const NETCDF_FORMAT: &str = "netcdf";

/// Parameters of one gridded temperature retrieval.
///
/// Only the period and the area vary between runs; the variable, product type, the 24 hourly
/// slots and the file format are fixed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRequest {
    pub variable: &'static str,
    pub year: String,
    pub month: String,
    pub product_type: &'static str,
    pub time: Vec<String>,
    /// `[north, west, south, east]`
    pub area: BoundingBox,
    pub format: &'static str,
}

impl GridRequest {
    pub fn new(period: ReanalysisMonth, area: BoundingBox) -> Self {
        Self {
            variable: TEMPERATURE_VARIABLE,
            year: period.year_string(),
            month: period.month_string(),
            product_type: MONTHLY_MEAN_BY_HOUR,
            time: all_hours(),
            area,
            format: NETCDF_FORMAT,
        }
    }
}

/// `"00:00"` through `"23:00"`.
pub fn all_hours() -> Vec<String> {
    (0..24).map(|hour| format!("{hour:02}:00")).collect()
}
