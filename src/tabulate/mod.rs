//! Stage two: turn the downloaded grid into a flat CSV table in degrees Celsius.

pub mod error;

use crate::config::TabulateConfig;
use crate::grid::netcdf_reader::open_grid;
use crate::grid::GridDataset;
use crate::tabulate::error::TabulateError;
use log::{debug, info};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

pub const TEMPERATURE_FIELD: &str = "t2m";
pub const TIME_COORDINATE: &str = "valid_time";
pub const KELVIN_OFFSET: f64 = 273.15;

pub const TIME_COLUMN: &str = "time";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const TEMPERATURE_COLUMN: &str = "Temperature_C";

/// Columns kept in the output table, in output order.
pub const TARGET_COLUMNS: [&str; 4] = [
    TIME_COLUMN,
    LATITUDE_COLUMN,
    LONGITUDE_COLUMN,
    TEMPERATURE_COLUMN,
];

const COLUMN_RENAMES: [(&str, &str); 2] = [
    (TIME_COORDINATE, TIME_COLUMN),
    (TEMPERATURE_FIELD, TEMPERATURE_COLUMN),
];

pub const CSV_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reads the grid file at `input_path`, converts it and writes the CSV table to `output_path`.
///
/// Returns the names of the columns written. A missing input is reported before anything is
/// created at `output_path`.
pub fn process_temperature_data(
    input_path: &Path,
    output_path: &Path,
) -> Result<Vec<String>, TabulateError> {
    if !input_path.exists() {
        return Err(TabulateError::MissingInput(input_path.to_path_buf()));
    }
    info!("📂 Processing file: {}...", input_path.display());

    let dataset = open_grid(input_path)?;
    let mut table = tabulate(dataset)?;
    write_table(&mut table, output_path)?;

    let columns: Vec<String> = table
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    info!("✅ Success: Data saved to '{}'", output_path.display());
    info!("📊 Columns included: {:?}", columns);
    Ok(columns)
}

pub fn run(config: &TabulateConfig) -> Result<Vec<String>, TabulateError> {
    process_temperature_data(&config.input_path, &config.output_path)
}

/// Converts the temperature field, flattens the grid and keeps the canonical columns.
pub fn tabulate(mut dataset: GridDataset) -> Result<DataFrame, TabulateError> {
    convert_to_celsius(&mut dataset);
    let mut df = dataset.to_dataframe()?;
    rename_columns(&mut df)?;
    Ok(project_columns(&df)?)
}

/// Subtracts [`KELVIN_OFFSET`] from the temperature field in place. Returns `false` (and
/// changes nothing) when the dataset has no temperature field.
pub fn convert_to_celsius(dataset: &mut GridDataset) -> bool {
    match dataset.field_mut(TEMPERATURE_FIELD) {
        Some(field) => {
            field.apply(|kelvin| kelvin - KELVIN_OFFSET);
            field.units = Some("degC".to_string());
            true
        }
        None => {
            debug!(
                "No '{}' field in dataset, skipping unit conversion",
                TEMPERATURE_FIELD
            );
            false
        }
    }
}

/// Maps the service's variable names onto the canonical column names. Absent source columns
/// are ignored.
pub fn rename_columns(df: &mut DataFrame) -> PolarsResult<()> {
    for (from, to) in COLUMN_RENAMES {
        if df.get_column_index(from).is_some() {
            df.rename(from, PlSmallStr::from_str(to))?;
        }
    }
    Ok(())
}

/// Keeps the [`TARGET_COLUMNS`] that exist, silently dropping the ones that don't.
pub fn project_columns(df: &DataFrame) -> PolarsResult<DataFrame> {
    let present: Vec<&str> = TARGET_COLUMNS
        .into_iter()
        .filter(|name| df.get_column_index(name).is_some())
        .collect();
    df.select(present)
}

/// Writes `df` as comma separated text with a header line and no index column, replacing
/// any existing file.
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<(), TabulateError> {
    let mut file =
        File::create(path).map_err(|e| TabulateError::OutputCreate(path.to_path_buf(), e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_datetime_format(Some(CSV_DATETIME_FORMAT.to_string()))
        .finish(df)
        .map_err(|e| TabulateError::CsvWrite(path.to_path_buf(), e))
}
