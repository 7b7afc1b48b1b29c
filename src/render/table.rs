use crate::render::error::RenderError;
use crate::tabulate::TIME_COLUMN;
use chrono::{NaiveDate, NaiveDateTime};
use log::info;
use polars::prelude::*;
use std::path::Path;

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Loads the CSV table at `path` and turns its `time` column into timestamps.
///
/// Only the existence of the file is checked up front; a missing `latitude` or
/// `Temperature_C` column only surfaces once a plot asks for it.
pub fn load_data(path: &Path) -> Result<DataFrame, RenderError> {
    if !path.exists() {
        return Err(RenderError::MissingInput(path.to_path_buf()));
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| RenderError::CsvRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| RenderError::CsvRead(path.to_path_buf(), e))?;

    let times = parse_time_column(&df)?;
    df.with_column(Column::new(PlSmallStr::from_str(TIME_COLUMN), times))?;
    info!("Loaded {} rows from {}", df.height(), path.display());
    Ok(df)
}

fn parse_time_column(df: &DataFrame) -> Result<Vec<Option<NaiveDateTime>>, RenderError> {
    let column = df.column(TIME_COLUMN)?.cast(&DataType::String)?;
    column
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_timestamp(text)
                .map(Some)
                .ok_or_else(|| RenderError::TimeParse {
                    row,
                    value: text.to_string(),
                }),
        })
        .collect()
}

/// Parses the timestamp layouts a CSV export typically uses; a bare date means midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
