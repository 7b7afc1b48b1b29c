use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("File '{0}' not found")]
    MissingInput(PathBuf),

    #[error("Failed to read CSV table '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Cannot parse '{value}' in row {row} as a timestamp")]
    TimeParse { row: usize, value: String },

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Failed drawing '{path}': {message}")]
    Drawing { path: PathBuf, message: String },
}
