use crate::grid::error::GridError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabulateError {
    #[error("The file '{0}' was not found")]
    MissingInput(PathBuf),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Failed to create output file '{0}'")]
    OutputCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed writing CSV to '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),
}
