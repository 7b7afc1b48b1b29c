use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("Failed to open grid file '{0}'")]
    Open(PathBuf, #[source] netcdf::Error),

    #[error("Failed to read variable '{variable}'")]
    VariableRead {
        variable: String,
        #[source]
        source: netcdf::Error,
    },

    #[error("Variable '{variable}' has {found} values but its dimensions hold {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        found: usize,
    },

    #[error("Variable '{variable}' refers to unknown dimension '{dimension}'")]
    UnknownDimension { variable: String, dimension: String },

    #[error("Cannot decode value {value} of '{variable}' with time units '{units}'")]
    TimeDecode {
        variable: String,
        units: String,
        value: f64,
    },

    #[error("Failed building the flat table: {0}")]
    DataFrame(#[from] PolarsError),
}
