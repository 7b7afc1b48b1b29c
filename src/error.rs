use crate::render::error::RenderError;
use crate::retrieve::error::RetrieveError;
use crate::tabulate::error::TabulateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Retrieve(#[from] RetrieveError),

    #[error(transparent)]
    Tabulate(#[from] TabulateError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Bounding box needs 4 comma-separated values (north,west,south,east), got {0}")]
    BoundingBoxArity(usize),

    #[error("Invalid bounding box coordinate '{0}'")]
    BoundingBoxValue(String),

    #[error("{option} must be a whole number, got '{value}'")]
    NotANumber { option: &'static str, value: String },

    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("Year must have 4 digits, got {0}")]
    InvalidYear(i32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_stage_errors_keep_their_message() {
        let config: PipelineError = ConfigError::InvalidMonth(13).into();
        assert!(matches!(config, PipelineError::Config(_)));
        assert_eq!(config.to_string(), "Month must be between 1 and 12, got 13");

        let retrieve: PipelineError = RetrieveError::MissingAccessKey.into();
        assert!(matches!(retrieve, PipelineError::Retrieve(_)));

        let tabulate: PipelineError = TabulateError::MissingInput(PathBuf::from("a.nc")).into();
        assert_eq!(tabulate.to_string(), "The file 'a.nc' was not found");

        let render: PipelineError = RenderError::MissingInput(PathBuf::from("b.csv")).into();
        assert!(matches!(render, PipelineError::Render(_)));
    }
}
