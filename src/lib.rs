pub mod config;
mod error;
pub mod grid;
pub mod render;
pub mod retrieve;
pub mod tabulate;

pub use error::{ConfigError, PipelineError};

pub use config::*;

pub use grid::netcdf_reader::open_grid;
pub use grid::{Coordinate, CoordinateValues, Dimension, GridDataset, GridField};
pub use render::{load_data, plot_spatial_heatmap, plot_time_series};
pub use retrieve::client::{CdsClient, DataService};
pub use retrieve::fetch_temperature_data;
pub use retrieve::request::GridRequest;
pub use tabulate::process_temperature_data;

pub use grid::error::GridError;
pub use render::error::RenderError;
pub use retrieve::error::RetrieveError;
pub use tabulate::error::TabulateError;
