//! Stage one: download the gridded temperature product for one month and one area.

pub mod client;
pub mod error;
pub mod request;

use crate::config::RetrieveConfig;
use crate::retrieve::client::{CdsClient, DataService};
use crate::retrieve::error::RetrieveError;
use crate::retrieve::request::GridRequest;
use log::info;
use std::path::Path;

/// Requests the 2 m temperature monthly mean by hour of day for `request` from `service`
/// and writes the grid file to `output_path`.
pub async fn fetch_temperature_data<S: DataService>(
    service: &S,
    dataset: &str,
    request: &GridRequest,
    output_path: &Path,
) -> Result<(), RetrieveError> {
    info!(
        "🌡️  1/2: Initiating download for 2m Temperature ({}-{})...",
        request.year, request.month
    );
    service.retrieve(dataset, request, output_path).await?;
    info!("✅ Success: Data saved to '{}'", output_path.display());
    Ok(())
}

/// Runs the retrieval described by `config` against the configured data service.
///
/// Errors are returned to the caller; the `retrieve` binary logs them and still exits
/// successfully, leaving the downstream stages to notice the missing grid file.
pub async fn retrieve(config: &RetrieveConfig) -> Result<(), RetrieveError> {
    let access_key = config
        .access_key
        .as_deref()
        .ok_or(RetrieveError::MissingAccessKey)?;
    let client = CdsClient::new(&config.service_url, access_key)
        .with_poll_interval(config.poll_interval);
    let request = GridRequest::new(config.period, config.bounding_box);
    fetch_temperature_data(&client, &config.dataset, &request, &config.output_path).await
}
