use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("No access key configured for the data service (set CDS_API_KEY or --key)")]
    MissingAccessKey,

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response body from {0}")]
    ResponseDecode(String, #[source] reqwest::Error),

    #[error("Job {job_id} ended with status '{status}': {detail}")]
    JobFailed {
        job_id: String,
        status: String,
        detail: String,
    },

    #[error("Job {0} finished without a downloadable asset")]
    MissingAsset(String),

    #[error("Failed to write downloaded data to '{0}'")]
    OutputWrite(PathBuf, #[source] std::io::Error),
}
