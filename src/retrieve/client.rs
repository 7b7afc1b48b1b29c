//! Client for the Copernicus data store "retrieve v1" job API.
//!
//! A retrieval is a job: the request is submitted, the job is polled until the service has
//! produced the file, and the resulting asset is downloaded. The whole exchange happens inside
//! one [`DataService::retrieve`] call, which only returns once the file is on disk (or the job
//! failed).

use crate::retrieve::error::RetrieveError;
use crate::retrieve::request::GridRequest;
use futures_util::StreamExt;
use log::{debug, info, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const AUTH_HEADER: &str = "PRIVATE-TOKEN";

/// A remote service able to turn a [`GridRequest`] into a grid file on local storage.
pub trait DataService {
    /// Retrieves `request` from the product `dataset` and writes the result to `target`,
    /// overwriting any existing file.
    fn retrieve(
        &self,
        dataset: &str,
        request: &GridRequest,
        target: &Path,
    ) -> impl Future<Output = Result<(), RetrieveError>> + Send;
}

pub struct CdsClient {
    base_url: String,
    access_key: String,
    poll_interval: Duration,
    http: Client,
}

#[derive(Serialize)]
struct Execution<'a> {
    inputs: &'a GridRequest,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobStatus {
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: JobState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum JobState {
    Accepted,
    Running,
    Successful,
    Failed,
    Rejected,
    Dismissed,
    #[serde(other)]
    Unknown,
}

impl JobState {
    fn name(self) -> &'static str {
        match self {
            JobState::Accepted => "accepted",
            JobState::Running => "running",
            JobState::Successful => "successful",
            JobState::Failed => "failed",
            JobState::Rejected => "rejected",
            JobState::Dismissed => "dismissed",
            JobState::Unknown => "unknown",
        }
    }

    fn is_terminal_failure(self) -> bool {
        matches!(
            self,
            JobState::Failed | JobState::Rejected | JobState::Dismissed
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobResults {
    pub asset: Option<Asset>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Asset {
    pub value: AssetValue,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssetValue {
    pub href: String,
    #[serde(rename = "file:size")]
    pub size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDocument {
    title: Option<String>,
    detail: Option<String>,
}

impl ErrorDocument {
    fn describe(self) -> String {
        match (self.title, self.detail) {
            (Some(title), Some(detail)) => format!("{title}: {detail}"),
            (Some(message), None) | (None, Some(message)) => message,
            (None, None) => "no details reported by the service".to_string(),
        }
    }
}

impl CdsClient {
    pub fn new(base_url: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_key: access_key.into(),
            poll_interval: crate::config::DEFAULT_POLL_INTERVAL,
            http: Client::new(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub(crate) fn execution_url(&self, dataset: &str) -> String {
        format!(
            "{}/retrieve/v1/processes/{}/execution",
            self.base_url, dataset
        )
    }

    pub(crate) fn job_url(&self, job_id: &str) -> String {
        format!("{}/retrieve/v1/jobs/{}", self.base_url, job_id)
    }

    pub(crate) fn results_url(&self, job_id: &str) -> String {
        format!("{}/results", self.job_url(job_id))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTH_HEADER, &self.access_key)
    }

    /// Sends a request and turns transport errors and non-2xx statuses into [`RetrieveError`]s.
    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Response, RetrieveError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RetrieveError::NetworkRequest(url.to_string(), e))?;

        match response.error_for_status() {
            Ok(resp) => Ok(resp),
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                Err(if let Some(status) = e.status() {
                    RetrieveError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    RetrieveError::NetworkRequest(url.to_string(), e)
                })
            }
        }
    }

    async fn submit(&self, dataset: &str, request: &GridRequest) -> Result<JobStatus, RetrieveError> {
        let url = self.execution_url(dataset);
        info!("Submitting request for {} to {}", dataset, url);
        let builder = self
            .authorized(self.http.post(&url))
            .json(&Execution { inputs: request });
        self.send(builder, &url)
            .await?
            .json::<JobStatus>()
            .await
            .map_err(|e| RetrieveError::ResponseDecode(url, e))
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus, RetrieveError> {
        let url = self.job_url(job_id);
        self.send(self.authorized(self.http.get(&url)), &url)
            .await?
            .json::<JobStatus>()
            .await
            .map_err(|e| RetrieveError::ResponseDecode(url, e))
    }

    /// Polls the job until the service reports success. Blocks for as long as the service
    /// takes; there is no client-side deadline.
    async fn wait_for(&self, mut job: JobStatus) -> Result<(), RetrieveError> {
        let mut last_state = job.status;
        info!("Job {} is {}", job.job_id, last_state.name());
        loop {
            if job.status == JobState::Successful {
                return Ok(());
            }
            if job.status.is_terminal_failure() {
                let detail = self.failure_detail(&job.job_id).await;
                return Err(RetrieveError::JobFailed {
                    job_id: job.job_id,
                    status: job.status.name().to_string(),
                    detail,
                });
            }

            tokio::time::sleep(self.poll_interval).await;
            job = self.status(&job.job_id).await?;
            if job.status != last_state {
                info!("Job {} is {}", job.job_id, job.status.name());
                last_state = job.status;
            } else {
                debug!("Job {} still {}", job.job_id, job.status.name());
            }
        }
    }

    /// Best effort: the results endpoint of a failed job carries the service's error report.
    async fn failure_detail(&self, job_id: &str) -> String {
        let url = self.results_url(job_id);
        let document = match self.authorized(self.http.get(&url)).send().await {
            Ok(response) => response.json::<ErrorDocument>().await.unwrap_or_default(),
            Err(e) => {
                debug!("Could not fetch failure report from {}: {}", url, e);
                ErrorDocument::default()
            }
        };
        document.describe()
    }

    async fn asset(&self, job_id: &str) -> Result<AssetValue, RetrieveError> {
        let url = self.results_url(job_id);
        let results = self
            .send(self.authorized(self.http.get(&url)), &url)
            .await?
            .json::<JobResults>()
            .await
            .map_err(|e| RetrieveError::ResponseDecode(url, e))?;
        results
            .asset
            .map(|asset| asset.value)
            .ok_or_else(|| RetrieveError::MissingAsset(job_id.to_string()))
    }

    /// Streams the asset to `target`. A failure halfway leaves the partial file in place.
    async fn download(&self, href: &str, target: &Path) -> Result<u64, RetrieveError> {
        info!("Downloading result from {}", href);
        let response = self.send(self.http.get(href), href).await?;

        let mut file = fs::File::create(target)
            .await
            .map_err(|e| RetrieveError::OutputWrite(target.to_path_buf(), e))?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| RetrieveError::NetworkRequest(href.to_string(), e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| RetrieveError::OutputWrite(target.to_path_buf(), e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| RetrieveError::OutputWrite(target.to_path_buf(), e))?;
        Ok(written)
    }
}

impl DataService for CdsClient {
    async fn retrieve(
        &self,
        dataset: &str,
        request: &GridRequest,
        target: &Path,
    ) -> Result<(), RetrieveError> {
        let job = self.submit(dataset, request).await?;
        let job_id = job.job_id.clone();
        self.wait_for(job).await?;

        let asset = self.asset(&job_id).await?;
        if let Some(size) = asset.size {
            debug!("Job {} produced {} bytes", job_id, size);
        }
        let written = self.download(&asset.href, target).await?;
        info!(
            "Wrote {} bytes for job {} to {}",
            written,
            job_id,
            target.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_urls() {
        let client = CdsClient::new("https://ads.example.eu/api/", "key");
        assert_eq!(
            client.execution_url("cams-global-reanalysis-eac4-monthly"),
            "https://ads.example.eu/api/retrieve/v1/processes/cams-global-reanalysis-eac4-monthly/execution"
        );
        assert_eq!(
            client.job_url("abc-123"),
            "https://ads.example.eu/api/retrieve/v1/jobs/abc-123"
        );
        assert_eq!(
            client.results_url("abc-123"),
            "https://ads.example.eu/api/retrieve/v1/jobs/abc-123/results"
        );
    }

    #[test]
    fn test_job_status_decoding() -> Result<(), serde_json::Error> {
        let job: JobStatus = serde_json::from_str(
            r#"{"processID": "cams", "type": "process", "jobID": "abc-123", "status": "accepted"}"#,
        )?;
        assert_eq!(job.job_id, "abc-123");
        assert_eq!(job.status, JobState::Accepted);

        let job: JobStatus = serde_json::from_str(r#"{"jobID": "x", "status": "paused"}"#)?;
        assert_eq!(job.status, JobState::Unknown);
        assert!(!job.status.is_terminal_failure());

        let job: JobStatus = serde_json::from_str(r#"{"jobID": "x", "status": "dismissed"}"#)?;
        assert!(job.status.is_terminal_failure());
        Ok(())
    }

    #[test]
    fn test_results_decoding() -> Result<(), serde_json::Error> {
        let results: JobResults = serde_json::from_str(
            r#"{"asset": {"value": {"type": "application/netcdf",
                "href": "https://download.example.eu/cache/abc.nc", "file:size": 2048}}}"#,
        )?;
        let value = results.asset.map(|a| a.value);
        assert_eq!(
            value.as_ref().map(|v| v.href.as_str()),
            Some("https://download.example.eu/cache/abc.nc")
        );
        assert_eq!(value.and_then(|v| v.size), Some(2048));

        let empty: JobResults = serde_json::from_str("{}")?;
        assert!(empty.asset.is_none());
        Ok(())
    }

    #[test]
    fn test_error_document_description() -> Result<(), serde_json::Error> {
        let doc: ErrorDocument =
            serde_json::from_str(r#"{"title": "The job failed", "detail": "area too small"}"#)?;
        assert_eq!(doc.describe(), "The job failed: area too small");
        assert_eq!(
            ErrorDocument::default().describe(),
            "no details reported by the service"
        );
        Ok(())
    }

    #[test]
    fn test_execution_body_wraps_inputs() -> Result<(), serde_json::Error> {
        let request = GridRequest::new(crate::config::JULY_2023, crate::config::SAVOIE);
        let body = serde_json::to_value(Execution { inputs: &request })?;
        assert_eq!(body["inputs"]["month"], "07");
        assert_eq!(body["inputs"]["area"][1], 5.5);
        Ok(())
    }

    /// Minimal HTTP/1.1 server answering from queued responses, one connection per request.
    mod mock {
        use std::collections::{HashMap, VecDeque};
        use std::sync::{Arc, Mutex};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::{TcpListener, TcpStream};

        #[derive(Debug, Clone)]
        pub struct Recorded {
            pub method: String,
            pub path: String,
            pub headers: HashMap<String, String>,
            pub body: String,
        }

        type Routes = HashMap<String, VecDeque<(u16, Vec<u8>)>>;

        pub struct MockServer {
            pub base: String,
            routes: Arc<Mutex<Routes>>,
            requests: Arc<Mutex<Vec<Recorded>>>,
        }

        impl MockServer {
            pub async fn start() -> std::io::Result<Self> {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let base = format!("http://{}", listener.local_addr()?);
                let routes = Arc::new(Mutex::new(Routes::new()));
                let requests = Arc::new(Mutex::new(Vec::new()));

                let (shared_routes, shared_requests) = (routes.clone(), requests.clone());
                tokio::spawn(async move {
                    while let Ok((stream, _)) = listener.accept().await {
                        tokio::spawn(handle(stream, shared_routes.clone(), shared_requests.clone()));
                    }
                });
                Ok(Self {
                    base,
                    routes,
                    requests,
                })
            }

            /// Answers `method path` with `responses` in order; the last one repeats.
            pub fn route(&self, method: &str, path: &str, responses: Vec<(u16, Vec<u8>)>) {
                self.routes
                    .lock()
                    .unwrap()
                    .insert(format!("{method} {path}"), responses.into());
            }

            pub fn requests(&self) -> Vec<Recorded> {
                self.requests.lock().unwrap().clone()
            }
        }

        fn header_end(buf: &[u8]) -> Option<usize> {
            buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
        }

        async fn handle(
            mut stream: TcpStream,
            routes: Arc<Mutex<Routes>>,
            requests: Arc<Mutex<Vec<Recorded>>>,
        ) {
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let end = loop {
                if let Some(end) = header_end(&buf) {
                    break end;
                }
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            };

            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let mut lines = head.lines();
            let mut request_line = lines.next().unwrap_or_default().split_whitespace();
            let method = request_line.next().unwrap_or_default().to_string();
            let path = request_line.next().unwrap_or_default().to_string();
            let headers: HashMap<String, String> = lines
                .filter_map(|line| line.split_once(':'))
                .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
                .collect();

            let length = headers
                .get("content-length")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + length {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            let body_end = buf.len().min(end + length);
            let body = String::from_utf8_lossy(&buf[end..body_end]).to_string();

            let (status, payload) = {
                let mut routes = routes.lock().unwrap();
                match routes.get_mut(&format!("{method} {path}")) {
                    Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                    Some(queue) => queue.front().cloned().unwrap_or((500, Vec::new())),
                    None => (404, b"{}".to_vec()),
                }
            };
            requests.lock().unwrap().push(Recorded {
                method,
                path,
                headers,
                body,
            });

            let head = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                payload.len()
            );
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(&payload).await;
            let _ = stream.shutdown().await;
        }
    }

    use mock::MockServer;

    const EXECUTION_PATH: &str = "/api/retrieve/v1/processes/ds/execution";
    const JOB_PATH: &str = "/api/retrieve/v1/jobs/j1";
    const RESULTS_PATH: &str = "/api/retrieve/v1/jobs/j1/results";

    fn job(status: &str) -> (u16, Vec<u8>) {
        (200, format!(r#"{{"jobID": "j1", "status": "{status}"}}"#).into_bytes())
    }

    fn client_for(server: &MockServer) -> CdsClient {
        CdsClient::new(format!("{}/api", server.base), "secret")
            .with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_retrieve_polls_until_successful_then_downloads(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await?;
        server.route("POST", EXECUTION_PATH, vec![(201, job("accepted").1)]);
        server.route("GET", JOB_PATH, vec![job("running"), job("successful")]);
        let results = format!(
            r#"{{"asset": {{"value": {{"href": "{}/download/j1.nc", "file:size": 4}}}}}}"#,
            server.base
        );
        server.route("GET", RESULTS_PATH, vec![(200, results.into_bytes())]);
        server.route("GET", "/download/j1.nc", vec![(200, vec![67, 68, 70, 1])]);

        let dir = tempfile::tempdir()?;
        let target = dir.path().join("temperature.nc");
        let request = GridRequest::new(crate::config::JULY_2023, crate::config::SAVOIE);

        client_for(&server)
            .retrieve("ds", &request, &target)
            .await?;

        assert_eq!(std::fs::read(&target)?, [67, 68, 70, 1]);

        let requests = server.requests();
        let submit = requests.first().ok_or("no request received")?;
        assert_eq!(submit.method, "POST");
        assert_eq!(submit.path, EXECUTION_PATH);
        assert_eq!(
            submit.headers.get("private-token").map(String::as_str),
            Some("secret")
        );
        let body: serde_json::Value = serde_json::from_str(&submit.body)?;
        assert_eq!(body["inputs"]["variable"], "2m_temperature");
        assert_eq!(body["inputs"]["year"], "2023");

        assert_eq!(requests.iter().filter(|r| r.path == JOB_PATH).count(), 2);
        assert!(requests
            .iter()
            .filter(|r| r.path.starts_with("/api/"))
            .all(|r| r.headers.contains_key("private-token")));
        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_failed_job_reports_service_detail(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await?;
        server.route("POST", EXECUTION_PATH, vec![job("accepted")]);
        server.route("GET", JOB_PATH, vec![job("running"), job("failed")]);
        server.route(
            "GET",
            RESULTS_PATH,
            vec![(
                400,
                br#"{"title": "The job failed", "detail": "bad area"}"#.to_vec(),
            )],
        );

        let dir = tempfile::tempdir()?;
        let target = dir.path().join("temperature.nc");
        let request = GridRequest::new(crate::config::JULY_2023, crate::config::SAVOIE);

        let result = client_for(&server)
            .retrieve("ds", &request, &target)
            .await;

        match result {
            Err(RetrieveError::JobFailed {
                job_id,
                status,
                detail,
            }) => {
                assert_eq!(job_id, "j1");
                assert_eq!(status, "failed");
                assert_eq!(detail, "The job failed: bad area");
            }
            other => panic!("expected a failed job, got {other:?}"),
        }
        assert!(!target.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_retrieve_maps_rejected_submission_to_http_status(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start().await?;
        server.route("POST", EXECUTION_PATH, vec![(401, b"{}".to_vec())]);

        let dir = tempfile::tempdir()?;
        let target = dir.path().join("temperature.nc");
        let request = GridRequest::new(crate::config::JULY_2023, crate::config::SAVOIE);

        let result = client_for(&server)
            .retrieve("ds", &request, &target)
            .await;

        match result {
            Err(RetrieveError::HttpStatus { url, status, .. }) => {
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
                assert!(url.ends_with(EXECUTION_PATH), "{url}");
            }
            other => panic!("expected an HTTP status error, got {other:?}"),
        }
        assert!(!target.exists());
        assert_eq!(server.requests().len(), 1);
        Ok(())
    }
}
