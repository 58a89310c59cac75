//! HTTP client for the Job Service.
//!
//! The wire contract is small and fixed: six endpoints, JSON in and out
//! (except the binary `/download` body). [`JobService`] is the seam the
//! session driver works against; [`HttpJobService`] is the reqwest
//! implementation. Tests substitute their own `JobService` or point the
//! real client at a mock server.
//!
//! ## Contract
//!
//! | Endpoint    | Method | Success response                        |
//! |-------------|--------|-----------------------------------------|
//! | `/status`   | GET    | `{running, uploaded, has_result, logs}` |
//! | `/upload`   | POST   | `{ok: true, count}` / `{ok: false, error}` |
//! | `/start`    | POST   | `{ok: true, job_id}` / `{ok: false, error}` |
//! | `/download` | GET    | binary xlsx; non-2xx carries `{error}`  |
//! | `/reset`    | POST   | ignored                                 |
//! | `/shutdown` | POST   | not awaited beyond a short ceiling      |
//!
//! The service reports errors two ways and the client tolerates both: a
//! 2xx-or-not JSON ack with `ok: false`, and (for `/download`) a bare
//! non-2xx status with a best-effort `{error}` body.

use crate::config::PanelConfig;
use crate::error::PanelError;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Snapshot of the server-side job state, fetched on every poll.
///
/// Never cached beyond the current render: the panel is a passive reflector
/// of whatever the last `/status` said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    /// A job is currently executing.
    pub running: bool,
    /// Count of files the server has accepted.
    #[serde(default)]
    pub uploaded: u32,
    /// A finished result is available for download.
    #[serde(default)]
    pub has_result: bool,
    /// Full server-side log, replacing the visible log wholesale.
    /// The server truncates to its last 800 lines; no client-side cap.
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Acknowledgement for `/upload`: the count of accepted PDFs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub count: Option<u32>,
}

/// Acknowledgement for `/start`: the server-assigned job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReceipt {
    pub job_id: Option<String>,
}

/// Generic `{ok, error, ...}` acknowledgement body.
#[derive(Debug, Deserialize)]
struct JobAck {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    job_id: Option<String>,
}

/// Best-effort `{error}` body returned by `/download` on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// The Job Service seam.
///
/// One method per endpoint; implementations own all transport concerns.
/// `shutdown` is infallible by contract — it swallows every failure.
#[async_trait]
pub trait JobService: Send + Sync {
    async fn status(&self) -> Result<JobStatus, PanelError>;
    async fn upload(&self, files: &[PathBuf]) -> Result<UploadReceipt, PanelError>;
    async fn start(&self) -> Result<StartReceipt, PanelError>;
    async fn download(&self) -> Result<Vec<u8>, PanelError>;
    async fn reset(&self) -> Result<(), PanelError>;
    async fn shutdown(&self);
}

/// reqwest-backed [`JobService`].
#[derive(Debug, Clone)]
pub struct HttpJobService {
    client: reqwest::Client,
    base_url: String,
    download_timeout: Duration,
    shutdown_timeout: Duration,
}

impl HttpJobService {
    /// Build a client for the service at `config.base_url`.
    ///
    /// No blanket request timeout is applied: only the download (which can
    /// be arbitrarily large) and the shutdown notification (which must not
    /// delay teardown) carry explicit ceilings.
    pub fn new(config: &PanelConfig) -> Result<Self, PanelError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| PanelError::Transport {
                endpoint: "/",
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a POST and interpret the `{ok, error}` ack, tolerating non-2xx
    /// statuses as long as the body is a parseable ack (the service pairs
    /// `ok: false` with 4xx).
    async fn post_ack(&self, endpoint: &'static str) -> Result<JobAck, PanelError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status();
        match response.json::<JobAck>().await {
            Ok(ack) if ack.ok => Ok(ack),
            Ok(ack) => Err(PanelError::ServiceRejected {
                message: ack.error.unwrap_or_default(),
            }),
            Err(_) => Err(PanelError::UnexpectedResponse {
                endpoint,
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl JobService for HttpJobService {
    async fn status(&self) -> Result<JobStatus, PanelError> {
        let response = self
            .client
            .get(self.url("/status"))
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| transport_error("/status", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PanelError::UnexpectedResponse {
                endpoint: "/status",
                status: status.as_u16(),
            });
        }
        response
            .json::<JobStatus>()
            .await
            .map_err(|_| PanelError::UnexpectedResponse {
                endpoint: "/status",
                status: status.as_u16(),
            })
    }

    async fn upload(&self, files: &[PathBuf]) -> Result<UploadReceipt, PanelError> {
        let mut form = reqwest::multipart::Form::new();
        for path in files {
            let bytes = read_file(path).await?;
            let name = file_name(path);
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(name)
                .mime_str("application/pdf")
                .map_err(|e| PanelError::Transport {
                    endpoint: "/upload",
                    reason: e.to_string(),
                })?;
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error("/upload", e))?;

        let status = response.status();
        match response.json::<JobAck>().await {
            Ok(ack) if ack.ok => {
                debug!("Upload accepted: {:?} files", ack.count);
                Ok(UploadReceipt { count: ack.count })
            }
            Ok(ack) => Err(PanelError::ServiceRejected {
                message: ack.error.unwrap_or_default(),
            }),
            Err(_) => Err(PanelError::UnexpectedResponse {
                endpoint: "/upload",
                status: status.as_u16(),
            }),
        }
    }

    async fn start(&self) -> Result<StartReceipt, PanelError> {
        let ack = self.post_ack("/start").await?;
        debug!("Job started: {:?}", ack.job_id);
        Ok(StartReceipt { job_id: ack.job_id })
    }

    async fn download(&self) -> Result<Vec<u8>, PanelError> {
        let response = self
            .client
            .get(self.url("/download"))
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| transport_error("/download", e))?;

        let status = response.status();
        if !status.is_success() {
            // Parse the error body best-effort; a non-JSON body is tolerated.
            let message = response
                .text()
                .await
                .ok()
                .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
                .and_then(|body| body.error);
            return Err(PanelError::DownloadRejected {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error("/download", e))?;
        debug!("Downloaded result: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn reset(&self) -> Result<(), PanelError> {
        // The response body is ignored by contract.
        self.client
            .post(self.url("/reset"))
            .send()
            .await
            .map_err(|e| transport_error("/reset", e))?;
        Ok(())
    }

    async fn shutdown(&self) {
        let result = self
            .client
            .post(self.url("/shutdown"))
            .json(&serde_json::json!({}))
            .timeout(self.shutdown_timeout)
            .send()
            .await;
        if let Err(e) = result {
            // Best-effort by contract: the tab is closing, nobody is listening.
            warn!("Shutdown notification not delivered: {e}");
        }
    }
}

fn transport_error(endpoint: &'static str, err: reqwest::Error) -> PanelError {
    PanelError::Transport {
        endpoint,
        reason: err.to_string(),
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, PanelError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PanelError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(PanelError::FileReadFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file.pdf".to_string())
}
