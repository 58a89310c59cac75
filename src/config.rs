//! Configuration for a panel session.
//!
//! Every knob lives in [`PanelConfig`], built via [`PanelConfigBuilder`].
//! Keeping the whole configuration in one struct makes it trivial to share
//! across the service client and the session driver, and to log a compact
//! summary of a run.
//!
//! # Design choice: builder over constructor
//! The defaults match the service's conventions (700 ms poll cadence,
//! `result.xlsx` output name); callers set only what they need.

use crate::error::PanelError;
use crate::messages::MessageCatalog;
use std::path::PathBuf;
use std::time::Duration;

/// Default Job Service address (the backend's stock bind address).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Default polling cadence of the status loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(700);

/// Fixed local name the result spreadsheet is saved under by default.
pub const DEFAULT_RESULT_FILENAME: &str = "result.xlsx";

/// Configuration for the panel and its HTTP client.
///
/// Built via [`PanelConfig::builder()`] or [`PanelConfig::default()`].
///
/// # Example
/// ```rust
/// use pdfpanel::PanelConfig;
///
/// let config = PanelConfig::builder()
///     .base_url("http://127.0.0.1:8080")
///     .poll_interval_ms(500)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Base URL of the Job Service. Default: `http://127.0.0.1:5000`.
    pub base_url: String,

    /// Poll cadence of the status loop. Default: 700 ms.
    ///
    /// The cadence is fixed, not adaptive. The session driver awaits each
    /// `/status` response before sleeping until the next tick, so a slow
    /// server stretches the effective cadence instead of piling up
    /// overlapping requests.
    pub poll_interval: Duration,

    /// Local path the downloaded spreadsheet is saved to. Default: `result.xlsx`.
    pub result_path: PathBuf,

    /// Timeout for the result download in seconds. Default: 120.
    ///
    /// The other calls carry tiny JSON payloads and use the transport
    /// defaults; the download can be arbitrarily large, so it gets its own
    /// generous ceiling.
    pub download_timeout_secs: u64,

    /// Ceiling on the best-effort shutdown notification in milliseconds.
    /// Default: 1000. The notification must never delay teardown, so it is
    /// abandoned (silently) once this elapses.
    pub shutdown_timeout_ms: u64,

    /// User-facing strings. Default: the built-in Russian catalog.
    pub messages: MessageCatalog,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            result_path: PathBuf::from(DEFAULT_RESULT_FILENAME),
            download_timeout_secs: 120,
            shutdown_timeout_ms: 1000,
            messages: MessageCatalog::default(),
        }
    }
}

impl PanelConfig {
    /// Create a new builder for `PanelConfig`.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PanelConfig`].
#[derive(Debug)]
pub struct PanelConfigBuilder {
    config: PanelConfig,
}

impl PanelConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval = Duration::from_millis(ms.max(50));
        self
    }

    pub fn result_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.result_path = path.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.config.shutdown_timeout_ms = ms.max(1);
        self
    }

    pub fn messages(mut self, catalog: MessageCatalog) -> Self {
        self.config.messages = catalog;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PanelConfig, PanelError> {
        let c = &self.config;
        let url = c.base_url.trim_end_matches('/').to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PanelError::InvalidConfig(format!(
                "Base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.poll_interval.is_zero() {
            return Err(PanelError::InvalidConfig(
                "Poll interval must be non-zero".into(),
            ));
        }
        if c.result_path.as_os_str().is_empty() {
            return Err(PanelError::InvalidConfig(
                "Result path must not be empty".into(),
            ));
        }
        let mut config = self.config;
        config.base_url = url;
        Ok(config)
    }
}
