//! Error types for the pdfpanel library.
//!
//! A single fatal enum, [`PanelError`], covers everything the panel can
//! surface to a caller. Two variants deserve a note:
//!
//! * [`PanelError::ServiceRejected`] — the Job Service answered with
//!   `{ok: false, error}`. The message is server-authored and is shown to
//!   the user verbatim (the panel substitutes a generic fallback only when
//!   the server sent an empty one).
//!
//! * [`PanelError::DownloadRejected`] — `/download` returned a non-2xx
//!   status. The error body is parsed best-effort; a malformed or missing
//!   body is tolerated and leaves `message` as `None`.
//!
//! Failures of the best-effort shutdown notification are never represented
//! here: they are swallowed inside the service client by design of the
//! contract.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfpanel library.
#[derive(Debug, Error)]
pub enum PanelError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A selected file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// A selected file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request never produced a usable HTTP response.
    #[error("Request to {endpoint} failed: {reason}\nIs the job service running?")]
    Transport {
        endpoint: &'static str,
        reason: String,
    },

    /// The service answered, but the body was not the expected JSON shape.
    #[error("Unexpected response from {endpoint} (HTTP {status})")]
    UnexpectedResponse {
        endpoint: &'static str,
        status: u16,
    },

    // ── Service errors ────────────────────────────────────────────────────
    /// The service reported a business error: `{ok: false, error}`.
    #[error("Service rejected the request: {message}")]
    ServiceRejected { message: String },

    /// `/download` returned a non-2xx status, with an optional `{error}` body.
    #[error("Download failed (HTTP {status}){}", message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    DownloadRejected {
        status: u16,
        message: Option<String>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the downloaded spreadsheet to disk.
    #[error("Failed to write result file '{path}': {source}")]
    ResultWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PanelError {
    /// The text shown to the user in an alert.
    ///
    /// Server-authored messages pass through verbatim; everything else uses
    /// the full Display form. An empty result means the caller should fall
    /// back to the catalog's generic error string.
    pub fn alert_text(&self) -> String {
        match self {
            PanelError::ServiceRejected { message } => message.clone(),
            PanelError::DownloadRejected { message, .. } => {
                message.clone().unwrap_or_default()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_rejected_display_with_message() {
        let e = PanelError::DownloadRejected {
            status: 500,
            message: Some("no result".into()),
        };
        let msg = e.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("no result"), "got: {msg}");
    }

    #[test]
    fn download_rejected_display_without_message() {
        let e = PanelError::DownloadRejected {
            status: 404,
            message: None,
        };
        assert!(e.to_string().contains("404"));
    }

    #[test]
    fn alert_text_passes_server_message_through() {
        let e = PanelError::ServiceRejected {
            message: "Сначала загрузите PDF".into(),
        };
        assert_eq!(e.alert_text(), "Сначала загрузите PDF");
    }

    #[test]
    fn alert_text_is_empty_when_server_sent_nothing() {
        let e = PanelError::DownloadRejected {
            status: 500,
            message: None,
        };
        assert!(e.alert_text().is_empty());
    }

    #[test]
    fn transport_display_names_endpoint() {
        let e = PanelError::Transport {
            endpoint: "/status",
            reason: "connection refused".into(),
        };
        assert!(e.to_string().contains("/status"));
        assert!(e.to_string().contains("connection refused"));
    }
}
