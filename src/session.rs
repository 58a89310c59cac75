//! The session driver: wires the pure controller to a Job Service and a screen.
//!
//! [`Session::apply`] feeds one event through [`crate::panel::update`],
//! renders the resulting view, and executes the returned commands. Commands
//! that talk to the service produce follow-up events (an upload produces
//! `UploadFinished`, a status fetch produces `StatusFetched`, …) which are
//! processed in the same call, so by the time `apply` returns the UI has
//! fully re-synchronised — including the mandatory status refresh after
//! every error.
//!
//! ## Poll loop
//!
//! The timer is owned here, not in the pure state: `StartPolling` and
//! `StopPolling` commands arm and disarm a flag, and [`Session::poll_until_done`]
//! runs a `tokio::time::interval` against it. Each tick awaits its `/status`
//! response before the next tick fires (`MissedTickBehavior::Delay`), so a
//! slow server stretches the cadence instead of stacking overlapping
//! requests.

use crate::config::PanelConfig;
use crate::error::PanelError;
use crate::panel::{update, Command, PanelEvent, PanelState, PanelView};
use crate::screen::PanelScreen;
use crate::service::JobService;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// How a full run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The job produced a result and it was saved to this path.
    ResultSaved(PathBuf),
    /// The job finished without a downloadable result (its logs tell why).
    NoResult { logs: Vec<String> },
}

/// One control-panel session against one Job Service.
pub struct Session<'a> {
    service: &'a dyn JobService,
    screen: &'a dyn PanelScreen,
    config: &'a PanelConfig,
    state: PanelState,
    /// Armed by `StartPolling`, disarmed by `StopPolling`.
    timer_active: bool,
    /// Most recent alert text, for callers that need to fail loudly.
    last_alert: Option<String>,
}

impl<'a> Session<'a> {
    pub fn new(
        service: &'a dyn JobService,
        screen: &'a dyn PanelScreen,
        config: &'a PanelConfig,
    ) -> Self {
        Self {
            service,
            screen,
            config,
            state: PanelState::new(config.messages.clone()),
            timer_active: false,
            last_alert: None,
        }
    }

    /// Current view of the panel.
    pub fn view(&self) -> PanelView {
        self.state.view()
    }

    /// The alert produced by the most recent `apply`, if any.
    pub fn last_alert(&self) -> Option<&str> {
        self.last_alert.as_deref()
    }

    /// Fetch `/status` once and reflect it (the "on load" refresh).
    pub async fn refresh(&mut self) {
        let event = self.status_event().await;
        self.apply(event).await;
    }

    /// Apply one event and every follow-up it triggers.
    pub async fn apply(&mut self, event: PanelEvent) {
        self.last_alert = None;
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            debug!("panel event: {event:?}");
            let (state, commands) = update(std::mem::take(&mut self.state), event);
            self.state = state;
            self.screen.render(&self.state.view());

            for command in commands {
                match command {
                    Command::Alert(message) => {
                        self.screen.alert(&message);
                        self.last_alert = Some(message);
                    }
                    Command::FetchStatus => {
                        let event = self.status_event().await;
                        queue.push_back(event);
                    }
                    Command::SendUpload(files) => {
                        let event = match self.service.upload(&files).await {
                            Ok(receipt) => PanelEvent::UploadFinished(Ok(receipt)),
                            Err(e) => PanelEvent::UploadFinished(Err(e.alert_text())),
                        };
                        queue.push_back(event);
                    }
                    Command::SendStart => {
                        let event = match self.service.start().await {
                            Ok(receipt) => {
                                debug!("job id: {:?}", receipt.job_id);
                                PanelEvent::StartFinished(Ok(()))
                            }
                            Err(e) => PanelEvent::StartFinished(Err(e.alert_text())),
                        };
                        queue.push_back(event);
                    }
                    Command::SendDownload => {
                        let event = self.download_and_save().await;
                        queue.push_back(event);
                    }
                    Command::SendReset => {
                        // Response ignored by contract; a failed reset only
                        // means stale server-side files, which the next
                        // upload clears anyway.
                        if let Err(e) = self.service.reset().await {
                            debug!("reset not delivered: {e}");
                        }
                    }
                    Command::StartPolling => self.timer_active = true,
                    Command::StopPolling => self.timer_active = false,
                }
            }
        }
    }

    /// Run the poll loop until a status fetch reports the job is no longer
    /// running. Does nothing when no timer is armed.
    pub async fn poll_until_done(&mut self) {
        if !self.timer_active {
            return;
        }
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; consume it so the
        // first poll lands one cadence after start.
        interval.tick().await;

        while self.timer_active {
            interval.tick().await;
            let event = self.status_event().await;
            self.apply(event).await;
        }
        info!("poll loop finished");
    }

    /// Drive a complete session: pick → upload → start → poll → download.
    ///
    /// Fails fast when upload or start are rejected (the alert text becomes
    /// the error); a job that finishes without a result is not an error —
    /// callers get [`SessionOutcome::NoResult`] with the server logs.
    pub async fn run_job(&mut self, files: Vec<PathBuf>) -> Result<SessionOutcome, PanelError> {
        self.refresh().await;

        self.apply(PanelEvent::FilesPicked(files)).await;
        self.apply(PanelEvent::UploadClicked).await;
        if let Some(alert) = self.last_alert.take() {
            return Err(PanelError::ServiceRejected { message: alert });
        }
        if !self.view().start_enabled {
            return Err(PanelError::ServiceRejected {
                message: self.config.messages.generic_error.clone(),
            });
        }

        self.apply(PanelEvent::StartClicked).await;
        if let Some(alert) = self.last_alert.take() {
            return Err(PanelError::ServiceRejected { message: alert });
        }

        self.poll_until_done().await;

        if !self.view().download_enabled {
            return Ok(SessionOutcome::NoResult {
                logs: self.view().logs,
            });
        }

        self.apply(PanelEvent::DownloadClicked).await;
        if let Some(alert) = self.last_alert.take() {
            return Err(PanelError::ServiceRejected { message: alert });
        }
        Ok(SessionOutcome::ResultSaved(self.config.result_path.clone()))
    }

    /// Attach to an already-running job: refresh once and, when the server
    /// reports a running job, poll until it finishes.
    pub async fn watch(&mut self) {
        self.refresh().await;
        let running = self
            .state
            .last_status()
            .map(|s| s.running)
            .unwrap_or(false);
        if running {
            // Arming the loop goes through the controller, same as a start.
            self.apply(PanelEvent::StartFinished(Ok(()))).await;
            self.poll_until_done().await;
        }
    }

    /// Best-effort shutdown notification; never blocks teardown for longer
    /// than the configured ceiling and swallows every failure.
    pub async fn notify_shutdown(&self) {
        self.service.shutdown().await;
    }

    async fn status_event(&self) -> PanelEvent {
        match self.service.status().await {
            Ok(status) => PanelEvent::StatusFetched(status),
            Err(e) => PanelEvent::StatusFailed(e.alert_text()),
        }
    }

    async fn download_and_save(&self) -> PanelEvent {
        match self.service.download().await {
            Ok(bytes) => match save_result(&self.config.result_path, &bytes).await {
                Ok(()) => {
                    self.screen.result_saved(&self.config.result_path);
                    PanelEvent::DownloadFinished(Ok(()))
                }
                Err(e) => PanelEvent::DownloadFinished(Err(e.to_string())),
            },
            Err(e) => PanelEvent::DownloadFinished(Err(e.alert_text())),
        }
    }
}

/// Atomic write: temp file in the target directory, then rename.
pub async fn save_result(path: &Path, bytes: &[u8]) -> Result<(), PanelError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PanelError::ResultWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("xlsx.tmp");
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| PanelError::ResultWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| PanelError::ResultWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("result saved: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_result_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/result.xlsx");
        save_result(&path, b"PK\x03\x04fake").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"PK\x03\x04fake");
    }

    #[tokio::test]
    async fn save_result_replaces_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.xlsx");
        save_result(&path, b"old").await.unwrap();
        save_result(&path, b"new").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"new");
        // No stray temp file left behind.
        assert!(!path.with_extension("xlsx.tmp").exists());
    }
}
