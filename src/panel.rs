//! The panel controller: a pure state machine.
//!
//! [`update`] applies one [`PanelEvent`] to a [`PanelState`] and returns the
//! new state plus the [`Command`]s the session driver must execute. No I/O
//! happens here, which keeps every enablement rule and every lifecycle
//! transition unit-testable without a server.
//!
//! The controller makes no decisions of its own: enablement and the poll
//! lifecycle are direct projections of the last server-reported
//! [`JobStatus`]. The full machine is
//!
//! ```text
//! {idle} ─upload→ {uploaded} ─start→ {running, polling}
//!        ─server reports done→ {done, has_result} ─download→ {idle}
//! ```
//!
//! Invariants maintained across every event:
//! * `start_enabled  ⇔ !running && uploaded > 0` (after each status fetch)
//! * `download_enabled ⇔ has_result && !running` (after each status fetch)
//! * the polling flag is true only while a job is known to be running, and
//!   a `running: false` status is the sole thing that clears it.

use crate::messages::MessageCatalog;
use crate::service::{JobStatus, UploadReceipt};
use std::path::PathBuf;

/// Everything the panel knows. Owned by one session; never shared.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    messages: MessageCatalog,
    /// Files picked by the user, replaced wholesale on each pick.
    selected: Vec<PathBuf>,
    /// File-name pills rendered since the last upload action.
    pills: Vec<String>,
    /// Visible log, replaced wholesale by every status fetch.
    logs: Vec<String>,
    status_line: String,
    start_enabled: bool,
    download_enabled: bool,
    /// True only while a job is known to be running.
    polling: bool,
    last_status: Option<JobStatus>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new(MessageCatalog::default())
    }
}

impl PanelState {
    /// The pristine initial render: idle status, nothing selected, both
    /// actions disabled.
    pub fn new(messages: MessageCatalog) -> Self {
        let status_line = messages.idle.clone();
        Self {
            messages,
            selected: Vec::new(),
            pills: Vec::new(),
            logs: Vec::new(),
            status_line,
            start_enabled: false,
            download_enabled: false,
            polling: false,
            last_status: None,
        }
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> PanelView {
        PanelView {
            status_line: self.status_line.clone(),
            logs: self.logs.clone(),
            pills: self.pills.clone(),
            start_enabled: self.start_enabled,
            download_enabled: self.download_enabled,
            polling: self.polling,
        }
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    /// The last server-reported status, if any fetch has completed.
    pub fn last_status(&self) -> Option<&JobStatus> {
        self.last_status.as_ref()
    }

    fn restore_pristine(&mut self) {
        *self = PanelState::new(self.messages.clone());
    }
}

/// What a screen needs to render the panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelView {
    pub status_line: String,
    pub logs: Vec<String>,
    pub pills: Vec<String>,
    pub start_enabled: bool,
    pub download_enabled: bool,
    pub polling: bool,
}

/// User intents and service responses, in the order the session sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// User picked files; replaces the selection wholesale. Non-PDF picks
    /// are dropped silently.
    FilesPicked(Vec<PathBuf>),
    /// User activated upload.
    UploadClicked,
    /// The upload request finished. `Err` carries the server message
    /// (possibly empty; the catalog fallback is applied here).
    UploadFinished(Result<UploadReceipt, String>),
    /// User activated start.
    StartClicked,
    /// The start request finished.
    StartFinished(Result<(), String>),
    /// A status fetch succeeded (on load, after errors, or on a poll tick).
    StatusFetched(JobStatus),
    /// A status fetch failed. The loop keeps ticking; recovery is the next tick.
    StatusFailed(String),
    /// User activated download.
    DownloadClicked,
    /// The download finished. `Ok` means the bytes are already saved.
    DownloadFinished(Result<(), String>),
}

/// Side effects for the session driver, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// POST the selected files to `/upload` as multipart form data.
    SendUpload(Vec<PathBuf>),
    /// POST `/start`.
    SendStart,
    /// GET `/status` once and feed the result back.
    FetchStatus,
    /// Begin the repeating poll timer.
    StartPolling,
    /// Cancel the poll timer.
    StopPolling,
    /// GET `/download`, save the result, feed the outcome back.
    SendDownload,
    /// POST `/reset`; the response is ignored.
    SendReset,
    /// Surface a message to the user.
    Alert(String),
}

/// Pure update function: applies an event to state and returns any commands.
pub fn update(mut state: PanelState, event: PanelEvent) -> (PanelState, Vec<Command>) {
    let commands = match event {
        PanelEvent::FilesPicked(paths) => {
            state.selected = paths.into_iter().filter(|p| is_pdf(p)).collect();
            Vec::new()
        }

        PanelEvent::UploadClicked => {
            // Validation short-circuit: no files, no network call, no render change.
            if state.selected.is_empty() {
                return (state, Vec::new());
            }
            state.pills = state.selected.iter().map(|p| pill_name(p)).collect();
            state.status_line = state.messages.uploading.clone();
            state.logs = vec![state.messages.placeholder_log.clone()];
            vec![Command::SendUpload(state.selected.clone())]
        }

        PanelEvent::UploadFinished(Ok(receipt)) => {
            state.start_enabled = true;
            state.download_enabled = false;
            if let Some(count) = receipt.count {
                state.status_line = state.messages.uploaded_line(count);
            }
            vec![Command::FetchStatus]
        }

        PanelEvent::UploadFinished(Err(message)) => vec![
            Command::Alert(state.messages.alert_or_fallback(&message)),
            Command::FetchStatus,
        ],

        PanelEvent::StartClicked => {
            state.start_enabled = false;
            state.download_enabled = false;
            state.status_line = state.messages.starting.clone();
            state.logs = vec![state.messages.placeholder_log.clone()];
            vec![Command::SendStart]
        }

        PanelEvent::StartFinished(Ok(())) => {
            state.polling = true;
            vec![Command::StartPolling]
        }

        PanelEvent::StartFinished(Err(message)) => vec![
            Command::Alert(state.messages.alert_or_fallback(&message)),
            Command::FetchStatus,
        ],

        PanelEvent::StatusFetched(status) => {
            state.logs = status.logs.clone();
            state.status_line = if status.running {
                state.messages.running_line(status.uploaded)
            } else {
                state.messages.idle_line(status.uploaded)
            };
            state.start_enabled = !status.running && status.uploaded > 0;
            state.download_enabled = status.has_result && !status.running;

            let mut commands = Vec::new();
            // The sole termination condition of the poll loop.
            if !status.running && state.polling {
                state.polling = false;
                commands.push(Command::StopPolling);
            }
            state.last_status = Some(status);
            commands
        }

        PanelEvent::StatusFailed(message) => {
            vec![Command::Alert(state.messages.alert_or_fallback(&message))]
        }

        PanelEvent::DownloadClicked => {
            // Disabled before the request leaves, preventing double-clicks.
            state.download_enabled = false;
            state.status_line = state.messages.downloading.clone();
            vec![Command::SendDownload]
        }

        PanelEvent::DownloadFinished(Ok(())) => {
            // Reset server state first, then the pristine initial render.
            state.restore_pristine();
            vec![Command::SendReset]
        }

        PanelEvent::DownloadFinished(Err(message)) => vec![
            Command::Alert(state.messages.alert_or_fallback(&message)),
            Command::FetchStatus,
        ],
    };

    (state, commands)
}

fn is_pdf(path: &PathBuf) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn pill_name(path: &PathBuf) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn initial() -> PanelState {
        PanelState::new(MessageCatalog::default())
    }

    fn status(running: bool, uploaded: u32, has_result: bool, logs: &[&str]) -> JobStatus {
        JobStatus {
            running,
            uploaded,
            has_result,
            logs: logs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn picked(names: &[&str]) -> PanelEvent {
        PanelEvent::FilesPicked(names.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn initial_render_is_idle_with_everything_disabled() {
        let view = initial().view();
        assert!(view.pills.is_empty());
        assert!(view.logs.is_empty());
        assert!(!view.start_enabled);
        assert!(!view.download_enabled);
        assert!(!view.polling);
        assert_eq!(view.status_line, MessageCatalog::default().idle);
    }

    #[test]
    fn upload_with_zero_files_is_a_silent_noop() {
        let state = initial();
        let before = state.view();
        let (state, commands) = update(state, PanelEvent::UploadClicked);
        assert!(commands.is_empty(), "no network call may be issued");
        assert_eq!(state.view(), before, "UI must be unchanged");
    }

    #[test]
    fn picking_files_replaces_the_selection_wholesale() {
        let (state, _) = update(initial(), picked(&["a.pdf", "b.pdf"]));
        let (state, _) = update(state, picked(&["c.pdf"]));
        let (state, commands) = update(state, PanelEvent::UploadClicked);
        assert_eq!(commands, vec![Command::SendUpload(vec!["c.pdf".into()])]);
        assert_eq!(state.view().pills, vec!["c.pdf"]);
    }

    #[test]
    fn non_pdf_picks_are_dropped_silently() {
        let (state, commands) = update(initial(), picked(&["a.pdf", "notes.txt", "B.PDF"]));
        assert!(commands.is_empty());
        let (_, commands) = update(state, PanelEvent::UploadClicked);
        assert_eq!(
            commands,
            vec![Command::SendUpload(vec!["a.pdf".into(), "B.PDF".into()])]
        );
    }

    #[test]
    fn upload_click_renders_pills_status_and_placeholder_log() {
        let (state, _) = update(initial(), picked(&["/tmp/a.pdf", "/tmp/b.pdf"]));
        let (state, commands) = update(state, PanelEvent::UploadClicked);
        let view = state.view();
        assert_eq!(view.pills, vec!["a.pdf", "b.pdf"]);
        assert_eq!(view.status_line, state.messages().uploading);
        assert_eq!(view.logs, vec![state.messages().placeholder_log.clone()]);
        assert!(matches!(commands.as_slice(), [Command::SendUpload(_)]));
    }

    #[test]
    fn successful_upload_enables_start_and_refreshes_status() {
        let (state, _) = update(initial(), picked(&["a.pdf"]));
        let (state, _) = update(state, PanelEvent::UploadClicked);
        let (state, commands) = update(
            state,
            PanelEvent::UploadFinished(Ok(UploadReceipt { count: Some(1) })),
        );
        assert!(state.view().start_enabled);
        assert!(!state.view().download_enabled);
        assert_eq!(commands, vec![Command::FetchStatus]);
    }

    #[test]
    fn failed_upload_alerts_then_refreshes_status() {
        let (state, _) = update(initial(), picked(&["a.pdf"]));
        let (state, _) = update(state, PanelEvent::UploadClicked);
        let (_, commands) = update(
            state,
            PanelEvent::UploadFinished(Err("Файлы не выбраны".into())),
        );
        assert_eq!(
            commands,
            vec![
                Command::Alert("Файлы не выбраны".into()),
                Command::FetchStatus
            ]
        );
    }

    #[test]
    fn blank_server_error_falls_back_to_generic_message() {
        let (_, commands) = update(initial(), PanelEvent::UploadFinished(Err(String::new())));
        assert_eq!(
            commands[0],
            Command::Alert(MessageCatalog::default().generic_error)
        );
    }

    #[test]
    fn start_click_disables_both_actions_before_the_request() {
        let (state, _) = update(initial(), picked(&["a.pdf"]));
        let (state, _) = update(state, PanelEvent::UploadClicked);
        let (state, _) = update(
            state,
            PanelEvent::UploadFinished(Ok(UploadReceipt { count: Some(1) })),
        );
        let (state, commands) = update(state, PanelEvent::StartClicked);
        assert!(!state.view().start_enabled);
        assert!(!state.view().download_enabled);
        assert_eq!(state.view().status_line, state.messages().starting);
        assert_eq!(commands, vec![Command::SendStart]);
    }

    #[test]
    fn successful_start_begins_polling() {
        let (state, commands) = update(initial(), PanelEvent::StartFinished(Ok(())));
        assert!(state.view().polling);
        assert_eq!(commands, vec![Command::StartPolling]);
    }

    #[test]
    fn failed_start_alerts_and_refreshes_without_polling() {
        let (state, commands) = update(
            initial(),
            PanelEvent::StartFinished(Err("Уже выполняется".into())),
        );
        assert!(!state.view().polling);
        assert_eq!(
            commands,
            vec![
                Command::Alert("Уже выполняется".into()),
                Command::FetchStatus
            ]
        );
    }

    #[test]
    fn status_enablement_matches_server_truth() {
        // start_enabled ⇔ !running && uploaded > 0
        // download_enabled ⇔ has_result && !running
        let cases = [
            (status(false, 0, false, &[]), false, false),
            (status(false, 2, false, &[]), true, false),
            (status(true, 2, false, &[]), false, false),
            (status(true, 2, true, &[]), false, false),
            (status(false, 2, true, &[]), true, true),
            (status(false, 0, true, &[]), false, true),
        ];
        for (s, start, download) in cases {
            let (state, _) = update(initial(), PanelEvent::StatusFetched(s.clone()));
            assert_eq!(state.view().start_enabled, start, "status: {s:?}");
            assert_eq!(state.view().download_enabled, download, "status: {s:?}");
        }
    }

    #[test]
    fn status_replaces_logs_wholesale_and_words_by_running_state() {
        let (state, _) = update(
            initial(),
            PanelEvent::StatusFetched(status(true, 2, false, &["old", "lines"])),
        );
        let running_line = state.view().status_line;
        let (state, _) = update(
            state,
            PanelEvent::StatusFetched(status(false, 2, false, &["ready"])),
        );
        assert_eq!(state.view().logs, vec!["ready"]);
        assert_ne!(state.view().status_line, running_line);
        assert!(state.view().status_line.contains('2'));
    }

    #[test]
    fn not_running_status_is_the_sole_poll_terminator() {
        let (state, _) = update(initial(), PanelEvent::StartFinished(Ok(())));
        // Running statuses keep the loop alive.
        let (state, commands) = update(
            state,
            PanelEvent::StatusFetched(status(true, 1, false, &[])),
        );
        assert!(state.view().polling);
        assert!(commands.is_empty());
        // The first not-running status cancels it.
        let (state, commands) = update(
            state,
            PanelEvent::StatusFetched(status(false, 1, true, &[])),
        );
        assert!(!state.view().polling);
        assert_eq!(commands, vec![Command::StopPolling]);
        // A later not-running status does not emit a second stop.
        let (_, commands) = update(
            state,
            PanelEvent::StatusFetched(status(false, 1, true, &[])),
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn download_click_disables_the_control_immediately() {
        let (state, _) = update(
            initial(),
            PanelEvent::StatusFetched(status(false, 1, true, &[])),
        );
        let (state, commands) = update(state, PanelEvent::DownloadClicked);
        assert!(!state.view().download_enabled);
        assert_eq!(state.view().status_line, state.messages().downloading);
        assert_eq!(commands, vec![Command::SendDownload]);
    }

    #[test]
    fn successful_download_resets_server_and_restores_pristine_state() {
        let (state, _) = update(initial(), picked(&["a.pdf"]));
        let (state, _) = update(state, PanelEvent::UploadClicked);
        let (state, _) = update(
            state,
            PanelEvent::StatusFetched(status(false, 1, true, &["done"])),
        );
        let (state, commands) = update(state, PanelEvent::DownloadClicked);
        let (state, more) = update(state, PanelEvent::DownloadFinished(Ok(())));
        assert_eq!(commands, vec![Command::SendDownload]);
        assert_eq!(more, vec![Command::SendReset]);
        assert_eq!(state, initial(), "exact initial render required");
    }

    #[test]
    fn failed_download_alerts_and_resynchronises() {
        let (state, _) = update(
            initial(),
            PanelEvent::StatusFetched(status(false, 1, true, &[])),
        );
        let (state, _) = update(state, PanelEvent::DownloadClicked);
        let (state, commands) = update(
            state,
            PanelEvent::DownloadFinished(Err("no result".into())),
        );
        assert_eq!(
            commands,
            vec![Command::Alert("no result".into()), Command::FetchStatus]
        );
        // The follow-up status fetch re-enables per server truth.
        let (state, _) = update(
            state,
            PanelEvent::StatusFetched(status(false, 1, true, &[])),
        );
        assert!(state.view().download_enabled);
    }

    #[test]
    fn two_file_upload_then_ready_poll_renders_the_whole_panel() {
        let (state, _) = update(initial(), picked(&["a.pdf", "b.pdf"]));
        let (state, _) = update(state, PanelEvent::UploadClicked);
        let (state, _) = update(
            state,
            PanelEvent::UploadFinished(Ok(UploadReceipt { count: Some(2) })),
        );
        let (state, _) = update(
            state,
            PanelEvent::StatusFetched(status(false, 2, false, &["ready"])),
        );
        let view = state.view();
        assert_eq!(view.pills, vec!["a.pdf", "b.pdf"]);
        assert_eq!(view.logs, vec!["ready"]);
        assert_eq!(view.status_line, state.messages().idle_line(2));
        assert!(view.start_enabled);
        assert!(!view.download_enabled);
    }

    #[test]
    fn status_failure_alerts_but_keeps_the_loop() {
        let (state, _) = update(initial(), PanelEvent::StartFinished(Ok(())));
        let (state, commands) = update(state, PanelEvent::StatusFailed("timeout".into()));
        assert!(state.view().polling, "a failed poll does not stop the loop");
        assert_eq!(commands, vec![Command::Alert("timeout".into())]);
    }
}
