//! Rendering seam between the controller and a concrete display.
//!
//! The session driver calls [`PanelScreen::render`] after every event with a
//! fresh [`PanelView`], and [`PanelScreen::alert`] for messages the user must
//! see. All methods default to no-ops so implementations override only what
//! they display.
//!
//! The trait is `Send + Sync` because the session holds it across awaits.

use crate::panel::PanelView;
use std::path::Path;

/// Receives every render and alert of a panel session.
pub trait PanelScreen: Send + Sync {
    /// Called after every state transition with the complete view.
    ///
    /// The view is a full snapshot, not a diff: logs are replaced wholesale
    /// exactly as the server reported them.
    fn render(&self, view: &PanelView) {
        let _ = view;
    }

    /// Surface an error message to the user. Never called for the
    /// best-effort shutdown notification.
    fn alert(&self, message: &str) {
        let _ = message;
    }

    /// Called once when the downloaded result has been written to disk.
    fn result_saved(&self, path: &Path) {
        let _ = path;
    }
}

/// A no-op implementation for headless callers and tests.
pub struct NoopScreen;

impl PanelScreen for NoopScreen {}
