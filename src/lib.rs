//! # pdfpanel
//!
//! Terminal control panel for a PDF-to-spreadsheet extraction service.
//!
//! ## What this crate is
//!
//! The extraction backend (the **Job Service**) does all the heavy lifting:
//! it ingests uploaded PDFs, runs an extraction job, and produces an `.xlsx`
//! result. This crate is the client side of that contract — a small,
//! fully-testable controller that uploads files, starts a job, polls its
//! status, and downloads the result. It owns no business logic: every
//! decision is a direct projection of the last server-reported status.
//!
//! ## Architecture
//!
//! ```text
//! user action ──▶ PanelEvent ──▶ update() ──▶ PanelState + Commands
//!                                  │                │
//!                    PanelScreen ◀─┘                ▼
//!                    (render/alert)         Session driver
//!                                                   │
//!                                            JobService (HTTP)
//!                                     /status /upload /start
//!                                     /download /reset /shutdown
//! ```
//!
//! * [`panel`] — the pure state machine: events in, commands out, no I/O.
//! * [`service`] — the six-endpoint HTTP contract over reqwest.
//! * [`session`] — the async driver owning the 700 ms poll timer.
//! * [`screen`] — the rendering seam (the CLI binary ships a terminal one).
//! * [`messages`] — every user-facing string, localised and overridable.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfpanel::{HttpJobService, NoopScreen, PanelConfig, Session, SessionOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PanelConfig::default();
//!     let service = HttpJobService::new(&config)?;
//!     let screen = NoopScreen;
//!
//!     let mut session = Session::new(&service, &screen, &config);
//!     match session.run_job(vec!["invoice.pdf".into()]).await? {
//!         SessionOutcome::ResultSaved(path) => println!("saved: {}", path.display()),
//!         SessionOutcome::NoResult { logs } => eprintln!("no result:\n{}", logs.join("\n")),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfpanel` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod messages;
pub mod panel;
pub mod screen;
pub mod service;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PanelConfig, PanelConfigBuilder, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};
pub use error::PanelError;
pub use messages::MessageCatalog;
pub use panel::{update, Command, PanelEvent, PanelState, PanelView};
pub use screen::{NoopScreen, PanelScreen};
pub use service::{HttpJobService, JobService, JobStatus, StartReceipt, UploadReceipt};
pub use session::{save_result, Session, SessionOutcome};
