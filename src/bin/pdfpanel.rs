//! CLI binary for pdfpanel.
//!
//! A thin shim over the library crate: one verb per panel action plus a
//! composed `run` that drives a whole session (upload → start → poll →
//! download → reset).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfpanel::{
    save_result, HttpJobService, JobService, PanelConfig, PanelScreen, PanelView, Session,
    SessionOutcome,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Terminal screen using indicatif ──────────────────────────────────────────

/// Terminal screen: a spinner anchored at the bottom carries the status
/// line; server log lines are printed above it as they appear. Because the
/// server replaces the log wholesale on every poll, only the unseen tail is
/// printed (or everything again if the list no longer extends what was shown,
/// e.g. after a reset).
struct TerminalScreen {
    bar: ProgressBar,
    printed: Mutex<Vec<String>>,
}

impl TerminalScreen {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            printed: Mutex::new(Vec::new()),
        }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PanelScreen for TerminalScreen {
    fn render(&self, view: &PanelView) {
        self.bar.set_message(view.status_line.clone());

        let mut printed = self.printed.lock().unwrap();
        let extends = view.logs.len() >= printed.len()
            && view.logs.iter().zip(printed.iter()).all(|(a, b)| a == b);
        let start = if extends { printed.len() } else { 0 };
        for line in &view.logs[start..] {
            self.bar.println(format!("  {}", dim(line)));
        }
        *printed = view.logs.clone();
    }

    fn alert(&self, message: &str) {
        self.bar.println(format!("{} {}", red("✗"), bold(message)));
    }

    fn result_saved(&self, path: &Path) {
        self.bar
            .println(format!("{} {}", green("✔"), bold(&path.display().to_string())));
    }
}

/// Fallback screen for `--no-progress`: status transitions and log lines go
/// to stderr, nothing is animated.
struct PlainScreen {
    last_status: Mutex<String>,
    printed: Mutex<usize>,
}

impl PlainScreen {
    fn new() -> Self {
        Self {
            last_status: Mutex::new(String::new()),
            printed: Mutex::new(0),
        }
    }
}

impl PanelScreen for PlainScreen {
    fn render(&self, view: &PanelView) {
        let mut last = self.last_status.lock().unwrap();
        if *last != view.status_line {
            eprintln!("* {}", view.status_line);
            *last = view.status_line.clone();
        }
        let mut printed = self.printed.lock().unwrap();
        if view.logs.len() < *printed {
            *printed = 0;
        }
        for line in &view.logs[*printed..] {
            eprintln!("  {line}");
        }
        *printed = view.logs.len();
    }

    fn alert(&self, message: &str) {
        eprintln!("ERROR: {message}");
    }

    fn result_saved(&self, path: &Path) {
        eprintln!("saved: {}", path.display());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Full session: upload, start, watch the log, download result.xlsx
  pdfpanel run invoices/*.pdf

  # Same, saving elsewhere and stopping the service afterwards
  pdfpanel run a.pdf b.pdf -o out/итог.xlsx --shutdown-on-exit

  # One action at a time, mirroring the panel's buttons
  pdfpanel upload a.pdf b.pdf
  pdfpanel start
  pdfpanel watch
  pdfpanel download
  pdfpanel reset

  # Scripting
  pdfpanel status --json

ENVIRONMENT VARIABLES:
  PDFPANEL_URL               Job Service base URL (default http://127.0.0.1:5000)
  PDFPANEL_POLL_INTERVAL_MS  Status poll cadence (default 700)
"#;

/// Control panel for a PDF-to-spreadsheet extraction service.
#[derive(Parser, Debug)]
#[command(
    name = "pdfpanel",
    version,
    about = "Upload PDFs to an extraction service, run the job, download the spreadsheet",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Base URL of the Job Service.
    #[arg(long, env = "PDFPANEL_URL", default_value = "http://127.0.0.1:5000", global = true)]
    url: String,

    /// Status poll cadence in milliseconds.
    #[arg(long, env = "PDFPANEL_POLL_INTERVAL_MS", default_value_t = 700, global = true)]
    poll_interval_ms: u64,

    /// Disable the spinner; plain line-oriented output.
    #[arg(long, env = "PDFPANEL_NO_PROGRESS", global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFPANEL_VERBOSE", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Upload PDFs, start the job, poll until done, download the result.
    Run {
        /// PDF files to process.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Where to save the result spreadsheet.
        #[arg(short, long, default_value = "result.xlsx")]
        output: PathBuf,

        /// Notify the service to shut down when the session ends.
        #[arg(long)]
        shutdown_on_exit: bool,
    },
    /// Print the current job status.
    Status {
        /// Output the raw status JSON.
        #[arg(long)]
        json: bool,
    },
    /// Upload PDFs without starting a job.
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Start a job over the already-uploaded files.
    Start,
    /// Follow a running job's log until it finishes.
    Watch,
    /// Download the finished result and reset the service.
    Download {
        /// Where to save the result spreadsheet.
        #[arg(short, long, default_value = "result.xlsx")]
        output: PathBuf,
    },
    /// Discard the server-side job, result, and uploaded files.
    Reset,
    /// Ask the service to shut down (best-effort).
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep library logs out of the way of the spinner unless asked for.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut builder = PanelConfig::builder()
        .base_url(&cli.url)
        .poll_interval_ms(cli.poll_interval_ms);
    if let CliCommand::Run { ref output, .. } | CliCommand::Download { ref output } = cli.command {
        builder = builder.result_path(output.clone());
    }
    let config = builder.build().context("Invalid configuration")?;
    let service = HttpJobService::new(&config).context("Failed to build HTTP client")?;

    match cli.command {
        CliCommand::Run {
            files,
            shutdown_on_exit,
            ..
        } => {
            let outcome = run_session(&service, &config, files, cli.no_progress).await;
            if shutdown_on_exit {
                service.shutdown().await;
            }
            match outcome? {
                SessionOutcome::ResultSaved(path) => {
                    println!("{}", path.display());
                }
                SessionOutcome::NoResult { logs } => {
                    for line in &logs {
                        eprintln!("  {line}");
                    }
                    anyhow::bail!("Job finished without a result");
                }
            }
        }

        CliCommand::Status { json } => {
            let status = service.status().await.context("Status request failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!(
                    "running: {}   uploaded: {}   has_result: {}",
                    status.running, status.uploaded, status.has_result
                );
                for line in &status.logs {
                    println!("  {}", dim(line));
                }
            }
        }

        CliCommand::Upload { files } => {
            let receipt = service.upload(&files).await.context("Upload rejected")?;
            match receipt.count {
                Some(n) => println!("{} {}", green("✔"), bold(&format!("{n} file(s) accepted"))),
                None => println!("{} accepted", green("✔")),
            }
        }

        CliCommand::Start => {
            let receipt = service.start().await.context("Start rejected")?;
            match receipt.job_id {
                Some(id) => println!("{} job {}", green("✔"), dim(&id)),
                None => println!("{} started", green("✔")),
            }
        }

        CliCommand::Watch => {
            let screen = TerminalScreen::new();
            let mut session = Session::new(&service, &screen, &config);
            session.watch().await;
            screen.finish();
        }

        CliCommand::Download { output } => {
            // Mirror the panel's download: fetch, save atomically, reset.
            let bytes = service.download().await.context("Download rejected")?;
            save_result(&output, &bytes)
                .await
                .context("Failed to save result")?;
            let _ = service.reset().await;
            println!("{}", output.display());
        }

        CliCommand::Reset => {
            service.reset().await.context("Reset request failed")?;
            println!("{} reset", green("✔"));
        }

        CliCommand::Shutdown => {
            service.shutdown().await;
        }
    }

    Ok(())
}

async fn run_session(
    service: &HttpJobService,
    config: &PanelConfig,
    files: Vec<PathBuf>,
    no_progress: bool,
) -> Result<SessionOutcome> {
    if no_progress {
        let screen = PlainScreen::new();
        let mut session = Session::new(service, &screen, config);
        session.run_job(files).await.map_err(Into::into)
    } else {
        let screen = TerminalScreen::new();
        let mut session = Session::new(service, &screen, config);
        let outcome = session.run_job(files).await;
        screen.finish();
        outcome.map_err(Into::into)
    }
}
