//! Summary polling progress reporting.
//!
//! Summaries are generated asynchronously, so `rfpsum summary` can sit for a
//! minute or more. The poller reports what it is waiting on so the user sees
//! that work is still in progress. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;

/// A single progress event from the summary poller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollProgressEvent {
    /// Waiting once after upload before the first query.
    GraceDelay { document: String, secs: u64 },
    /// The backend answered without a summary; sleeping before `attempt + 1`.
    Waiting {
        document: String,
        attempt: u32,
        retry_in_secs: u64,
    },
    /// The summary is available.
    Ready { document: String, attempts: u32 },
}

/// Reports polling progress. Implementations write to stderr (human or JSON).
pub trait PollProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the poll loop.
    fn report(&self, event: PollProgressEvent);
}

/// Human-friendly progress on stderr: "summary Tender.pdf  waiting  attempt 3, retry in 8s".
pub struct StderrProgress;

impl PollProgressReporter for StderrProgress {
    fn report(&self, event: PollProgressEvent) {
        let line = match &event {
            PollProgressEvent::GraceDelay { document, secs } => {
                format!(
                    "summary {}  just uploaded, generating summary in {}...\n",
                    document,
                    format_secs(*secs)
                )
            }
            PollProgressEvent::Waiting {
                document,
                attempt,
                retry_in_secs,
            } => format!(
                "summary {}  waiting  attempt {}, retry in {}\n",
                document,
                attempt,
                format_secs(*retry_in_secs)
            ),
            PollProgressEvent::Ready { document, attempts } => {
                format!("summary {}  ready after {} attempt(s)\n", document, attempts)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl PollProgressReporter for JsonProgress {
    fn report(&self, event: PollProgressEvent) {
        let obj = match &event {
            PollProgressEvent::GraceDelay { document, secs } => serde_json::json!({
                "event": "progress",
                "document": document,
                "phase": "grace_delay",
                "secs": secs
            }),
            PollProgressEvent::Waiting {
                document,
                attempt,
                retry_in_secs,
            } => serde_json::json!({
                "event": "progress",
                "document": document,
                "phase": "waiting",
                "attempt": attempt,
                "retry_in_secs": retry_in_secs
            }),
            PollProgressEvent::Ready { document, attempts } => serde_json::json!({
                "event": "progress",
                "document": document,
                "phase": "ready",
                "attempts": attempts
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl PollProgressReporter for NoProgress {
    fn report(&self, _event: PollProgressEvent) {}
}

fn format_secs(secs: u64) -> String {
    if secs >= 60 && secs % 60 == 0 {
        let mins = secs / 60;
        if mins == 1 {
            "a minute".to_string()
        } else {
            format!("{} minutes", mins)
        }
    } else {
        format!("{}s", secs)
    }
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parse the `--progress` flag value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            "auto" => Some(Self::default_for_tty()),
            _ => None,
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn PollProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
