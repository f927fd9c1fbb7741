use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::commands::CommandError;
use crate::transport::{TransportError, TransportResponse};

mod pull;
mod push;

pub use pull::PullSummary;
pub use push::PushSummary;

/// Minimum interval between two network pulls when nothing was pushed in
/// between.
pub const DEFAULT_PULL_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PullOutcome {
    /// The last pull is still fresh; no request was made.
    Skipped,
    Pulled(PullSummary),
}

impl PullOutcome {
    pub fn was_skipped(&self) -> bool {
        matches!(self, PullOutcome::Skipped)
    }
}

/// A command the server rejected in an otherwise successful push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandFailure {
    pub uuid: String,
    pub code: i64,
    pub message: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.uuid, self.message, self.code)
    }
}

#[derive(Debug)]
pub enum SyncError {
    Transport(TransportError),
    UnhandledStatus {
        op: &'static str,
        code: u16,
        body: String,
    },
    Decode {
        op: &'static str,
        source: serde_json::Error,
    },
    Command(CommandError),
    CommandsFailed(Vec<CommandFailure>),
}

impl SyncError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SyncError::UnhandledStatus { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn failures(&self) -> &[CommandFailure] {
        match self {
            SyncError::CommandsFailed(failures) => failures,
            _ => &[],
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Transport(err) => write!(f, "transport error: {}", err),
            SyncError::UnhandledStatus { op, code, .. } => {
                write!(f, "{}: unhandled status code {}", op, code)
            }
            SyncError::Decode { op, source } => {
                write!(f, "{}: could not decode response: {}", op, source)
            }
            SyncError::Command(err) => write!(f, "{}", err),
            SyncError::CommandsFailed(failures) => {
                write!(f, "{} command(s) failed", failures.len())?;
                for failure in failures {
                    write!(f, "\n{}", failure)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncError::Transport(err) => Some(err),
            SyncError::UnhandledStatus { .. } => None,
            SyncError::Decode { source, .. } => Some(source),
            SyncError::Command(err) => Some(err),
            SyncError::CommandsFailed(_) => None,
        }
    }
}

impl From<TransportError> for SyncError {
    fn from(value: TransportError) -> Self {
        SyncError::Transport(value)
    }
}

impl From<CommandError> for SyncError {
    fn from(value: CommandError) -> Self {
        SyncError::Command(value)
    }
}

fn unhandled_status(op: &'static str, response: &TransportResponse) -> SyncError {
    let body = response.body_text();
    tracing::warn!(op, code = response.status, text = %body, "unhandled response status");
    SyncError::UnhandledStatus {
        op,
        code: response.status,
        body,
    }
}

/// Freshness of the last successful pull. A push invalidates it so the next
/// pull always reaches the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cooldown {
    window: Duration,
    last_pulled: Option<Instant>,
}

impl Cooldown {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            last_pulled: None,
        }
    }

    pub(crate) fn is_fresh(&self, now: Instant) -> bool {
        self.last_pulled
            .is_some_and(|at| now.saturating_duration_since(at) < self.window)
    }

    pub(crate) fn mark(&mut self, now: Instant) {
        self.last_pulled = Some(now);
    }

    pub(crate) fn invalidate(&mut self) {
        self.last_pulled = None;
    }
}
