//! Watcher error types.

use thiserror::Error;

/// Errors that can fail a poll attempt.
///
/// These are caught at the attempt boundary: a failed attempt is logged and
/// the run continues with the next one.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Browser(#[from] citawatch_browser::BrowserError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
