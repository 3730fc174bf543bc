//! Error types for timerres
//!
//! Statistical failures are explicit `InvalidInput` errors, never sentinel
//! values. Missing or unreadable measurement logs get their own variants so
//! callers can decide whether to proceed with no data or abort.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// timerres error types
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or under-sized sample sequence, or an invalid parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Browser identity outside the configured supported set
    #[error("Unsupported subject: {0}\nSupported browsers are listed in Config::supported_browsers")]
    UnsupportedSubject(String),

    /// No measurement data exists yet for the requested subject
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisted log content could not be parsed
    #[error("Corrupt measurement log {}: {reason}", path.display())]
    CorruptLog {
        /// Path of the unreadable log
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error only signals absent prior data.
    ///
    /// `NotFound` and `CorruptLog` should not abort a multi-log analysis run;
    /// they are logged and the affected log is treated as empty.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::CorruptLog { .. })
    }
}
