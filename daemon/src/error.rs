//! Error types shared across the daemon

use thiserror::Error;

/// Failure reading a single process during a single tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("process is not running")]
    NotFound,
    #[error("permission denied reading process memory")]
    PermissionDenied,
    #[error("failed to read process memory (error {0})")]
    ReadFailed(i32),
}

impl ProbeError {
    /// Map an I/O error from a `/proc` read onto the probe taxonomy.
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENOENT) | Some(libc::ESRCH) => ProbeError::NotFound,
            Some(libc::EACCES) | Some(libc::EPERM) => ProbeError::PermissionDenied,
            Some(code) => ProbeError::ReadFailed(code),
            None => match err.kind() {
                std::io::ErrorKind::NotFound => ProbeError::NotFound,
                std::io::ErrorKind::PermissionDenied => ProbeError::PermissionDenied,
                _ => ProbeError::ReadFailed(-1),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    #[error("threshold is empty")]
    Empty,
    #[error("'{0}' is not a valid memory size")]
    Invalid(String),
    #[error("threshold must be greater than zero")]
    NotPositive,
    #[error("threshold {0} is already set")]
    Duplicate(String),
    #[error("at most {0} thresholds are allowed")]
    TooMany(usize),
    #[error("threshold exceeds the {0} GB limit")]
    TooLarge(u64),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
