//! Error types for the Mermin device
//!
//! Every failure is surfaced to the caller; nothing is retried.

use thiserror::Error;

/// All error types that can occur while running the device
#[derive(Debug, Error)]
pub enum MerminError {
    /// Detector setting outside {0, 1, 2}
    #[error("Invalid detector setting: {0} (expected 0, 1 or 2)")]
    InvalidSetting(String),

    /// The entropy source failed to produce a value
    #[error("Random source error: {0}")]
    RandomSource(String),

    /// History lookup past the end of the log
    #[error("Index out of range: {index} (history length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Request body could not be read
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Export requested in a format we do not write
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for device operations
pub type Result<T> = std::result::Result<T, MerminError>;
