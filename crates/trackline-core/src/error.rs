//! Error types and readiness polling

use thiserror::Error;

use crate::types::TrackId;

/// Errors that can occur while coordinating a session
///
/// None of these are fatal to the tick loop. Callers log them and carry on
/// with the next tick.
#[derive(Error, Debug)]
pub enum TracklineError {
    /// A value (length, handle) is not available yet; poll again next tick
    #[error("Not ready: {0}")]
    NotReady(String),

    /// The underlying instance was disposed or never created
    #[error("Invalid instance handle for {0}")]
    InvalidHandle(TrackId),

    /// Zero-length track, empty buffer or a zero-sized image
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// The audio source is missing or corrupt (reported by the audio subsystem)
    #[error("Audio source error: {0}")]
    Source(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error from the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for trackline operations
pub type Result<T> = std::result::Result<T, TracklineError>;

/// Outcome of polling a value that becomes available asynchronously
///
/// Replaces the "0 means not loaded yet" convention of engine length queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness<T> {
    /// Still loading
    Pending,
    /// Available
    Ready(T),
    /// Will never become available
    Failed(String),
}

impl<T> Readiness<T> {
    /// Check if the value is available
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }

    /// Get the value if available
    pub fn ready(self) -> Option<T> {
        match self {
            Readiness::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Map the ready value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Readiness<U> {
        match self {
            Readiness::Pending => Readiness::Pending,
            Readiness::Ready(value) => Readiness::Ready(f(value)),
            Readiness::Failed(reason) => Readiness::Failed(reason),
        }
    }
}
