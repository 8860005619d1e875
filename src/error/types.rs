//! Core error types.

use thiserror::Error;

/// Errors produced by the adapter machinery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncReadableError {
    /// The proxy was destroyed; nothing more can be written into it.
    #[error("stream destroyed")]
    Destroyed,

    /// The proxy already ended.
    #[error("write after end")]
    WriteAfterEnd,

    /// Invalid adapter or stream options.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl SyncReadableError {
    /// Returns `true` if the error means the proxy reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Destroyed | Self::WriteAfterEnd)
    }
}

/// Result type for sync-readable operations
pub type Result<T> = std::result::Result<T, SyncReadableError>;
