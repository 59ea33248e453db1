//! Error types for the client sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Everything that can go wrong while talking to the board.
///
/// None of these are fatal to a running client: they are surfaced as a
/// transient message and the engine keeps going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Input rejected locally, before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network failure, timeout, non-success status or undecodable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered `{success: false}`.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// Local state could not be written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Whether the next scheduled attempt may succeed without user action.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}
