//! Backend trait and error definitions.

use thiserror::Error;

use crate::protocol::ChatTurn;

/// Errors that can occur while talking to the chat-completion backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Client could not be built from configuration.
    #[error("backend configuration error: {0}")]
    Config(String),

    /// Connection or request failed before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Upstream body could not be decoded.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// A synchronous chat-completion backend.
///
/// `complete` blocks the calling thread for the whole round trip, so callers
/// on the async runtime must go through [`WorkerPool`](crate::backend::WorkerPool).
pub trait ChatBackend: Send + Sync + 'static {
    /// Generate a reply for the given conversation.
    fn complete(&self, turns: &[ChatTurn]) -> BackendResult<String>;
}
