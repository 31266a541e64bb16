//! Upstream chat-completion subsystem.
//!
//! # Data Flow
//! ```text
//! Session (async task)
//!     → pool.rs (wait for a free slot, hop to a blocking worker)
//!     → client.rs (POST /chat/completions, bounded by timeout)
//!     → first choice text | BackendError
//!     → back to the session
//! ```
//!
//! # Design Decisions
//! - The backend contract is synchronous; only the pool touches it
//! - Pool size is explicit configuration, never implicit
//! - Failures are per request: the session reports and keeps going

pub mod client;
pub mod pool;
pub mod types;

pub use client::OpenAiBackend;
pub use pool::{PoolError, WorkerPool};
pub use types::{BackendError, BackendResult, ChatBackend};
