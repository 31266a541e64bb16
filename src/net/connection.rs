//! Session identity and connection accounting.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Enforce `max_connections` on live WebSocket sessions
//! - Release a slot when its session ends, even on panic

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::observability::metrics;

/// Global atomic counter for session IDs.
/// Relaxed ordering is enough; only uniqueness matters.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Generate a new unique session ID.
    pub fn new() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Caps the number of concurrently open sessions.
#[derive(Debug, Clone)]
pub struct ConnectionLimiter {
    slots: Arc<Semaphore>,
    max_connections: usize,
}

impl ConnectionLimiter {
    pub fn new(max_connections: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        }
    }

    /// Claim a slot without waiting. `None` means the gateway is full.
    pub fn try_acquire(&self) -> Option<ConnectionPermit> {
        let permit = self.slots.clone().try_acquire_owned().ok()?;
        metrics::session_opened();
        Some(ConnectionPermit {
            _permit: permit,
            id: SessionId::new(),
        })
    }

    /// Number of sessions currently holding a slot.
    pub fn active_count(&self) -> usize {
        self.max_connections - self.slots.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A claimed session slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
    id: SessionId,
}

impl ConnectionPermit {
    /// The session ID assigned with this slot.
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        metrics::session_closed();
        tracing::trace!(session_id = %self.id, "Session slot released");
    }
}
