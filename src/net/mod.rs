//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS handshake)
//!     → HTTP layer (health probe or WebSocket upgrade)
//!     → connection.rs (session slot + ID, released on close)
//! ```
//!
//! # Design Decisions
//! - Session count is bounded; a full gateway answers 503 instead of queueing
//! - Each session carries an ID for log correlation
//! - TLS is optional and handled transparently

pub mod connection;
pub mod tls;

pub use connection::{ConnectionLimiter, ConnectionPermit, SessionId};
