//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! WebSocket handshake headers
//!     → access_control.rs (device-id presence and allow-list)
//!     → accepted: session enters its receive loop
//!     → rejected: one error frame, then close
//! ```

pub mod access_control;

pub use access_control::{authorize, device_id_from_headers, AuthError, DEVICE_ID_HEADER};
