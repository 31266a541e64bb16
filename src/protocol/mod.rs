//! Device message protocol.
//!
//! # Data Flow
//! ```text
//! WebSocket frame
//!     → normalizer.rs (plain-text fallback, JSON envelope, turn extraction)
//!     → ChatRequest { turns, request_id }
//!     → backend
//!     → types.rs (OutboundFrame::Response | OutboundFrame::Error)
//!     → WebSocket text frame
//! ```

pub mod normalizer;
pub mod types;

pub use normalizer::{normalize, ChatRequest, Envelope, ProtocolError, RawFrame, Rejection};
pub use types::{ChatTurn, OutboundFrame, RequestId};
