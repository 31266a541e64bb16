//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → listener stops accepting → serve future returns
//! ```
//!
//! # Design Decisions
//! - Ordered startup lives in main: config, logging, backend, listener
//! - In-flight backend calls are not cancelled; their results are dropped

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
