//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, tracing layer)
//!     → websocket.rs
//!         ├─ no upgrade  → 200 "Gateway is running"
//!         ├─ gateway full → 503
//!         └─ upgrade → Session (auth, receive loop, replies)
//! ```

pub mod server;
pub mod websocket;

pub use server::{bind_listener, AppState, GatewayServer, ListenerError};
pub use websocket::{Session, SessionState, CAPACITY_BODY, HEALTH_BODY};
