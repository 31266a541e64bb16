//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Listener and sessions produce:
//!     → logging.rs (structured log events, session_id/device_id fields)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;
