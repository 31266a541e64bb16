//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_sessions_active` (gauge): open WebSocket sessions
//! - `gateway_sessions_rejected_total` (counter): refused sessions by reason
//! - `gateway_frames_total` (counter): inbound frames by outcome
//! - `gateway_backend_duration_seconds` (histogram): backend round trip
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Response,
    ProtocolError,
    BackendError,
}

impl FrameOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            FrameOutcome::Response => "response",
            FrameOutcome::ProtocolError => "protocol_error",
            FrameOutcome::BackendError => "backend_error",
        }
    }
}

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_gauge!("gateway_sessions_active", Unit::Count, "Open WebSocket sessions");
    describe_counter!(
        "gateway_sessions_rejected_total",
        Unit::Count,
        "Sessions refused at handshake"
    );
    describe_counter!("gateway_frames_total", Unit::Count, "Inbound frames handled");
    describe_histogram!(
        "gateway_backend_duration_seconds",
        Unit::Seconds,
        "Backend round trip including queueing for a worker"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn session_opened() {
    metrics::gauge!("gateway_sessions_active").increment(1.0);
}

pub fn session_closed() {
    metrics::gauge!("gateway_sessions_active").decrement(1.0);
}

pub fn session_rejected(reason: &'static str) {
    metrics::counter!("gateway_sessions_rejected_total", "reason" => reason).increment(1);
}

pub fn frame_handled(outcome: FrameOutcome) {
    metrics::counter!("gateway_frames_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn backend_call(start: Instant) {
    metrics::histogram!("gateway_backend_duration_seconds").record(start.elapsed().as_secs_f64());
}
