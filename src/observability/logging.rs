//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Apply the configured level unless `RUST_LOG` overrides it
//! - Drop protocol-internal chatter from failed handshakes (TLS probes on the
//!   plain port, port scanners, half-open sockets)
//!
//! The noise filter is a pure predicate over event metadata, evaluated by the
//! subscriber for each event; it holds no state.

use tracing::{Level, Metadata};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

/// Crates whose non-error events describe socket/handshake internals.
const PROTOCOL_TARGETS: [&str; 4] = ["tungstenite", "tokio_tungstenite", "hyper", "hyper_util"];

/// True for events that should never reach the log output.
pub fn is_handshake_noise(metadata: &Metadata<'_>) -> bool {
    is_noisy_target(metadata.target(), metadata.level())
}

fn is_noisy_target(target: &str, level: &Level) -> bool {
    if *level == Level::ERROR {
        return false;
    }
    PROTOCOL_TARGETS.iter().any(|prefix| {
        target == *prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Default filter directives for a given level.
pub fn default_directives(level: &str) -> String {
    format!("chat_gateway={},tower_http=info", level.to_ascii_lowercase())
}

/// Install the global subscriber.
pub fn init_logging(level: &str) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_filter(filter_fn(|metadata| !is_handshake_noise(metadata))),
        )
        .try_init()
}
