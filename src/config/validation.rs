//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, pool size > 0)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::config::schema::GatewayConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let bind = config.server.bind_address();
    if bind.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.ip",
            format!("'{}' is not a valid socket address", bind),
        ));
    }
    check_slot_count("server.max_connections", config.server.max_connections, &mut errors);
    if let Some(tls) = &config.server.tls {
        if tls.cert_path.trim().is_empty() || tls.key_path.trim().is_empty() {
            errors.push(ValidationError::new(
                "server.tls",
                "cert_path and key_path are both required",
            ));
        }
    }

    check_slot_count("gateway.worker_pool_size", config.gateway.worker_pool_size, &mut errors);

    let openai = &config.gateway.openai;
    if openai.model.trim().is_empty() {
        errors.push(ValidationError::new("gateway.openai.model", "must not be empty"));
    }
    if openai.timeout == 0 {
        errors.push(ValidationError::new("gateway.openai.timeout", "must be greater than 0"));
    }
    match url::Url::parse(&openai.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "gateway.openai.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "gateway.openai.base_url",
            format!("invalid URL '{}': {}", openai.base_url, e),
        )),
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a valid socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Both limits back a semaphore, which panics above `MAX_PERMITS`.
fn check_slot_count(field: &'static str, value: usize, errors: &mut Vec<ValidationError>) {
    if value == 0 {
        errors.push(ValidationError::new(field, "must be greater than 0"));
    } else if value > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::new(
            field,
            format!("must not exceed {}", Semaphore::MAX_PERMITS),
        ));
    }
}
