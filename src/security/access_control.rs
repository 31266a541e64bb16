//! Device access control.
//! Decides once per connection, at handshake time, whether a device may talk.

use axum::http::HeaderMap;
use thiserror::Error;

use crate::config::GatewayPolicy;

/// Handshake header carrying the device identity.
pub const DEVICE_ID_HEADER: &str = "device-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing device-id, connection rejected")]
    MissingDeviceId,
    #[error("device-id not authorized")]
    Unauthorized,
}

impl AuthError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingDeviceId => "missing_device_id",
            AuthError::Unauthorized => "unauthorized",
        }
    }
}

/// Read the device id from handshake headers. Empty values count as absent.
pub fn device_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(DEVICE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Check a connecting device against the policy.
pub fn authorize(policy: &GatewayPolicy, device_id: Option<&str>) -> Result<(), AuthError> {
    if policy.require_device_id && device_id.is_none() {
        return Err(AuthError::MissingDeviceId);
    }

    if !policy.allowed_devices.is_empty() {
        match device_id {
            Some(id) if policy.allowed_devices.contains(id) => {}
            _ => return Err(AuthError::Unauthorized),
        }
    }

    Ok(())
}
