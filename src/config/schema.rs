//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS, connection limit).
    pub server: ServerConfig,

    /// Device policy, worker pool and upstream backend settings.
    pub gateway: GatewaySection,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind IP (e.g., "0.0.0.0").
    pub ip: String,

    /// Bind port.
    pub port: u16,

    /// Maximum concurrent WebSocket sessions.
    pub max_connections: usize,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl ServerConfig {
    /// `ip:port` in a form accepted by `SocketAddr::from_str`.
    pub fn bind_address(&self) -> String {
        if self.ip.contains(':') && !self.ip.starts_with('[') {
            format!("[{}]:{}", self.ip, self.port)
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".to_string(),
            port: 8000,
            max_connections: 10_000,
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// The `[gateway]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Reject connections that do not send a `device-id` header.
    pub require_device_id: bool,

    /// When non-empty, only these device ids may connect.
    pub allowed_devices: Vec<String>,

    /// Number of backend calls allowed to run at once.
    pub worker_pool_size: usize,

    /// Upstream chat-completion backend.
    pub openai: OpenAiConfig,
}

impl GatewaySection {
    /// Freeze the access part of this section into a policy.
    pub fn policy(&self) -> GatewayPolicy {
        GatewayPolicy {
            require_device_id: self.require_device_id,
            allowed_devices: self.allowed_devices.iter().cloned().collect(),
        }
    }
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            require_device_id: true,
            allowed_devices: Vec::new(),
            worker_pool_size: 8,
            openai: OpenAiConfig::default(),
        }
    }
}

/// OpenAI-compatible backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl OpenAiConfig {
    /// True when the key is empty or still the shipped template value.
    pub fn api_key_is_placeholder(&self) -> bool {
        let key = self.api_key.trim();
        // template files ship with a "你的..." placeholder
        key.is_empty() || key.contains('你')
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            timeout: 60,
        }
    }
}

/// Immutable device access policy, built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayPolicy {
    pub require_device_id: bool,
    pub allowed_devices: HashSet<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8000");
        assert!(config.gateway.require_device_id);
        assert!(config.gateway.allowed_devices.is_empty());
        assert_eq!(config.gateway.worker_pool_size, 8);
        assert_eq!(config.gateway.openai.model, "gpt-4o-mini");
        assert_eq!(config.gateway.openai.timeout, 60);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn ipv6_bind_address_is_bracketed() {
        let server = ServerConfig {
            ip: "::1".into(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(server.bind_address(), "[::1]:9000");
    }

    #[test]
    fn policy_collects_allowed_devices() {
        let section = GatewaySection {
            allowed_devices: vec!["a".into(), "b".into(), "a".into()],
            ..GatewaySection::default()
        };
        let policy = section.policy();
        assert_eq!(policy.allowed_devices.len(), 2);
        assert!(policy.require_device_id);
    }

    #[test]
    fn placeholder_keys_are_detected() {
        let mut openai = OpenAiConfig::default();
        assert!(openai.api_key_is_placeholder());
        openai.api_key = "你的api_key".into();
        assert!(openai.api_key_is_placeholder());
        openai.api_key = "sk-live".into();
        assert!(!openai.api_key_is_placeholder());
    }
}
