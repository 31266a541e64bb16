//! Wire types exchanged with devices.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `{role, content}` entry of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Client-supplied correlation token, echoed back verbatim.
///
/// Kept as a raw JSON value so a reply never alters what the client sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Value);

impl RequestId {
    /// Accepts any truthy value. `null`, `false`, zero and empty
    /// strings, arrays or objects count as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let absent = match value {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
        };
        (!absent).then(|| Self(value.clone()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(Value::String(value.to_string()))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// A frame sent from the gateway to a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    Response {
        device_id: Option<String>,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
}

impl OutboundFrame {
    pub fn response(
        device_id: Option<&str>,
        content: String,
        request_id: Option<RequestId>,
    ) -> Self {
        Self::Response {
            device_id: device_id.map(str::to_string),
            content,
            request_id,
        }
    }

    pub fn error(message: impl Into<String>, request_id: Option<RequestId>) -> Self {
        Self::Error {
            message: message.into(),
            request_id,
        }
    }

    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> String {
        // only strings, options and JSON values: serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"error","message":"internal serialization error"}"#.to_string()
        })
    }
}
