//! Inbound frame normalization.
//!
//! Turns one raw frame into the turn sequence handed to the backend.
//!
//! ```text
//! Binary ─────────────────────────────────────────────→ BinaryFrame
//! Text ─→ JSON? ─ no ──→ Envelope::PlainText(raw) ─┐
//!            └─ yes ─→ object? ─ no ─→ InvalidFormat │
//!                        └─ yes ─→ Envelope::Structured
//!                                         │
//!        messages[] non-empty ──→ turns as-is
//!        text | content | prompt ─→ [{user, text}]
//!        otherwise ──────────────→ MissingContent
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::types::{ChatTurn, RequestId};

/// Keys searched, in order, for a flat prompt.
const FLAT_TEXT_KEYS: [&str; 3] = ["text", "content", "prompt"];

/// A frame as read off the socket, before normalization.
#[derive(Debug, Clone, Copy)]
pub enum RawFrame<'a> {
    Text(&'a str),
    Binary(&'a [u8]),
}

/// Why a frame could not be turned into a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("only text messages are supported")]
    BinaryFrame,
    #[error("invalid message format")]
    InvalidFormat,
    #[error("missing messages or text field")]
    MissingContent,
}

/// A rejected frame, with whatever correlation id could be recovered from it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct Rejection {
    pub error: ProtocolError,
    pub request_id: Option<RequestId>,
}

impl From<ProtocolError> for Rejection {
    fn from(error: ProtocolError) -> Self {
        Self {
            error,
            request_id: None,
        }
    }
}

/// A frame ready for the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub turns: Vec<ChatTurn>,
    pub request_id: Option<RequestId>,
}

/// Result of the first parsing step.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A JSON object frame.
    Structured(Map<String, Value>),
    /// Text that is not JSON at all; the whole frame is the prompt.
    PlainText(String),
}

impl Envelope {
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(Self::Structured(map)),
            Ok(_) => Err(ProtocolError::InvalidFormat),
            Err(_) => Ok(Self::PlainText(raw.to_string())),
        }
    }
}

/// Decoded fields of one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundEnvelope {
    pub messages: Option<Vec<ChatTurn>>,
    pub text: Option<String>,
    pub request_id: Option<RequestId>,
}

impl InboundEnvelope {
    fn from_envelope(envelope: Envelope) -> Result<Self, Rejection> {
        let map = match envelope {
            Envelope::PlainText(text) => {
                return Ok(Self {
                    text: Some(text),
                    ..Self::default()
                })
            }
            Envelope::Structured(map) => map,
        };

        let request_id = map.get("request_id").and_then(RequestId::from_value);

        let messages = match map.get("messages") {
            Some(Value::Array(items)) if !items.is_empty() => {
                let turns = serde_json::from_value::<Vec<ChatTurn>>(Value::Array(items.clone()))
                    .map_err(|_| Rejection {
                        error: ProtocolError::InvalidFormat,
                        request_id: request_id.clone(),
                    })?;
                Some(turns)
            }
            _ => None,
        };

        let text = FLAT_TEXT_KEYS.iter().find_map(|key| match map.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        });

        Ok(Self {
            messages,
            text,
            request_id,
        })
    }

    fn into_request(self) -> Result<ChatRequest, Rejection> {
        let turns = match (self.messages, self.text) {
            (Some(turns), _) => turns,
            (None, Some(text)) if !text.is_empty() => vec![ChatTurn::user(text)],
            _ => {
                return Err(Rejection {
                    error: ProtocolError::MissingContent,
                    request_id: self.request_id,
                })
            }
        };
        Ok(ChatRequest {
            turns,
            request_id: self.request_id,
        })
    }
}

/// Normalize one raw frame into a chat request.
pub fn normalize(frame: RawFrame<'_>) -> Result<ChatRequest, Rejection> {
    match frame {
        RawFrame::Binary(_) => Err(ProtocolError::BinaryFrame.into()),
        RawFrame::Text(raw) => {
            let envelope = Envelope::parse(raw)?;
            InboundEnvelope::from_envelope(envelope)?.into_request()
        }
    }
}
