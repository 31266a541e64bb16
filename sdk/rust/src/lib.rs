//! Async client for the chat gateway's WebSocket protocol.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("websocket error: {0}")]
    Transport(#[from] tungstenite::Error),
    #[error("undecodable frame: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected frame: {0}")]
    UnexpectedFrame(String),
    #[error("connection closed")]
    Closed,
}

/// A reply frame from the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GatewayFrame {
    Response {
        device_id: Option<String>,
        content: String,
        #[serde(default)]
        request_id: Option<Value>,
    },
    Error {
        message: String,
        #[serde(default)]
        request_id: Option<Value>,
    },
}

impl GatewayFrame {
    pub fn request_id(&self) -> Option<&Value> {
        match self {
            GatewayFrame::Response { request_id, .. } | GatewayFrame::Error { request_id, .. } => {
                request_id.as_ref()
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GatewayFrame::Error { .. })
    }
}

pub struct GatewayClient {
    stream: WsStream,
}

impl GatewayClient {
    /// Connect to `url` (ws:// or wss://), optionally announcing a device id.
    pub async fn connect(url: &str, device_id: Option<&str>) -> Result<Self, ClientError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        if let Some(id) = device_id {
            let value =
                HeaderValue::from_str(id).map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
            request.headers_mut().insert("device-id", value);
        }

        let (stream, _) = connect_async(request).await?;
        Ok(Self { stream })
    }

    pub async fn send_text(&mut self, text: &str) -> Result<(), ClientError> {
        self.stream.send(Message::text(text)).await?;
        Ok(())
    }

    pub async fn send_binary(&mut self, data: Vec<u8>) -> Result<(), ClientError> {
        self.stream.send(Message::binary(data)).await?;
        Ok(())
    }

    pub async fn send_json(&mut self, value: &Value) -> Result<(), ClientError> {
        self.send_text(&value.to_string()).await
    }

    /// Next text frame as raw JSON text. `None` once the gateway has closed.
    pub async fn next_text(&mut self) -> Result<Option<String>, ClientError> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Ok(Some(text.as_str().to_string())),
                Ok(Message::Binary(_)) => {
                    return Err(ClientError::UnexpectedFrame("binary".into()));
                }
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed)
                | Err(tungstenite::Error::AlreadyClosed)
                | Err(tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)) => {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }

    /// Next reply frame, decoded. `None` once the gateway has closed.
    pub async fn next_frame(&mut self) -> Result<Option<GatewayFrame>, ClientError> {
        match self.next_text().await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Send one flat-text request and wait for its reply.
    pub async fn ask(
        &mut self,
        text: &str,
        request_id: Option<&str>,
    ) -> Result<GatewayFrame, ClientError> {
        let mut payload = json!({ "text": text });
        if let Some(id) = request_id {
            payload["request_id"] = json!(id);
        }
        self.send_json(&payload).await?;
        self.next_frame().await?.ok_or(ClientError::Closed)
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_response_frames() {
        let frame: GatewayFrame = serde_json::from_str(
            r#"{"type":"response","device_id":"d1","content":"hi","request_id":"42"}"#,
        )
        .unwrap();
        assert_eq!(frame.request_id(), Some(&json!("42")));
        assert!(!frame.is_error());
    }

    #[test]
    fn decodes_error_frames_without_request_id() {
        let frame: GatewayFrame =
            serde_json::from_str(r#"{"type":"error","message":"nope"}"#).unwrap();
        assert_eq!(
            frame,
            GatewayFrame::Error {
                message: "nope".into(),
                request_id: None
            }
        );
    }
}
