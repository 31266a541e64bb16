//! WebSocket entry point and per-connection session.
//!
//! # Responsibilities
//! - Answer plain (non-upgrade) requests as a health probe
//! - Claim a session slot and complete the upgrade
//! - Authenticate the device once, before any frame is read
//! - Run the receive loop: normalize → worker pool → reply
//!
//! # Session States
//! ```text
//! Connecting → Authenticating → Open → Closed
//!                    └── rejected ──────↗
//! ```
//!
//! # Design Decisions
//! - One frame at a time per connection; the next frame is read only after
//!   the previous reply was sent, so replies keep arrival order
//! - Every text or binary frame gets exactly one reply frame
//! - Failures stay inside the session; the listener never sees them

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;
use crate::net::ConnectionPermit;
use crate::observability::metrics::{self, FrameOutcome};
use crate::protocol::{normalize, ChatRequest, OutboundFrame, RawFrame};
use crate::security::{authorize, device_id_from_headers};

/// Body returned to plain HTTP requests.
pub const HEALTH_BODY: &str = "Gateway is running\n";

/// Body returned when every session slot is taken.
pub const CAPACITY_BODY: &str = "Too many connections\n";

/// Single handler for every path: health probe or WebSocket session.
pub async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) if is_upgrade_request(&headers) => {
            tracing::debug!(
                peer_addr = %peer_addr,
                reason = %rejection,
                "Malformed upgrade request"
            );
            metrics::session_rejected("handshake");
            return rejection.into_response();
        }
        Err(_) => return (StatusCode::OK, HEALTH_BODY).into_response(),
    };

    let Some(permit) = state.limiter.try_acquire() else {
        tracing::warn!(
            peer_addr = %peer_addr,
            max_connections = state.limiter.max_connections(),
            "Session limit reached, refusing upgrade"
        );
        metrics::session_rejected("capacity");
        return (StatusCode::SERVICE_UNAVAILABLE, CAPACITY_BODY).into_response();
    };

    let device_id = device_id_from_headers(&headers);
    ws.on_upgrade(move |socket| async move {
        Session::new(permit, device_id, peer_addr, state).run(socket).await;
    })
}

/// True when the `Connection` header carries an `upgrade` token.
fn is_upgrade_request(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
}

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Open,
    Closed,
}

/// One accepted WebSocket connection.
pub struct Session {
    permit: ConnectionPermit,
    device_id: Option<String>,
    peer_addr: SocketAddr,
    state: SessionState,
    ctx: AppState,
}

impl Session {
    pub fn new(
        permit: ConnectionPermit,
        device_id: Option<String>,
        peer_addr: SocketAddr,
        ctx: AppState,
    ) -> Self {
        Self {
            permit,
            device_id,
            peer_addr,
            state: SessionState::Connecting,
            ctx,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        tracing::trace!(
            session_id = %self.permit.id(),
            from = ?self.state,
            to = ?next,
            "Session state change"
        );
        self.state = next;
    }

    /// Drive the session until the transport closes.
    pub async fn run(mut self, mut socket: WebSocket) {
        let session_id = self.permit.id();
        self.transition(SessionState::Authenticating);

        if let Err(e) = authorize(&self.ctx.policy, self.device_id.as_deref()) {
            tracing::warn!(
                session_id = %session_id,
                peer_addr = %self.peer_addr,
                device_id = ?self.device_id,
                reason = %e,
                "Connection rejected"
            );
            metrics::session_rejected(e.reason());
            let frame = OutboundFrame::error(e.to_string(), None);
            if socket.send(Message::Text(frame.to_json().into())).await.is_ok() {
                let _ = socket.send(Message::Close(None)).await;
            }
            self.transition(SessionState::Closed);
            return;
        }

        self.transition(SessionState::Open);
        tracing::info!(
            session_id = %session_id,
            peer_addr = %self.peer_addr,
            device_id = ?self.device_id,
            "Connection established"
        );

        while let Some(message) = socket.recv().await {
            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(session_id = %session_id, error = %e, "Transport error");
                    break;
                }
            };

            let reply = match message {
                Message::Text(text) => self.handle_frame(RawFrame::Text(text.as_str())).await,
                Message::Binary(data) => self.handle_frame(RawFrame::Binary(&data[..])).await,
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => break,
            };

            if let Err(e) = socket.send(Message::Text(reply.to_json().into())).await {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Client gone before reply could be sent, result dropped"
                );
                break;
            }
        }

        self.transition(SessionState::Closed);
        tracing::info!(
            session_id = %session_id,
            device_id = ?self.device_id,
            "Client disconnected"
        );
    }

    /// Produce the single reply for one inbound frame.
    async fn handle_frame(&self, frame: RawFrame<'_>) -> OutboundFrame {
        let ChatRequest { turns, request_id } = match normalize(frame) {
            Ok(request) => request,
            Err(rejection) => {
                tracing::debug!(
                    session_id = %self.permit.id(),
                    reason = %rejection.error,
                    "Rejected frame"
                );
                metrics::frame_handled(FrameOutcome::ProtocolError);
                return OutboundFrame::error(rejection.error.to_string(), rejection.request_id);
            }
        };

        tracing::debug!(
            session_id = %self.permit.id(),
            turns = turns.len(),
            request_id = ?request_id,
            "Dispatching to backend"
        );

        let backend = self.ctx.backend.clone();
        let start = Instant::now();
        let result = self.ctx.pool.run(move || backend.complete(&turns)).await;
        metrics::backend_call(start);

        let failure = match result {
            Ok(Ok(content)) => {
                metrics::frame_handled(FrameOutcome::Response);
                return OutboundFrame::response(self.device_id.as_deref(), content, request_id);
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };

        tracing::error!(
            session_id = %self.permit.id(),
            device_id = ?self.device_id,
            error = %failure,
            "Backend request failed"
        );
        metrics::frame_handled(FrameOutcome::BackendError);
        OutboundFrame::error(format!("backend request failed: {}", failure), request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn connection_upgrade_token_is_detected() {
        let mut headers = HeaderMap::new();
        assert!(!is_upgrade_request(&headers));

        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        assert!(!is_upgrade_request(&headers));

        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"));
        assert!(is_upgrade_request(&headers));
    }
}
