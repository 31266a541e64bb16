//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use chat_gateway::backend::{BackendError, BackendResult, ChatBackend};
use chat_gateway::config::GatewayConfig;
use chat_gateway::http::GatewayServer;
use chat_gateway::lifecycle::Shutdown;
use chat_gateway::protocol::ChatTurn;

/// In-process backend with scripted behavior keyed on the last turn:
/// - `fail...` → simulated timeout
/// - `slow...` → answers after `SLOW_DELAY`
/// - `panic...` → panics inside the worker
/// - anything else → `echo: <content>`
#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<Vec<ChatTurn>>>,
}

pub const SLOW_DELAY: Duration = Duration::from_millis(800);

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Vec<ChatTurn>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ChatBackend for ScriptedBackend {
    fn complete(&self, turns: &[ChatTurn]) -> BackendResult<String> {
        self.calls.lock().unwrap().push(turns.to_vec());
        let last = turns.last().map(|t| t.content.as_str()).unwrap_or_default();

        if last.starts_with("fail") {
            return Err(BackendError::Timeout(1));
        }
        if last.starts_with("panic") {
            panic!("scripted backend panic");
        }
        if last.starts_with("slow") {
            std::thread::sleep(SLOW_DELAY);
        }
        Ok(format!("echo: {}", last))
    }
}

/// Config bound to an ephemeral port with the given device policy.
pub fn gateway_config(require_device_id: bool, allowed: &[&str]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.server.ip = "127.0.0.1".into();
    config.server.port = 0;
    config.gateway.require_device_id = require_device_id;
    config.gateway.allowed_devices = allowed.iter().map(|s| s.to_string()).collect();
    config.gateway.worker_pool_size = 4;
    config
}

/// Start a gateway in the background. Keep the returned `Shutdown` alive for
/// the duration of the test.
pub async fn start_gateway(
    config: GatewayConfig,
    backend: Arc<dyn ChatBackend>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config, backend);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

pub fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{}/", addr)
}

/// Read one HTTP/1.1 message (headers + Content-Length body) as text.
async fn read_http_message(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `raw` to the gateway over plain TCP and return the response text.
pub async fn send_raw_http(addr: SocketAddr, raw: &str) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(raw.as_bytes()).await.unwrap();
    read_http_message(&mut socket).await.unwrap()
}

/// Start a programmable OpenAI-compatible HTTP backend.
///
/// Every raw request is forwarded on the returned channel; `f` picks the
/// status and JSON body of the answer.
pub async fn start_completion_backend<F, Fut>(f: F) -> (SocketAddr, mpsc::UnboundedReceiver<String>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_http_message(&mut socket).await else {
                            return;
                        };
                        let _ = tx.send(request);

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            401 => "401 Unauthorized",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// A completion body whose first choice says `content`.
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
    .to_string()
}
