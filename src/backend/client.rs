//! OpenAI-compatible chat-completion client.
//!
//! # Responsibilities
//! - POST `{base_url}/chat/completions` with the configured model
//! - Enforce the configured request timeout
//! - Return the first choice's text, or one error carrying the upstream detail

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::backend::types::{BackendError, BackendResult, ChatBackend};
use crate::config::OpenAiConfig;
use crate::protocol::ChatTurn;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Blocking chat-completion client.
///
/// Wraps an async `reqwest` client and drives it on the runtime it was
/// created in. `complete` must be called from a blocking worker thread
/// (see [`WorkerPool`](crate::backend::WorkerPool)), never from an async task.
#[derive(Clone)]
pub struct OpenAiBackend {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    timeout_secs: u64,
    runtime: Handle,
}

impl OpenAiBackend {
    /// Build a client from configuration. Must be called inside a Tokio runtime.
    pub fn new(config: &OpenAiConfig) -> BackendResult<Self> {
        let runtime = Handle::try_current().map_err(|e| BackendError::Config(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !config.api_key.is_empty() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| BackendError::Config(format!("invalid api key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        tracing::info!(
            endpoint = %endpoint,
            model = %config.model,
            timeout_secs = config.timeout,
            "Backend client initialized"
        );

        Ok(Self {
            http,
            endpoint,
            model: config.model.clone(),
            timeout_secs: config.timeout,
            runtime,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, turns: &[ChatTurn]) -> BackendResult<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages: turns,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        extract_content(&text)
    }

    fn map_transport(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else {
            BackendError::Transport(err.to_string())
        }
    }
}

impl ChatBackend for OpenAiBackend {
    fn complete(&self, turns: &[ChatTurn]) -> BackendResult<String> {
        self.runtime.block_on(self.request(turns))
    }
}

/// Pull the first choice's text out of a completion body.
///
/// No choices or no content yields an empty string.
pub fn extract_content(body: &str) -> BackendResult<String> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| BackendError::Malformed(e.to_string()))?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default())
}
