//! Chat-completion request types and the HTTP transport.

use notes_core::{Error, Result};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI chat completions URL.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Connection settings for the completion endpoint.
///
/// ```ignore
/// let config = OpenAiConfig::new(api_key)
///     .with_model("gpt-4o-mini")
///     .with_timeout(Duration::from_secs(120));
/// ```
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer credential; never logged.
    api_key: Secret<String>,
    pub model: String,
    pub endpoint: String,
    /// Per-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// One message of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A request holding a single user message.
    pub fn user(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: content.into(),
            }],
        }
    }
}

/// Sends a chat request and returns the raw reply body.
///
/// Only transport failures are errors here; interpreting the body is left
/// to [`crate::reply::decode_reply`].
pub trait CompletionTransport {
    fn send(&self, request: &ChatRequest) -> Result<String>;
}

impl<F> CompletionTransport for F
where
    F: Fn(&ChatRequest) -> Result<String>,
{
    fn send(&self, request: &ChatRequest) -> Result<String> {
        self(request)
    }
}

/// Blocking HTTP transport with bearer-token authorization.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: Secret<String>,
}

impl HttpTransport {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: Secret::new(config.api_key().to_string()),
        })
    }
}

impl CompletionTransport for HttpTransport {
    fn send(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    Error::NetworkError(format!("Request timed out: {}", e))
                } else if e.is_connect() {
                    Error::NetworkError(format!("Connection failed: {}", e))
                } else {
                    Error::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            // The body usually carries an `error` object; let the decoder report it.
            log::warn!("Completion endpoint answered with HTTP {}", status);
        }

        response
            .text()
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))
    }
}
