//! Ollama client - implementation of [`ModelClient`] for a local Ollama server.
//!
//! Talks to the `/api/chat` endpoint with streaming disabled; a turn is one
//! request, one JSON reply.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OllamaConfig::new("qwen2.5:7b")
//!     .with_endpoint("http://localhost:11434")
//!     .with_request_timeout(Duration::from_secs(120));
//!
//! let client = OllamaClient::new(config);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::ModelConfig;
use crate::ports::{ChatMessage, ModelClient, ModelError, ModelReply};

/// Configuration for the Ollama client.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server (default: http://localhost:11434).
    pub endpoint: String,
    /// Model tag to run (e.g., "qwen2.5:7b").
    pub model: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Full request timeout; generation on CPU can take a while.
    pub request_timeout: Duration,
    /// Sampling temperature. Low, extraction wants determinism.
    pub temperature: f32,
    /// Cap on generated tokens.
    pub max_output_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
}

impl OllamaConfig {
    /// Creates a configuration for the given model tag.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: model.into(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(120),
            temperature: 0.2,
            max_output_tokens: 1024,
            top_k: 40,
            top_p: 0.9,
        }
    }

    /// Sets the server endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the TCP connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the full request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the generated-token cap.
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

impl From<&ModelConfig> for OllamaConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            top_k: config.top_k,
            top_p: config.top_p,
        }
    }
}

/// Ollama chat backend.
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
}

impl OllamaClient {
    /// Creates a client with the given configuration.
    pub fn new(config: OllamaConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.endpoint)
    }

    fn to_wire_request(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> OllamaRequest {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(OllamaMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        });
        for msg in history {
            messages.push(OllamaMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            });
        }
        messages.push(OllamaMessage {
            role: "user".to_string(),
            content: user_message.to_string(),
        });

        OllamaRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
            },
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ModelError {
        if err.is_timeout() {
            ModelError::Timeout {
                timeout_secs: self.config.request_timeout.as_secs(),
            }
        } else if err.is_connect() {
            ModelError::Connect
        } else {
            ModelError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn send(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<ModelReply, ModelError> {
        let request = self.to_wire_request(system_prompt, history, user_message);
        let started = Instant::now();

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let reply: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;

        Ok(ModelReply {
            content: reply.message.content,
            elapsed: started.elapsed(),
        })
    }

    async fn health_check(&self) -> bool {
        match self.client.get(&self.config.endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    max_output_tokens: u32,
    top_k: u32,
    top_p: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}
