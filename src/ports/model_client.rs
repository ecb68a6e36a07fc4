//! Port for the chat-completion model backend.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Role of a chat message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message in the request sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The model's reply plus how long the round trip took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub content: String,
    pub elapsed: Duration,
}

/// Errors surfaced by the model backend.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("could not connect to the model backend")]
    Connect,

    #[error("model transport error: {0}")]
    Transport(String),

    #[error("model backend returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("model reply was not in the expected shape: {0}")]
    MalformedResponse(String),
}

/// Chat-completion backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Sends one turn: system prompt, trimmed history, and the user's
    /// latest message, in that order.
    async fn send(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<ModelReply, ModelError>;

    /// True when the backend answers a cheap liveness probe.
    async fn health_check(&self) -> bool;
}
