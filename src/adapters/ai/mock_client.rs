//! Mock model client for testing.
//!
//! Configurable to return scripted replies in order, inject errors, and
//! record every request for verification, so handler tests run without a
//! model server.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::ports::{ChatMessage, ModelClient, ModelError, ModelReply};

/// A recorded request, for asserting on what the handler sent.
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub user_message: String,
}

/// Error kinds the mock can inject.
#[derive(Debug, Clone)]
pub enum MockModelError {
    Timeout { timeout_secs: u64 },
    Connect,
    UnexpectedStatus { status: u16, body: String },
    Malformed { message: String },
}

impl From<MockModelError> for ModelError {
    fn from(err: MockModelError) -> Self {
        match err {
            MockModelError::Timeout { timeout_secs } => ModelError::Timeout { timeout_secs },
            MockModelError::Connect => ModelError::Connect,
            MockModelError::UnexpectedStatus { status, body } => {
                ModelError::UnexpectedStatus { status, body }
            }
            MockModelError::Malformed { message } => ModelError::MalformedResponse(message),
        }
    }
}

enum Scripted {
    Reply(String),
    Error(MockModelError),
}

/// Scripted model backend.
#[derive(Clone)]
pub struct MockModelClient {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<RecordedSend>>>,
    healthy: bool,
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModelClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            healthy: true,
        }
    }

    /// Queues a reply, returned verbatim as the model's content.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(content.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: MockModelError) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Error(error));
        self
    }

    /// Marks the backend as failing its health probe.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedSend> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for Scripted {
    fn default() -> Self {
        Scripted::Reply("{}".to_string())
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn send(
        &self,
        system_prompt: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<ModelReply, ModelError> {
        self.calls.lock().unwrap().push(RecordedSend {
            system_prompt: system_prompt.to_string(),
            history: history.to_vec(),
            user_message: user_message.to_string(),
        });

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();

        match next {
            Scripted::Reply(content) => Ok(ModelReply {
                content,
                elapsed: Duration::from_millis(1),
            }),
            Scripted::Error(err) => Err(err.into()),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_scripted_replies_in_order() {
        let client = MockModelClient::new()
            .with_reply("first")
            .with_reply("second");

        let r1 = client.send("sys", &[], "hello").await.unwrap();
        let r2 = client.send("sys", &[], "again").await.unwrap();

        assert_eq!(r1.content, "first");
        assert_eq!(r2.content, "second");
    }

    #[tokio::test]
    async fn falls_back_to_empty_object_when_exhausted() {
        let client = MockModelClient::new();
        let reply = client.send("sys", &[], "hello").await.unwrap();
        assert_eq!(reply.content, "{}");
    }

    #[tokio::test]
    async fn injects_errors() {
        let client = MockModelClient::new().with_error(MockModelError::Timeout { timeout_secs: 120 });

        let err = client.send("sys", &[], "hello").await.unwrap_err();
        assert!(matches!(err, ModelError::Timeout { timeout_secs: 120 }));
    }

    #[tokio::test]
    async fn records_what_was_sent() {
        let client = MockModelClient::new().with_reply("ok");
        let history = vec![ChatMessage::user("earlier")];

        client.send("the prompt", &history, "latest").await.unwrap();

        assert_eq!(client.call_count(), 1);
        let call = &client.calls()[0];
        assert_eq!(call.system_prompt, "the prompt");
        assert_eq!(call.history.len(), 1);
        assert_eq!(call.user_message, "latest");
    }

    #[tokio::test]
    async fn health_check_reflects_configuration() {
        assert!(MockModelClient::new().health_check().await);
        assert!(!MockModelClient::new().unhealthy().health_check().await);
    }
}
