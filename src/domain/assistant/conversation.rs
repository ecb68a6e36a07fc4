//! Conversation aggregate and message entity.
//!
//! A conversation is created on first user contact, mutated on every turn,
//! and terminal once completed or abandoned. Messages are immutable once
//! created and exclusively owned by their conversation; their order is
//! preserved end-to-end and creation timestamps are non-decreasing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};

use super::form_data::SearchFormData;

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Completed,
    Abandoned,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Completed => "completed",
            ConversationStatus::Abandoned => "abandoned",
        }
    }

    /// True for the terminal states.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConversationStatus::Active)
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for unrecognized persisted enum values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for ConversationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConversationStatus::Active),
            "completed" => Ok(ConversationStatus::Completed),
            "abandoned" => Ok(ConversationStatus::Abandoned),
            other => Err(UnknownVariant {
                kind: "conversation status",
                value: other.to_string(),
            }),
        }
    }
}

/// Kind of assistant dialogue a conversation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    SchoolSearch,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::SchoolSearch => "school_search",
        }
    }
}

impl FromStr for ConversationKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "school_search" => Ok(ConversationKind::SchoolSearch),
            other => Err(UnknownVariant {
                kind: "conversation kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl FromStr for MessageRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(UnknownVariant {
                kind: "message role",
                value: other.to_string(),
            }),
        }
    }
}

/// One message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    /// Form-data fragment extracted on this turn (assistant messages only).
    pub extracted: Option<SearchFormData>,
    /// Estimated token count of the content at creation time.
    pub token_estimate: u32,
    /// Model round-trip time for assistant messages, in milliseconds.
    pub processing_time_ms: Option<u64>,
    pub created_at: Timestamp,
}

impl Message {
    /// Creates a user message.
    pub fn user(conversation_id: ConversationId, content: String, token_estimate: u32) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: MessageRole::User,
            content,
            extracted: None,
            token_estimate,
            processing_time_ms: None,
            created_at: Timestamp::now(),
        }
    }

    /// Creates an assistant message with its extracted fragment.
    pub fn assistant(
        conversation_id: ConversationId,
        content: String,
        extracted: Option<SearchFormData>,
        token_estimate: u32,
        processing_time_ms: Option<u64>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: MessageRole::Assistant,
            content,
            extracted,
            token_estimate,
            processing_time_ms,
            created_at: Timestamp::now(),
        }
    }
}

/// The conversation aggregate: status, accumulated form data, message log.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub kind: ConversationKind,
    pub status: ConversationStatus,
    pub form_data: SearchFormData,
    pub last_message_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Starts a new active conversation with empty form data
    /// (`next_step` unset).
    pub fn start(user_id: UserId, kind: ConversationKind) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConversationId::new(),
            user_id,
            kind,
            status: ConversationStatus::Active,
            form_data: SearchFormData::empty(),
            last_message_at: now,
            completed_at: None,
            created_at: now,
            messages: Vec::new(),
        }
    }

    /// Rebuilds a conversation from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ConversationId,
        user_id: UserId,
        kind: ConversationKind,
        status: ConversationStatus,
        form_data: SearchFormData,
        last_message_at: Timestamp,
        completed_at: Option<Timestamp>,
        created_at: Timestamp,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            id,
            user_id,
            kind,
            status,
            form_data,
            last_message_at,
            completed_at,
            created_at,
            messages,
        }
    }

    /// True once the conversation has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Appends a message and bumps the last-message timestamp.
    pub fn record_message(&mut self, message: Message) {
        self.last_message_at = message.created_at;
        self.messages.push(message);
    }

    /// Replaces the embedded form data.
    pub fn set_form_data(&mut self, form_data: SearchFormData) {
        self.form_data = form_data;
    }

    /// Transitions to `Completed`. No-op when already terminal.
    pub fn complete(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.status = ConversationStatus::Completed;
        self.completed_at = Some(Timestamp::now());
    }

    /// Transitions to `Abandoned`. No-op when already terminal.
    pub fn abandon(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.status = ConversationStatus::Abandoned;
    }
}
