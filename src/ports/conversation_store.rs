//! Persistence port for conversations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::assistant::{
    Conversation, ConversationKind, ConversationStatus, Message, SearchFormData,
};
use crate::domain::foundation::{ConversationId, UserId};

/// Errors surfaced by conversation persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn database(message: impl Into<String>) -> Self {
        StoreError::Database(message.into())
    }
}

/// Storage for conversations and their messages.
///
/// Implementations must keep message order stable and make
/// [`record_turn`](ConversationStore::record_turn) atomic: the message and
/// the form data land together or not at all.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the user's active conversation of the given kind, creating
    /// one when none exists.
    async fn get_or_create_active(
        &self,
        user_id: &UserId,
        kind: ConversationKind,
    ) -> Result<Conversation, StoreError>;

    /// Loads a conversation with its full message history.
    async fn find_by_id(&self, id: ConversationId) -> Result<Conversation, StoreError>;

    /// Appends a message and advances the conversation's last-message time.
    async fn append_message(&self, message: &Message) -> Result<(), StoreError>;

    /// Appends a message and replaces the form data in one atomic step.
    async fn record_turn(
        &self,
        id: ConversationId,
        message: &Message,
        form_data: &SearchFormData,
    ) -> Result<(), StoreError>;

    /// Replaces the conversation's form data.
    async fn set_form_data(
        &self,
        id: ConversationId,
        form_data: &SearchFormData,
    ) -> Result<(), StoreError>;

    /// Reads the conversation's current form data.
    async fn get_form_data(&self, id: ConversationId) -> Result<SearchFormData, StoreError>;

    /// Moves a conversation to the given status. Conversations already in a
    /// terminal status are left untouched.
    async fn transition(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), StoreError>;

    /// Marks active conversations idle for longer than the threshold as
    /// abandoned, returning how many were affected.
    async fn sweep_idle(&self, idle_for: chrono::Duration) -> Result<u64, StoreError>;
}
