//! CompleteForm command handler.
//!
//! Closes a conversation explicitly and hands back the final form, for
//! callers that want to stop the dialogue early or confirm completion.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::domain::assistant::{ConversationStatus, SearchFormData};
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStore, StoreError};

/// Errors that can occur when completing a form.
#[derive(Debug, Error)]
pub enum CompleteFormError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Conversation {0} was abandoned and cannot be completed")]
    ConversationAbandoned(ConversationId),

    #[error("Conversation {0} does not meet the minimum search requirements")]
    RequirementsNotMet(ConversationId),

    #[error("Storage error: {0}")]
    Store(String),
}

impl From<StoreError> for CompleteFormError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CompleteFormError::NotFound(id),
            StoreError::Database(message) => CompleteFormError::Store(message),
        }
    }
}

/// Marks a conversation completed and returns its form.
pub struct CompleteFormHandler {
    store: Arc<dyn ConversationStore>,
}

impl CompleteFormHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Completes the conversation when the required slots are filled.
    ///
    /// Idempotent for already-completed conversations: the stored form is
    /// returned without another transition. Abandoned conversations are
    /// rejected; they are never resumed or closed as successful.
    pub async fn handle(
        &self,
        conversation_id: ConversationId,
    ) -> Result<SearchFormData, CompleteFormError> {
        let conversation = self.store.find_by_id(conversation_id).await?;

        if conversation.status == ConversationStatus::Completed {
            return Ok(conversation.form_data);
        }
        if conversation.status == ConversationStatus::Abandoned {
            return Err(CompleteFormError::ConversationAbandoned(conversation_id));
        }
        if !conversation.form_data.meets_minimum_requirements {
            return Err(CompleteFormError::RequirementsNotMet(conversation_id));
        }

        self.store
            .transition(conversation_id, ConversationStatus::Completed)
            .await?;
        info!(conversation_id = %conversation_id, "conversation completed");

        Ok(conversation.form_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryConversationStore;
    use crate::domain::assistant::{Conversation, ConversationKind};
    use crate::domain::foundation::UserId;

    fn conversation_with_minimum() -> Conversation {
        let mut conversation = Conversation::start(
            UserId::new("alice").unwrap(),
            ConversationKind::SchoolSearch,
        );
        let mut form = conversation.form_data.clone();
        form.city = Some("İstanbul".to_string());
        form.institution_type_group = Some("Okul".to_string());
        form.institution_type = Some("Lise".to_string());
        form.recompute();
        conversation.set_form_data(form);
        conversation
    }

    #[tokio::test]
    async fn completes_when_minimum_requirements_are_met() {
        let store = Arc::new(InMemoryConversationStore::new());
        let conversation = conversation_with_minimum();
        let id = conversation.id;
        store.insert(conversation);

        let handler = CompleteFormHandler::new(store.clone());
        let form = handler.handle(id).await.unwrap();

        assert!(form.meets_minimum_requirements);
        assert_eq!(
            store.find_by_id(id).await.unwrap().status,
            ConversationStatus::Completed
        );
    }

    #[tokio::test]
    async fn rejects_an_underfilled_form() {
        let store = Arc::new(InMemoryConversationStore::new());
        let conversation = Conversation::start(
            UserId::new("alice").unwrap(),
            ConversationKind::SchoolSearch,
        );
        let id = conversation.id;
        store.insert(conversation);

        let handler = CompleteFormHandler::new(store);
        let err = handler.handle(id).await.unwrap_err();

        assert!(matches!(err, CompleteFormError::RequirementsNotMet(_)));
    }

    #[tokio::test]
    async fn is_idempotent_for_completed_conversations() {
        let store = Arc::new(InMemoryConversationStore::new());
        let conversation = conversation_with_minimum();
        let id = conversation.id;
        store.insert(conversation);

        let handler = CompleteFormHandler::new(store);
        handler.handle(id).await.unwrap();
        let form = handler.handle(id).await.unwrap();

        assert!(form.meets_minimum_requirements);
    }

    #[tokio::test]
    async fn rejects_abandoned_conversations_even_with_a_filled_form() {
        let store = Arc::new(InMemoryConversationStore::new());
        let mut conversation = conversation_with_minimum();
        conversation.abandon();
        let id = conversation.id;
        store.insert(conversation);

        let handler = CompleteFormHandler::new(store.clone());
        let err = handler.handle(id).await.unwrap_err();

        assert!(matches!(err, CompleteFormError::ConversationAbandoned(got) if got == id));
        assert_eq!(
            store.find_by_id(id).await.unwrap().status,
            ConversationStatus::Abandoned
        );
    }

    #[tokio::test]
    async fn reports_missing_conversations() {
        let handler = CompleteFormHandler::new(Arc::new(InMemoryConversationStore::new()));
        let missing = ConversationId::new();

        let err = handler.handle(missing).await.unwrap_err();
        assert!(matches!(err, CompleteFormError::NotFound(id) if id == missing));
    }
}
