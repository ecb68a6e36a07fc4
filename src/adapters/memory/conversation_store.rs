//! In-memory conversation store.
//!
//! Backs handler tests and local development. Same semantics as the
//! Postgres store: stable message order, terminal statuses never
//! transition, the idle sweep only touches active conversations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::assistant::{
    Conversation, ConversationKind, ConversationStatus, Message, SearchFormData,
};
use crate::domain::foundation::{ConversationId, Timestamp, UserId};
use crate::ports::{ConversationStore, StoreError};

/// Conversation storage in a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryConversationStore {
    conversations: Mutex<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a conversation, for tests that need pre-existing state.
    pub fn insert(&self, conversation: Conversation) {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation);
    }

    fn with_conversation<T>(
        &self,
        id: ConversationId,
        f: impl FnOnce(&mut Conversation) -> T,
    ) -> Result<T, StoreError> {
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(f(conversation))
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_or_create_active(
        &self,
        user_id: &UserId,
        kind: ConversationKind,
    ) -> Result<Conversation, StoreError> {
        let mut conversations = self.conversations.lock().unwrap();

        if let Some(existing) = conversations
            .values()
            .find(|c| c.user_id == *user_id && c.kind == kind && !c.is_terminal())
        {
            return Ok(existing.clone());
        }

        let conversation = Conversation::start(user_id.clone(), kind);
        conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Conversation, StoreError> {
        self.conversations
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn append_message(&self, message: &Message) -> Result<(), StoreError> {
        self.with_conversation(message.conversation_id, |conversation| {
            conversation.record_message(message.clone());
        })
    }

    async fn record_turn(
        &self,
        id: ConversationId,
        message: &Message,
        form_data: &SearchFormData,
    ) -> Result<(), StoreError> {
        self.with_conversation(id, |conversation| {
            conversation.record_message(message.clone());
            conversation.set_form_data(form_data.clone());
        })
    }

    async fn set_form_data(
        &self,
        id: ConversationId,
        form_data: &SearchFormData,
    ) -> Result<(), StoreError> {
        self.with_conversation(id, |conversation| {
            conversation.set_form_data(form_data.clone());
        })
    }

    async fn get_form_data(&self, id: ConversationId) -> Result<SearchFormData, StoreError> {
        self.with_conversation(id, |conversation| conversation.form_data.clone())
    }

    async fn transition(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), StoreError> {
        self.with_conversation(id, |conversation| match status {
            ConversationStatus::Completed => conversation.complete(),
            ConversationStatus::Abandoned => conversation.abandon(),
            ConversationStatus::Active => {}
        })
    }

    async fn sweep_idle(&self, idle_for: chrono::Duration) -> Result<u64, StoreError> {
        let cutoff = Timestamp::now().minus(idle_for);
        let mut swept = 0;

        let mut conversations = self.conversations.lock().unwrap();
        for conversation in conversations.values_mut() {
            if !conversation.is_terminal() && conversation.last_message_at.is_before(&cutoff) {
                conversation.abandon();
                swept += 1;
            }
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn get_or_create_reuses_the_active_conversation() {
        let store = InMemoryConversationStore::new();
        let alice = user("alice");

        let first = store
            .get_or_create_active(&alice, ConversationKind::SchoolSearch)
            .await
            .unwrap();
        let second = store
            .get_or_create_active(&alice, ConversationKind::SchoolSearch)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn terminal_conversations_are_not_reused() {
        let store = InMemoryConversationStore::new();
        let alice = user("alice");

        let first = store
            .get_or_create_active(&alice, ConversationKind::SchoolSearch)
            .await
            .unwrap();
        store
            .transition(first.id, ConversationStatus::Completed)
            .await
            .unwrap();

        let second = store
            .get_or_create_active(&alice, ConversationKind::SchoolSearch)
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn users_get_separate_conversations() {
        let store = InMemoryConversationStore::new();

        let a = store
            .get_or_create_active(&user("alice"), ConversationKind::SchoolSearch)
            .await
            .unwrap();
        let b = store
            .get_or_create_active(&user("bob"), ConversationKind::SchoolSearch)
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn find_by_id_reports_missing_conversations() {
        let store = InMemoryConversationStore::new();
        let missing = ConversationId::new();

        let err = store.find_by_id(missing).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn record_turn_persists_message_and_form_together() {
        let store = InMemoryConversationStore::new();
        let conversation = store
            .get_or_create_active(&user("alice"), ConversationKind::SchoolSearch)
            .await
            .unwrap();

        let mut form = SearchFormData::initial();
        form.city = Some("Ankara".to_string());
        form.recompute();
        let message = Message::assistant(conversation.id, "Noted.".to_string(), None, 2, Some(10));

        store
            .record_turn(conversation.id, &message, &form)
            .await
            .unwrap();

        let loaded = store.find_by_id(conversation.id).await.unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.form_data.city.as_deref(), Some("Ankara"));
    }

    #[tokio::test]
    async fn form_data_round_trips() {
        let store = InMemoryConversationStore::new();
        let conversation = store
            .get_or_create_active(&user("alice"), ConversationKind::SchoolSearch)
            .await
            .unwrap();

        let mut form = SearchFormData::initial();
        form.city = Some("İzmir".to_string());
        form.recompute();
        store.set_form_data(conversation.id, &form).await.unwrap();

        let loaded = store.get_form_data(conversation.id).await.unwrap();
        assert_eq!(loaded, form);
    }

    #[tokio::test]
    async fn transition_to_terminal_is_sticky() {
        let store = InMemoryConversationStore::new();
        let conversation = store
            .get_or_create_active(&user("alice"), ConversationKind::SchoolSearch)
            .await
            .unwrap();

        store
            .transition(conversation.id, ConversationStatus::Completed)
            .await
            .unwrap();
        store
            .transition(conversation.id, ConversationStatus::Abandoned)
            .await
            .unwrap();

        let loaded = store.find_by_id(conversation.id).await.unwrap();
        assert_eq!(loaded.status, ConversationStatus::Completed);
    }

    #[tokio::test]
    async fn sweep_abandons_only_idle_active_conversations() {
        let store = InMemoryConversationStore::new();

        let mut stale = Conversation::start(user("alice"), ConversationKind::SchoolSearch);
        stale.last_message_at = Timestamp::now().minus(chrono::Duration::hours(48));
        let stale_id = stale.id;
        store.insert(stale);

        let fresh = store
            .get_or_create_active(&user("bob"), ConversationKind::SchoolSearch)
            .await
            .unwrap();

        let mut completed = Conversation::start(user("carol"), ConversationKind::SchoolSearch);
        completed.last_message_at = Timestamp::now().minus(chrono::Duration::hours(48));
        completed.complete();
        let completed_id = completed.id;
        store.insert(completed);

        let swept = store.sweep_idle(chrono::Duration::hours(24)).await.unwrap();
        assert_eq!(swept, 1);

        assert_eq!(
            store.find_by_id(stale_id).await.unwrap().status,
            ConversationStatus::Abandoned
        );
        assert_eq!(
            store.find_by_id(fresh.id).await.unwrap().status,
            ConversationStatus::Active
        );
        assert_eq!(
            store.find_by_id(completed_id).await.unwrap().status,
            ConversationStatus::Completed
        );
    }
}
