//! SubmitMessage command handler.
//!
//! Drives one turn of the school-search dialogue: resolve the conversation,
//! persist the user's message, call the model with a taxonomy-aware prompt,
//! then merge, validate, and persist the extracted form data.
//!
//! Failures after the user's message is stored never lose the turn: the
//! handler logs the cause and answers with a fixed apology, leaving the
//! conversation active so the user can simply try again.

use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::domain::assistant::{
    merge, ContextBuilder, Conversation, ConversationKind, ConversationStatus, ContextWindow,
    Message, MessageRole, ResponseParser, SearchFormData, SlotStep, TaxonomyView, TokenEstimator,
    Validator,
};
use crate::domain::foundation::{ConversationId, MessageId, UserId};
use crate::ports::{
    ChatMessage, ConversationStore, ModelClient, StoreError, TaxonomyError, TaxonomyService,
};

/// Canned reply for the opening turn, before any extraction happens.
pub const WELCOME_MESSAGE: &str = "Merhaba! Size uygun okulu bulmanıza yardımcı olacağım. \
     Hangi şehirde arama yapmak istersiniz?";

/// Canned reply when the turn cannot be processed.
pub const APOLOGY_MESSAGE: &str = "Üzgünüm, şu anda isteğinizi işleyemiyorum. \
     Lütfen biraz sonra tekrar deneyin.";

/// Command to submit one user message.
#[derive(Debug, Clone)]
pub struct SubmitMessageCommand {
    /// The user speaking.
    pub user_id: UserId,
    /// Continue this conversation; `None` resumes the user's active one or
    /// starts fresh.
    pub conversation_id: Option<ConversationId>,
    /// The message text.
    pub text: String,
}

impl SubmitMessageCommand {
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            conversation_id: None,
            text: text.into(),
        }
    }

    pub fn in_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }
}

/// Errors that end a turn without an assistant reply.
#[derive(Debug, Error)]
pub enum SubmitMessageError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Conversation {0} is closed and cannot accept new messages")]
    ConversationClosed(ConversationId),

    #[error("Storage error: {0}")]
    Store(String),
}

impl From<StoreError> for SubmitMessageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SubmitMessageError::NotFound(id),
            StoreError::Database(message) => SubmitMessageError::Store(message),
        }
    }
}

/// Result of one processed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    /// Id of the persisted assistant message; `None` when the turn failed
    /// and the apology reply was never stored.
    pub message_id: Option<MessageId>,
    pub role: MessageRole,
    /// The text shown to the user.
    pub content: String,
    /// Accumulated form state after this turn.
    pub extracted_form_data: SearchFormData,
    pub is_form_complete: bool,
    pub processing_time_ms: Option<u64>,
}

/// Handles one user turn end to end.
pub struct SubmitMessageHandler {
    store: Arc<dyn ConversationStore>,
    model: Arc<dyn ModelClient>,
    taxonomy: Arc<dyn TaxonomyService>,
    estimator: Arc<dyn TokenEstimator>,
    window: ContextWindow,
}

impl SubmitMessageHandler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        model: Arc<dyn ModelClient>,
        taxonomy: Arc<dyn TaxonomyService>,
        estimator: Arc<dyn TokenEstimator>,
        window: ContextWindow,
    ) -> Self {
        Self {
            store,
            model,
            taxonomy,
            estimator,
            window,
        }
    }

    /// Processes one turn.
    pub async fn handle(
        &self,
        command: SubmitMessageCommand,
    ) -> Result<TurnOutcome, SubmitMessageError> {
        let conversation = self.resolve_conversation(&command).await?;

        let user_message = Message::user(
            conversation.id,
            command.text.clone(),
            self.estimator.estimate(&command.text),
        );
        self.store.append_message(&user_message).await?;

        // Opening turn: greet and point at the first slot without burning a
        // model round trip. The text itself is stored, not extracted from.
        if conversation.form_data.next_step.is_none() {
            return self.welcome_turn(&conversation).await;
        }

        match self.extraction_turn(&conversation, &command.text).await {
            Ok(outcome) => Ok(outcome),
            Err(cause) => {
                warn!(
                    conversation_id = %conversation.id,
                    error = %cause,
                    "turn processing failed, replying with apology"
                );
                Ok(self.apology_outcome(&conversation))
            }
        }
    }

    async fn resolve_conversation(
        &self,
        command: &SubmitMessageCommand,
    ) -> Result<Conversation, SubmitMessageError> {
        match command.conversation_id {
            Some(id) => {
                let conversation = self.store.find_by_id(id).await?;
                if conversation.is_terminal() {
                    return Err(SubmitMessageError::ConversationClosed(id));
                }
                Ok(conversation)
            }
            None => Ok(self
                .store
                .get_or_create_active(&command.user_id, ConversationKind::SchoolSearch)
                .await?),
        }
    }

    async fn welcome_turn(
        &self,
        conversation: &Conversation,
    ) -> Result<TurnOutcome, SubmitMessageError> {
        let form = SearchFormData::initial();
        let reply = Message::assistant(
            conversation.id,
            WELCOME_MESSAGE.to_string(),
            Some(form.clone()),
            self.estimator.estimate(WELCOME_MESSAGE),
            None,
        );
        self.store
            .record_turn(conversation.id, &reply, &form)
            .await?;

        Ok(TurnOutcome {
            conversation_id: conversation.id,
            message_id: Some(reply.id),
            role: MessageRole::Assistant,
            content: WELCOME_MESSAGE.to_string(),
            extracted_form_data: form,
            is_form_complete: false,
            processing_time_ms: None,
        })
    }

    async fn extraction_turn(
        &self,
        conversation: &Conversation,
        text: &str,
    ) -> Result<TurnOutcome, TurnFailure> {
        let view = self.load_view(&conversation.form_data).await?;
        let system_prompt = ContextBuilder::system_prompt(&conversation.form_data, &view);

        // History is what the model saw before this turn; the new user
        // message travels separately and is always included.
        let trimmed = self
            .window
            .trim(&conversation.messages, self.estimator.as_ref());
        let history: Vec<ChatMessage> = trimmed
            .iter()
            .map(|m| match m.role {
                MessageRole::User => ChatMessage::user(m.content.clone()),
                MessageRole::Assistant => ChatMessage::assistant(m.content.clone()),
            })
            .collect();

        let reply = self.model.send(&system_prompt, &history, text).await?;

        let fragment = ResponseParser::parse(&reply.content);
        let mut merged = merge(&conversation.form_data, &fragment);

        let merged_view = self.load_view(&merged).await?;
        let report = Validator::validate(&merged, &merged_view);
        if !report.is_valid() {
            // Hold the plan at the current slot and re-prompt.
            merged.user_message = Some(report.summary());
            merged.next_step = conversation.form_data.next_step;
            merged.recompute();
        }

        let elapsed_ms = reply.elapsed.as_millis() as u64;
        let assistant_message = Message::assistant(
            conversation.id,
            reply.content.clone(),
            Some(merged.clone()),
            self.estimator.estimate(&reply.content),
            Some(elapsed_ms),
        );
        self.store
            .record_turn(conversation.id, &assistant_message, &merged)
            .await?;

        let is_form_complete = merged.next_step == Some(SlotStep::Complete)
            && merged.meets_minimum_requirements
            && report.is_valid();
        if is_form_complete {
            self.store
                .transition(conversation.id, ConversationStatus::Completed)
                .await?;
        }

        let content = merged
            .user_message
            .clone()
            .unwrap_or_else(|| reply.content.clone());

        Ok(TurnOutcome {
            conversation_id: conversation.id,
            message_id: Some(assistant_message.id),
            role: MessageRole::Assistant,
            content,
            extracted_form_data: merged,
            is_form_complete,
            processing_time_ms: Some(elapsed_ms),
        })
    }

    /// Resolves the taxonomy lookups the current form state needs.
    async fn load_view(&self, form: &SearchFormData) -> Result<TaxonomyView, TaxonomyError> {
        let cities = self.taxonomy.cities().await?;
        let districts = match &form.city {
            Some(city) => self.taxonomy.districts(city).await?,
            None => Vec::new(),
        };
        let institution_type_groups = self.taxonomy.institution_type_groups().await?;
        let institution_types = match &form.institution_type_group {
            Some(group) => self.taxonomy.institution_types(group).await?,
            None => Vec::new(),
        };
        let property_groups = match &form.institution_type {
            Some(kind) => self.taxonomy.property_groups(kind).await?,
            None => Default::default(),
        };
        let properties = match &form.property_group {
            Some(group) => self.taxonomy.properties(group).await?,
            None => Default::default(),
        };

        Ok(TaxonomyView {
            cities,
            districts,
            institution_type_groups,
            institution_types,
            property_groups,
            properties,
        })
    }

    /// Reply for a failed turn. Nothing beyond the user's message is
    /// persisted and the conversation status is left untouched.
    fn apology_outcome(&self, conversation: &Conversation) -> TurnOutcome {
        TurnOutcome {
            conversation_id: conversation.id,
            message_id: None,
            role: MessageRole::Assistant,
            content: APOLOGY_MESSAGE.to_string(),
            extracted_form_data: conversation.form_data.clone(),
            is_form_complete: false,
            processing_time_ms: None,
        }
    }
}

/// Internal failure of an extraction turn; every variant downgrades to the
/// apology reply.
#[derive(Debug, Error)]
enum TurnFailure {
    #[error(transparent)]
    Model(#[from] crate::ports::ModelError),

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
