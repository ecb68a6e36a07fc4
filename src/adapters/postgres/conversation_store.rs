//! PostgreSQL implementation of [`ConversationStore`].
//!
//! Conversations and messages live in two tables; form data is a JSONB
//! column on the conversation row. Turn persistence runs in a transaction
//! so the assistant message and the form snapshot land together. Message
//! rows carry a `seq BIGSERIAL` that fixes read order independently of
//! timestamp resolution.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::assistant::{
    Conversation, ConversationKind, ConversationStatus, Message, MessageRole, SearchFormData,
};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp, UserId};
use crate::ports::{ConversationStore, StoreError};

/// Conversation storage on a PostgreSQL pool.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_messages(&self, id: ConversationId) -> Result<Vec<Message>, StoreError> {
        // seq is a BIGSERIAL assigned on insert; same-timestamp pairs (the
        // welcome turn writes two messages back to back) keep insertion order.
        let rows = sqlx::query(
            r#"
            SELECT id, role, content, extracted, token_estimate, processing_time_ms, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to fetch messages: {}", e)))?;

        rows.iter()
            .map(|row| {
                let message_id: uuid::Uuid = row.get("id");
                let role_str: &str = row.get("role");
                let content: String = row.get("content");
                let extracted: Option<serde_json::Value> = row.get("extracted");
                let token_estimate: i32 = row.get("token_estimate");
                let processing_time_ms: Option<i64> = row.get("processing_time_ms");
                let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

                Ok(Message {
                    id: MessageId::from_uuid(message_id),
                    conversation_id: id,
                    role: str_to_role(role_str)?,
                    content,
                    extracted: extracted.map(decode_form_data).transpose()?,
                    token_estimate: token_estimate as u32,
                    processing_time_ms: processing_time_ms.map(|ms| ms as u64),
                    created_at: Timestamp::from_datetime(created_at),
                })
            })
            .collect()
    }

    fn row_to_conversation(
        &self,
        row: &sqlx::postgres::PgRow,
        messages: Vec<Message>,
    ) -> Result<Conversation, StoreError> {
        let id: uuid::Uuid = row.get("id");
        let user_id: String = row.get("user_id");
        let kind_str: &str = row.get("kind");
        let status_str: &str = row.get("status");
        let form_data: serde_json::Value = row.get("form_data");
        let last_message_at: chrono::DateTime<chrono::Utc> = row.get("last_message_at");
        let completed_at: Option<chrono::DateTime<chrono::Utc>> = row.get("completed_at");
        let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");

        let user_id = UserId::new(user_id)
            .map_err(|e| StoreError::database(format!("Corrupt user id: {}", e)))?;

        Ok(Conversation::reconstitute(
            ConversationId::from_uuid(id),
            user_id,
            str_to_kind(kind_str)?,
            str_to_status(status_str)?,
            decode_form_data(form_data)?,
            Timestamp::from_datetime(last_message_at),
            completed_at.map(Timestamp::from_datetime),
            Timestamp::from_datetime(created_at),
            messages,
        ))
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn get_or_create_active(
        &self,
        user_id: &UserId,
        kind: ConversationKind,
    ) -> Result<Conversation, StoreError> {
        let existing = sqlx::query(
            r#"
            SELECT id, user_id, kind, status, form_data, last_message_at, completed_at, created_at
            FROM conversations
            WHERE user_id = $1 AND kind = $2 AND status = 'active'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_str())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to fetch conversation: {}", e)))?;

        if let Some(row) = existing {
            let id: uuid::Uuid = row.get("id");
            let messages = self.fetch_messages(ConversationId::from_uuid(id)).await?;
            return self.row_to_conversation(&row, messages);
        }

        let conversation = Conversation::start(user_id.clone(), kind);
        let form_data = encode_form_data(&conversation.form_data)?;

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, user_id, kind, status, form_data, last_message_at, completed_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(conversation.id.as_uuid())
        .bind(conversation.user_id.as_str())
        .bind(conversation.kind.as_str())
        .bind(conversation.status.as_str())
        .bind(&form_data)
        .bind(conversation.last_message_at.as_datetime())
        .bind(conversation.completed_at.map(|t| *t.as_datetime()))
        .bind(conversation.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to insert conversation: {}", e)))?;

        Ok(conversation)
    }

    async fn find_by_id(&self, id: ConversationId) -> Result<Conversation, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, kind, status, form_data, last_message_at, completed_at, created_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to fetch conversation: {}", e)))?
        .ok_or(StoreError::NotFound(id))?;

        let messages = self.fetch_messages(id).await?;
        self.row_to_conversation(&row, messages)
    }

    async fn append_message(&self, message: &Message) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::database(format!("Failed to start transaction: {}", e)))?;

        insert_message(&mut tx, message).await?;
        touch_conversation(&mut tx, message).await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::database(format!("Failed to commit transaction: {}", e)))?;
        Ok(())
    }

    async fn record_turn(
        &self,
        id: ConversationId,
        message: &Message,
        form_data: &SearchFormData,
    ) -> Result<(), StoreError> {
        let encoded = encode_form_data(form_data)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::database(format!("Failed to start transaction: {}", e)))?;

        insert_message(&mut tx, message).await?;

        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET form_data = $2, last_message_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&encoded)
        .bind(message.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::database(format!("Failed to update form data: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::database(format!("Failed to commit transaction: {}", e)))?;
        Ok(())
    }

    async fn set_form_data(
        &self,
        id: ConversationId,
        form_data: &SearchFormData,
    ) -> Result<(), StoreError> {
        let encoded = encode_form_data(form_data)?;

        let result = sqlx::query("UPDATE conversations SET form_data = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(&encoded)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::database(format!("Failed to update form data: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn get_form_data(&self, id: ConversationId) -> Result<SearchFormData, StoreError> {
        let row = sqlx::query("SELECT form_data FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::database(format!("Failed to fetch form data: {}", e)))?
            .ok_or(StoreError::NotFound(id))?;

        decode_form_data(row.get("form_data"))
    }

    async fn transition(
        &self,
        id: ConversationId,
        status: ConversationStatus,
    ) -> Result<(), StoreError> {
        // Terminal rows are filtered out by the WHERE clause; distinguish
        // "already terminal" from "missing" with a follow-up existence check.
        let completed_at = match status {
            ConversationStatus::Completed => Some(chrono::Utc::now()),
            _ => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET status = $2, completed_at = COALESCE($3, completed_at)
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to update status: {}", e)))?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM conversations WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    StoreError::database(format!("Failed to check conversation: {}", e))
                })?;
            if exists.is_none() {
                return Err(StoreError::NotFound(id));
            }
        }
        Ok(())
    }

    async fn sweep_idle(&self, idle_for: chrono::Duration) -> Result<u64, StoreError> {
        let cutoff = chrono::Utc::now() - idle_for;

        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET status = 'abandoned'
            WHERE status = 'active' AND last_message_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::database(format!("Failed to sweep conversations: {}", e)))?;

        Ok(result.rows_affected())
    }
}

async fn insert_message(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    message: &Message,
) -> Result<(), StoreError> {
    let extracted = message
        .extracted
        .as_ref()
        .map(encode_form_data)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO messages (
            id, conversation_id, role, content, extracted,
            token_estimate, processing_time_ms, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(message.id.as_uuid())
    .bind(message.conversation_id.as_uuid())
    .bind(message.role.as_str())
    .bind(&message.content)
    .bind(extracted)
    .bind(message.token_estimate as i32)
    .bind(message.processing_time_ms.map(|ms| ms as i64))
    .bind(message.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| StoreError::database(format!("Failed to insert message: {}", e)))?;
    Ok(())
}

async fn touch_conversation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    message: &Message,
) -> Result<(), StoreError> {
    let result = sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
        .bind(message.conversation_id.as_uuid())
        .bind(message.created_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::database(format!("Failed to touch conversation: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(message.conversation_id));
    }
    Ok(())
}

fn encode_form_data(form_data: &SearchFormData) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(form_data)
        .map_err(|e| StoreError::database(format!("Failed to encode form data: {}", e)))
}

fn decode_form_data(value: serde_json::Value) -> Result<SearchFormData, StoreError> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::database(format!("Failed to decode form data: {}", e)))
}

fn str_to_status(s: &str) -> Result<ConversationStatus, StoreError> {
    s.parse()
        .map_err(|e| StoreError::database(format!("Corrupt status column: {}", e)))
}

fn str_to_kind(s: &str) -> Result<ConversationKind, StoreError> {
    s.parse()
        .map_err(|e| StoreError::database(format!("Corrupt kind column: {}", e)))
}

fn str_to_role(s: &str) -> Result<MessageRole, StoreError> {
    s.parse()
        .map_err(|e| StoreError::database(format!("Corrupt role column: {}", e)))
}
