//! MessageRepository - Repository PostgreSQL per i messaggi della chat di gruppo

use super::session::map_write_error;
use super::{MessageStore, StoreError};
use crate::dtos::CreateGroupMessageDTO;
use crate::entities::GroupMessage;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

// MESSAGE REPO
pub struct MessageRepository {
    connection_pool: PgPool,
}

impl MessageRepository {
    pub fn new(connection_pool: PgPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    #[instrument(skip(self, data), fields(group_id = %data.group_id))]
    async fn create_message(&self, data: &CreateGroupMessageDTO) -> Result<GroupMessage, StoreError> {
        let message = sqlx::query_as::<_, GroupMessage>(
            r#"
            INSERT INTO group_messages (group_id, session_id, sender_id, content, attachment_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, group_id, session_id, sender_id, content, attachment_url, created_at
            "#,
        )
        .bind(data.group_id)
        .bind(data.session_id)
        .bind(data.sender_id)
        .bind(&data.content)
        .bind(&data.attachment_url)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
        .map_err(map_write_error)?;

        debug!("Message created with id {}", message.id);
        Ok(message)
    }

    /// Prende gli ultimi `limit` messaggi (DESC) e li restituisce in ordine cronologico
    async fn list_recent_messages(
        &self,
        group_id: i64,
        session_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<GroupMessage>, StoreError> {
        let messages = sqlx::query_as::<_, GroupMessage>(
            r#"
            SELECT * FROM (
                SELECT id, group_id, session_id, sender_id, content, attachment_url, created_at
                FROM group_messages
                WHERE group_id = $1
                  AND ($2::bigint IS NULL OR session_id = $2)
                ORDER BY created_at DESC, id DESC
                LIMIT $3
            ) recent
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(group_id)
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(messages)
    }
}
