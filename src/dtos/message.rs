//! Message DTOs - Data Transfer Objects per la chat di gruppo

use crate::entities::GroupMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Body della richiesta POST /groups/{group_id}/messages
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateGroupMessageRequestDTO {
    pub session_id: Option<i64>,

    #[validate(length(max = 5000, message = "Message content must be at most 5000 characters"))]
    pub content: Option<String>,

    #[validate(url(message = "Attachment must be a valid URL"))]
    pub attachment_url: Option<String>,
}

impl CreateGroupMessageRequestDTO {
    /// I campi vuoti o di soli spazi valgono come assenti; va chiamato prima di `validate()`
    pub fn normalized(self) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            session_id: self.session_id,
            content: non_blank(self.content),
            attachment_url: non_blank(self.attachment_url),
        }
    }

    /// Il messaggio deve avere almeno un testo non vuoto o un allegato
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        blank(&self.content) && blank(&self.attachment_url)
    }
}

/// DTO per creare un nuovo messaggio (senza id e created_at)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateGroupMessageDTO {
    pub group_id: i64,
    pub session_id: Option<i64>,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
}

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GroupMessageDTO {
    pub id: i64,
    pub group_id: i64,
    pub session_id: Option<i64>,
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<GroupMessage> for GroupMessageDTO {
    fn from(value: GroupMessage) -> Self {
        Self {
            id: value.id,
            group_id: value.group_id,
            session_id: value.session_id,
            sender_id: value.sender_id,
            content: value.content,
            attachment_url: value.attachment_url,
            created_at: value.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GroupMessageResponse {
    pub message: GroupMessageDTO,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GroupMessageListResponse {
    pub messages: Vec<GroupMessageDTO>,
}
