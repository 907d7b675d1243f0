//! GroupMessage entity - Messaggio della chat di gruppo

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct GroupMessage {
    pub id: i64,
    pub group_id: i64,
    pub session_id: Option<i64>, // messaggio legato a una sessione specifica
    pub sender_id: Uuid,
    pub content: Option<String>,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
