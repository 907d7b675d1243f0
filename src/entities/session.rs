//! Session entity - Sessione di studio proposta in un gruppo

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Session {
    pub id: i64, // assegnato dallo store
    pub group_id: i64,
    pub creator_id: Uuid,
    // istante UTC, confrontato al millisecondo dal conflict detector
    pub start_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub topic: Option<String>,
    pub time_goal_minutes: Option<i32>,
    pub content_goal: Option<String>,
    pub created_at: DateTime<Utc>,
}
