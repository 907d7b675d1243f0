//! Invite entity - Record RSVP per la coppia (sessione, utente)

use super::enums::InviteStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Invite {
    // chiave composta (session_id, user_id): al massimo un record per coppia
    pub session_id: i64,
    pub user_id: Uuid,
    pub status: InviteStatus,
    // valorizzato ad ogni cambio di stato diverso da pending
    pub responded_at: Option<DateTime<Utc>>,
}
