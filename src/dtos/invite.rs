//! Invite DTOs - Data Transfer Objects per gli RSVP

use crate::entities::{Invite, InviteStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body della richiesta POST /groups/{group_id}/sessions/{session_id}/respond
///
/// `status` resta una stringa: valori diversi da "accepted" / "declined" producono un 400.
#[derive(Deserialize, Debug)]
pub struct RespondRequestDTO {
    #[serde(default)]
    pub status: Option<String>,
}

impl RespondRequestDTO {
    /// Solo le due risposte esplicite sono ammesse, "pending" compreso è rifiutato
    pub fn response_status(&self) -> Option<InviteStatus> {
        self.status
            .as_deref()?
            .parse::<InviteStatus>()
            .ok()
            .filter(|status| *status != InviteStatus::Pending)
    }
}

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct InviteDTO {
    pub session_id: i64,
    pub user_id: Uuid,
    pub status: InviteStatus,
    pub responded_at: Option<DateTime<Utc>>,
}

impl From<Invite> for InviteDTO {
    fn from(value: Invite) -> Self {
        Self {
            session_id: value.session_id,
            user_id: value.user_id,
            status: value.status,
            responded_at: value.responded_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct InviteListResponse {
    pub invites: Vec<InviteDTO>,
}
