//! Query DTOs - Data Transfer Objects per i query params

use serde::{Deserialize, Serialize};

pub const DEFAULT_MESSAGES_LIMIT: i64 = 50;
pub const MAX_MESSAGES_LIMIT: i64 = 200;

/// DTO per query parameters della lista messaggi
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct MessagesQuery {
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl MessagesQuery {
    /// Limite effettivo, sempre compreso tra 1 e MAX_MESSAGES_LIMIT
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_MESSAGES_LIMIT)
            .clamp(1, MAX_MESSAGES_LIMIT)
    }
}
