//! ConflictDetector - Rilevamento del doppio booking
//!
//! Due sessioni sono in conflitto solo se iniziano esattamente allo stesso istante
//! (precisione al millisecondo). Non c'è logica di sovrapposizione di intervalli.

use crate::entities::Session;
use crate::repositories::{SessionStore, StoreError};
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};
use uuid::Uuid;

pub struct ConflictDetector<'a> {
    sessions: &'a dyn SessionStore,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(sessions: &'a dyn SessionStore) -> Self {
        Self { sessions }
    }

    /// true se l'utente ha già accettato una sessione che inizia a `start_at`
    pub async fn has_conflict(
        &self,
        user_id: Uuid,
        start_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.find_conflict(user_id, start_at, None).await?.is_some())
    }

    /// Come `has_conflict`, ignorando la sessione `exclude` (ri-accettare la stessa sessione
    /// non è un conflitto)
    pub async fn has_conflict_excluding(
        &self,
        user_id: Uuid,
        start_at: DateTime<Utc>,
        exclude: i64,
    ) -> Result<bool, StoreError> {
        Ok(self
            .find_conflict(user_id, start_at, Some(exclude))
            .await?
            .is_some())
    }

    /// Restituisce la sessione accettata che occupa già lo slot, se esiste
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn find_conflict(
        &self,
        user_id: Uuid,
        start_at: DateTime<Utc>,
        exclude: Option<i64>,
    ) -> Result<Option<Session>, StoreError> {
        let accepted: Vec<i64> = self
            .sessions
            .list_accepted_invites_for_user(user_id)
            .await?
            .into_iter()
            .filter(|id| Some(*id) != exclude)
            .collect();

        if accepted.is_empty() {
            return Ok(None);
        }

        let target = start_at.timestamp_millis();
        let found = self
            .sessions
            .get_sessions(&accepted)
            .await?
            .into_iter()
            .find(|s| s.start_at.timestamp_millis() == target);

        if let Some(session) = &found {
            debug!("Slot already taken by accepted session {}", session.id);
        }
        Ok(found)
    }
}
