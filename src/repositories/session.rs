//! SessionRepository - Repository PostgreSQL per sessioni e inviti (RSVP)

use super::{SessionStore, StoreError};
use crate::dtos::CreateSessionDTO;
use crate::entities::{Invite, InviteStatus, Session};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Codici SQLSTATE di PostgreSQL gestiti esplicitamente
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Indice parziale che garantisce un solo invito accettato per (utente, istante di inizio)
pub const ACCEPTED_SLOT_INDEX: &str = "session_invites_one_accepted_per_slot";

const SESSION_COLUMNS: &str = "id, group_id, creator_id, start_at, venue, topic, time_goal_minutes, content_goal, created_at";

// SESSION REPO
pub struct SessionRepository {
    connection_pool: PgPool,
}

impl SessionRepository {
    pub fn new(connection_pool: PgPool) -> Self {
        Self { connection_pool }
    }
}

/// Traduce le violazioni di vincolo note in errori del dominio
pub(super) fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) if db_err.constraint() == Some(ACCEPTED_SLOT_INDEX) => {
                return StoreError::SlotTaken;
            }
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::MissingReference,
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl SessionStore for SessionRepository {
    #[instrument(skip(self, data), fields(group_id = %data.group_id))]
    async fn create_session(&self, data: &CreateSessionDTO) -> Result<Session, StoreError> {
        debug!("Inserting new session");
        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO sessions (group_id, creator_id, start_at, venue, topic, time_goal_minutes, content_goal, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(data.group_id)
        .bind(data.creator_id)
        .bind(data.start_at)
        .bind(&data.venue)
        .bind(&data.topic)
        .bind(data.time_goal_minutes)
        .bind(&data.content_goal)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
        .map_err(map_write_error)?;

        info!("Session created with id {}", session.id);
        Ok(session)
    }

    async fn list_sessions(&self, group_id: i64) -> Result<Vec<Session>, StoreError> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE group_id = $1 ORDER BY start_at ASC, id ASC"
        ))
        .bind(group_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(sessions)
    }

    async fn get_session(&self, session_id: i64) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(session)
    }

    async fn get_sessions(&self, session_ids: &[i64]) -> Result<Vec<Session>, StoreError> {
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ANY($1)"
        ))
        .bind(session_ids)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(sessions)
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: i64) -> Result<(), StoreError> {
        // gli inviti vengono rimossi da ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.connection_pool)
            .await?;

        debug!("Deleted {} session rows", result.rows_affected());
        Ok(())
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn upsert_invite(
        &self,
        session_id: i64,
        user_id: Uuid,
        status: InviteStatus,
    ) -> Result<Invite, StoreError> {
        let responded_at = (status != InviteStatus::Pending).then(Utc::now);

        // session_start_at viene copiato dalla sessione: l'indice parziale su
        // (user_id, session_start_at) WHERE status = 'accepted' chiude la race check-then-act
        let invite = sqlx::query_as::<_, Invite>(
            r#"
            INSERT INTO session_invites (session_id, user_id, status, responded_at, session_start_at)
            SELECT s.id, $2, $3, $4, s.start_at FROM sessions s WHERE s.id = $1
            ON CONFLICT (session_id, user_id)
            DO UPDATE SET status = EXCLUDED.status, responded_at = EXCLUDED.responded_at
            RETURNING session_id, user_id, status, responded_at
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(status.as_str())
        .bind(responded_at)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(map_write_error)?
        .ok_or(StoreError::MissingReference)?;

        debug!("Invite stored");
        Ok(invite)
    }

    async fn list_accepted_invites_for_user(&self, user_id: Uuid) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT session_id FROM session_invites WHERE user_id = $1 AND status = 'accepted'",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(ids)
    }

    async fn list_invites_for_session(&self, session_id: i64) -> Result<Vec<Invite>, StoreError> {
        let invites = sqlx::query_as::<_, Invite>(
            r#"
            SELECT session_id, user_id, status, responded_at
            FROM session_invites
            WHERE session_id = $1
            ORDER BY responded_at ASC NULLS LAST, user_id ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(invites)
    }
}
