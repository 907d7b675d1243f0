//! Common repository traits
//!
//! This module defines the store interfaces used by the services. Every method hides the query
//! construction details; the PostgreSQL repositories and the in-memory store implement the
//! same traits, so handlers and tests never depend on a concrete backend.

use crate::dtos::{CreateGroupMessageDTO, CreateSessionDTO};
use crate::entities::{GroupMessage, Invite, InviteStatus, Profile, Session};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by every store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// The user already holds an accepted invite for a session starting at the same instant
    #[error("user already holds an accepted session at this start time")]
    SlotTaken,

    /// The referenced row does not exist (e.g. a foreign key points nowhere)
    #[error("referenced row does not exist")]
    MissingReference,

    /// The backend could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other error raised by the database driver
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Sessions and their RSVP records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a new session and returns the full row with the store-assigned id
    async fn create_session(&self, data: &CreateSessionDTO) -> Result<Session, StoreError>;

    /// Lists the sessions of a group, ordered by start instant ascending
    async fn list_sessions(&self, group_id: i64) -> Result<Vec<Session>, StoreError>;

    /// Reads a single session
    ///
    /// # Returns
    /// * `Ok(None)` - No session with that id
    async fn get_session(&self, session_id: i64) -> Result<Option<Session>, StoreError>;

    /// Reads many sessions by id; unknown ids are ignored
    async fn get_sessions(&self, session_ids: &[i64]) -> Result<Vec<Session>, StoreError>;

    /// Deletes a session and its invites. Deleting a missing session is not an error.
    async fn delete_session(&self, session_id: i64) -> Result<(), StoreError>;

    /// Insert-or-overwrite of the invite keyed by `(session_id, user_id)`.
    ///
    /// `responded_at` is set to the current time when `status` is not pending.
    ///
    /// # Errors
    /// * `StoreError::SlotTaken` - accepting would give the user two accepted sessions
    ///   starting at the same instant
    /// * `StoreError::MissingReference` - the session does not exist
    async fn upsert_invite(
        &self,
        session_id: i64,
        user_id: Uuid,
        status: InviteStatus,
    ) -> Result<Invite, StoreError>;

    /// Ids of the sessions the user has accepted
    async fn list_accepted_invites_for_user(&self, user_id: Uuid) -> Result<Vec<i64>, StoreError>;

    /// RSVP roster of one session
    async fn list_invites_for_session(&self, session_id: i64) -> Result<Vec<Invite>, StoreError>;
}

/// Read-only view of the group membership relation
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Existence lookup of the `(group_id, user_id)` membership row
    async fn is_member(&self, group_id: i64, user_id: Uuid) -> Result<bool, StoreError>;

    /// All the member ids of a group
    async fn list_member_ids(&self, group_id: i64) -> Result<Vec<Uuid>, StoreError>;
}

/// Profiles, used to address notifications
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Reads many profiles by user id; unknown ids are ignored
    async fn find_many(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, StoreError>;
}

/// Group chat messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a message and returns it with the store-assigned id
    async fn create_message(&self, data: &CreateGroupMessageDTO) -> Result<GroupMessage, StoreError>;

    /// The most recent `limit` messages of a group (optionally of one session),
    /// returned in chronological order
    async fn list_recent_messages(
        &self,
        group_id: i64,
        session_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<GroupMessage>, StoreError>;
}
