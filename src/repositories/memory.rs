//! MemoryStore - Store in memoria che implementa tutti i trait dei repository
//!
//! Usato dai test e dal backend `memory` (sviluppo locale senza database).
//! Tutte le operazioni avvengono sotto un unico lock, quindi il controllo del doppio
//! booking e la scrittura dell'invito sono atomici come l'indice parziale di PostgreSQL.

use super::{MembershipStore, MessageStore, ProfileStore, SessionStore, StoreError};
use crate::dtos::{CreateGroupMessageDTO, CreateSessionDTO};
use crate::entities::{GroupMember, GroupMessage, Invite, InviteStatus, Profile, Session};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    next_session_id: i64,
    next_message_id: i64,
    sessions: BTreeMap<i64, Session>,
    invites: BTreeMap<(i64, Uuid), Invite>,
    members: Vec<GroupMember>,
    profiles: HashMap<Uuid, Profile>,
    messages: Vec<GroupMessage>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simula un guasto del backend: ogni operazione successiva fallisce con `StoreError::Unavailable`
    pub async fn set_unavailable(&self, reason: Option<&str>) {
        *self.unavailable.lock().await = reason.map(str::to_string);
    }

    async fn check_available(&self) -> Result<(), StoreError> {
        match self.unavailable.lock().await.as_ref() {
            Some(reason) => {
                warn!("Memory store is marked unavailable: {}", reason);
                Err(StoreError::Unavailable(reason.clone()))
            }
            None => Ok(()),
        }
    }

    /// Aggiunge un utente a un gruppo (idempotente)
    pub async fn add_member(&self, group_id: i64, user_id: Uuid) {
        let mut tables = self.tables.lock().await;
        if !tables
            .members
            .iter()
            .any(|m| m.group_id == group_id && m.user_id == user_id)
        {
            tables.members.push(GroupMember {
                group_id,
                user_id,
                joined_at: Utc::now(),
            });
        }
    }

    /// Inserisce o sostituisce un profilo
    pub async fn add_profile(&self, profile: Profile) {
        self.tables.lock().await.profiles.insert(profile.id, profile);
    }

    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }

    pub async fn invite_count(&self) -> usize {
        self.tables.lock().await.invites.len()
    }

    /// Lettura diretta di un invito, senza passare dai trait
    pub async fn invite(&self, session_id: i64, user_id: Uuid) -> Option<Invite> {
        self.tables
            .lock()
            .await
            .invites
            .get(&(session_id, user_id))
            .cloned()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, data: &CreateSessionDTO) -> Result<Session, StoreError> {
        self.check_available().await?;
        let mut tables = self.tables.lock().await;
        tables.next_session_id += 1;
        let session = Session {
            id: tables.next_session_id,
            group_id: data.group_id,
            creator_id: data.creator_id,
            start_at: data.start_at,
            venue: data.venue.clone(),
            topic: data.topic.clone(),
            time_goal_minutes: data.time_goal_minutes,
            content_goal: data.content_goal.clone(),
            created_at: Utc::now(),
        };
        tables.sessions.insert(session.id, session.clone());
        debug!("Session {} stored in memory", session.id);
        Ok(session)
    }

    async fn list_sessions(&self, group_id: i64) -> Result<Vec<Session>, StoreError> {
        self.check_available().await?;
        let tables = self.tables.lock().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
        Ok(sessions)
    }

    async fn get_session(&self, session_id: i64) -> Result<Option<Session>, StoreError> {
        self.check_available().await?;
        Ok(self.tables.lock().await.sessions.get(&session_id).cloned())
    }

    async fn get_sessions(&self, session_ids: &[i64]) -> Result<Vec<Session>, StoreError> {
        self.check_available().await?;
        let tables = self.tables.lock().await;
        Ok(session_ids
            .iter()
            .filter_map(|id| tables.sessions.get(id).cloned())
            .collect())
    }

    async fn delete_session(&self, session_id: i64) -> Result<(), StoreError> {
        self.check_available().await?;
        let mut tables = self.tables.lock().await;
        tables.sessions.remove(&session_id);
        tables.invites.retain(|(sid, _), _| *sid != session_id);
        Ok(())
    }

    async fn upsert_invite(
        &self,
        session_id: i64,
        user_id: Uuid,
        status: InviteStatus,
    ) -> Result<Invite, StoreError> {
        self.check_available().await?;
        let mut tables = self.tables.lock().await;

        let start_at = tables
            .sessions
            .get(&session_id)
            .map(|s| s.start_at)
            .ok_or(StoreError::MissingReference)?;

        if status == InviteStatus::Accepted {
            let slot_taken = tables.invites.values().any(|invite| {
                invite.user_id == user_id
                    && invite.session_id != session_id
                    && invite.status == InviteStatus::Accepted
                    && tables
                        .sessions
                        .get(&invite.session_id)
                        .is_some_and(|s| s.start_at == start_at)
            });
            if slot_taken {
                return Err(StoreError::SlotTaken);
            }
        }

        let invite = Invite {
            session_id,
            user_id,
            status,
            responded_at: (status != InviteStatus::Pending).then(Utc::now),
        };
        tables.invites.insert((session_id, user_id), invite.clone());
        Ok(invite)
    }

    async fn list_accepted_invites_for_user(&self, user_id: Uuid) -> Result<Vec<i64>, StoreError> {
        self.check_available().await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .invites
            .values()
            .filter(|i| i.user_id == user_id && i.status == InviteStatus::Accepted)
            .map(|i| i.session_id)
            .collect())
    }

    async fn list_invites_for_session(&self, session_id: i64) -> Result<Vec<Invite>, StoreError> {
        self.check_available().await?;
        let tables = self.tables.lock().await;
        let mut invites: Vec<Invite> = tables
            .invites
            .values()
            .filter(|i| i.session_id == session_id)
            .cloned()
            .collect();
        // stesso ordinamento della query PostgreSQL: risposte prima, pending in coda
        invites.sort_by(|a, b| match (a.responded_at, b.responded_at) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.user_id.cmp(&b.user_id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.user_id.cmp(&b.user_id),
        });
        Ok(invites)
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn is_member(&self, group_id: i64, user_id: Uuid) -> Result<bool, StoreError> {
        self.check_available().await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .iter()
            .any(|m| m.group_id == group_id && m.user_id == user_id))
    }

    async fn list_member_ids(&self, group_id: i64) -> Result<Vec<Uuid>, StoreError> {
        self.check_available().await?;
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.group_id == group_id)
            .map(|m| m.user_id)
            .collect())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_many(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        self.check_available().await?;
        let tables = self.tables.lock().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.profiles.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_message(&self, data: &CreateGroupMessageDTO) -> Result<GroupMessage, StoreError> {
        self.check_available().await?;
        let mut tables = self.tables.lock().await;
        tables.next_message_id += 1;
        let message = GroupMessage {
            id: tables.next_message_id,
            group_id: data.group_id,
            session_id: data.session_id,
            sender_id: data.sender_id,
            content: data.content.clone(),
            attachment_url: data.attachment_url.clone(),
            created_at: Utc::now(),
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn list_recent_messages(
        &self,
        group_id: i64,
        session_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<GroupMessage>, StoreError> {
        self.check_available().await?;
        let tables = self.tables.lock().await;
        let matching: Vec<GroupMessage> = tables
            .messages
            .iter()
            .filter(|m| m.group_id == group_id)
            .filter(|m| session_id.is_none() || m.session_id == session_id)
            .cloned()
            .collect();
        // i messaggi sono già in ordine di inserimento, quindi cronologico
        let skip = matching.len().saturating_sub(limit.max(0) as usize);
        Ok(matching.into_iter().skip(skip).collect())
    }
}
