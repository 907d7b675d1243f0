//! Fan-out - Inviti e avvisi di conflitto per una sessione appena creata
//!
//! Per ogni membro (escluso il creatore): se ha già accettato una sessione allo stesso
//! istante il creatore riceve un avviso e non viene creato alcun invito, altrimenti
//! viene scritto un invito pending e preparata l'email con i link accept/decline.
//! Le email vengono solo preparate qui; l'invio avviene in background.

use crate::entities::{InviteStatus, Profile, Session};
use crate::notifications::{Notification, NotificationKind};
use crate::repositories::{ProfileStore, SessionStore, StoreError};
use crate::scheduling::ConflictDetector;
use std::collections::HashMap;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// Link accept/decline raggiungibili senza autenticazione dalle email
pub fn action_links(base_url: &str, session_id: i64, user_id: Uuid) -> (String, String) {
    let base = base_url.trim_end_matches('/');
    (
        format!("{base}/api/sessions/{session_id}/accept/{user_id}"),
        format!("{base}/api/sessions/{session_id}/decline/{user_id}"),
    )
}

fn session_notification(
    kind: NotificationKind,
    session: &Session,
    recipient: &Profile,
    organizer: &str,
) -> Option<Notification> {
    let Some(email) = recipient.email.as_deref().filter(|e| !e.trim().is_empty()) else {
        warn!("Profile {} has no email address, notification skipped", recipient.id);
        return None;
    };

    Some(
        Notification::new(kind, email)
            .with_param("to_name", recipient.display_name())
            .with_param("to_email", email)
            .with_param("topic", session.topic.clone().unwrap_or_default())
            .with_param("time", session.start_at.format("%Y-%m-%d %H:%M UTC").to_string())
            .with_param("venue", session.venue.clone().unwrap_or_default())
            .with_param(
                "time_goal",
                session
                    .time_goal_minutes
                    .map(|m| format!("{m} minutes"))
                    .unwrap_or_default(),
            )
            .with_param("content_goal", session.content_goal.clone().unwrap_or_default())
            .with_param("organizer", organizer),
    )
}

/// Email di invito per `member`, `None` se il profilo non ha un indirizzo
pub fn invitation(
    session: &Session,
    member: &Profile,
    organizer: &str,
    base_url: &str,
) -> Option<Notification> {
    let (accept, decline) = action_links(base_url, session.id, member.id);
    session_notification(NotificationKind::Invitation, session, member, organizer).map(|n| {
        n.with_param("accept_link", accept)
            .with_param("decline_link", decline)
    })
}

/// Avviso al creatore: `conflicting_member` ha già accettato una sessione allo stesso istante
pub fn conflict_alert(
    session: &Session,
    creator: &Profile,
    conflicting_member: &Profile,
) -> Option<Notification> {
    session_notification(
        NotificationKind::ConflictAlert,
        session,
        creator,
        &creator.display_name(),
    )
    .map(|n| n.with_param("conflicting_member", conflicting_member.display_name()))
}

/// Profilo noto, oppure un profilo vuoto (senza email) per gli utenti senza riga in `profiles`
pub(crate) fn profile_or_placeholder(profiles: &HashMap<Uuid, Profile>, user_id: Uuid) -> Profile {
    profiles.get(&user_id).cloned().unwrap_or(Profile {
        id: user_id,
        full_name: None,
        email: None,
    })
}

pub struct InviteFanout<'a> {
    sessions: &'a dyn SessionStore,
    profiles: &'a dyn ProfileStore,
    base_url: &'a str,
}

impl<'a> InviteFanout<'a> {
    pub fn new(
        sessions: &'a dyn SessionStore,
        profiles: &'a dyn ProfileStore,
        base_url: &'a str,
    ) -> Self {
        Self {
            sessions,
            profiles,
            base_url,
        }
    }

    /// Esegue controllo conflitti e scrittura degli inviti per ogni membro e restituisce
    /// le email da inviare. Gli errori su un singolo membro vengono loggati e non
    /// interrompono gli altri: la sessione è già stata salvata.
    #[instrument(skip(self, session, members), fields(session_id = session.id, members = members.len()))]
    pub async fn run(&self, session: &Session, members: &[Uuid]) -> Vec<Notification> {
        let mut ids = members.to_vec();
        ids.push(session.creator_id);
        let profiles: HashMap<Uuid, Profile> = match self.profiles.find_many(&ids).await {
            Ok(found) => found.into_iter().map(|p| (p.id, p)).collect(),
            Err(err) => {
                error!("Profiles lookup failed, notifications will be skipped: {}", err);
                HashMap::new()
            }
        };

        let creator = profile_or_placeholder(&profiles, session.creator_id);
        let organizer = creator.display_name();
        let detector = ConflictDetector::new(self.sessions);
        let mut batch = Vec::new();

        for &member_id in members {
            let member = profile_or_placeholder(&profiles, member_id);

            match self.invite_member(&detector, session, member_id).await {
                Ok(true) => {
                    batch.extend(invitation(session, &member, &organizer, self.base_url));
                }
                Ok(false) => {
                    debug!("Member {} has a conflicting session, alerting creator", member_id);
                    batch.extend(conflict_alert(session, &creator, &member));
                }
                Err(err) => {
                    error!("Invite for member {} failed: {}", member_id, err);
                }
            }
        }

        batch
    }

    /// true se l'invito pending è stato scritto, false se il membro è in conflitto
    async fn invite_member(
        &self,
        detector: &ConflictDetector<'_>,
        session: &Session,
        member_id: Uuid,
    ) -> Result<bool, StoreError> {
        if detector.has_conflict(member_id, session.start_at).await? {
            return Ok(false);
        }
        self.sessions
            .upsert_invite(session.id, member_id, InviteStatus::Pending)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::CreateSessionDTO;
    use crate::repositories::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn profile(name: Option<&str>, email: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    async fn new_session(store: &MemoryStore, creator_id: Uuid) -> Session {
        store
            .create_session(&CreateSessionDTO {
                group_id: 1,
                creator_id,
                start_at: Utc.with_ymd_and_hms(2099, 12, 25, 10, 0, 0).unwrap(),
                venue: Some("Library".into()),
                topic: Some("Graphs".into()),
                time_goal_minutes: Some(90),
                content_goal: None,
            })
            .await
            .unwrap()
    }

    #[test]
    fn test_action_links() {
        let user = Uuid::nil();
        let (accept, decline) = action_links("https://study.example.com/", 7, user);
        assert_eq!(
            accept,
            format!("https://study.example.com/api/sessions/7/accept/{user}")
        );
        assert_eq!(
            decline,
            format!("https://study.example.com/api/sessions/7/decline/{user}")
        );
    }

    #[tokio::test]
    async fn test_invitation_params() {
        let store = MemoryStore::new();
        let session = new_session(&store, Uuid::new_v4()).await;
        let member = profile(Some("Bob"), Some("bob@example.com"));

        let n = invitation(&session, &member, "Alice", "http://localhost:3000").unwrap();
        assert_eq!(n.kind, NotificationKind::Invitation);
        assert_eq!(n.recipient_email, "bob@example.com");
        assert_eq!(n.param("to_name"), Some("Bob"));
        assert_eq!(n.param("organizer"), Some("Alice"));
        assert_eq!(n.param("time"), Some("2099-12-25 10:00 UTC"));
        assert_eq!(n.param("time_goal"), Some("90 minutes"));
        assert_eq!(n.param("content_goal"), Some(""));
        assert!(n.param("accept_link").unwrap().ends_with(&format!("/accept/{}", member.id)));
    }

    #[tokio::test]
    async fn test_missing_email_is_skipped() {
        let store = MemoryStore::new();
        let session = new_session(&store, Uuid::new_v4()).await;
        let member = profile(Some("Ghost"), None);
        assert!(invitation(&session, &member, "Alice", "http://localhost").is_none());
    }

    #[tokio::test]
    async fn test_run_splits_invites_and_alerts() {
        let store = MemoryStore::new();
        let creator = profile(Some("Alice"), Some("alice@example.com"));
        let free = profile(Some("Bob"), Some("bob@example.com"));
        let busy = profile(Some("Carol"), Some("carol@example.com"));
        for p in [&creator, &free, &busy] {
            store.add_profile(p.clone()).await;
        }

        let earlier = new_session(&store, creator.id).await;
        store
            .upsert_invite(earlier.id, busy.id, InviteStatus::Accepted)
            .await
            .unwrap();

        let session = new_session(&store, creator.id).await;
        let fanout = InviteFanout::new(&store, &store, "http://localhost:3000");
        let batch = fanout.run(&session, &[free.id, busy.id]).await;

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].kind, NotificationKind::Invitation);
        assert_eq!(batch[0].recipient_email, "bob@example.com");
        assert_eq!(batch[1].kind, NotificationKind::ConflictAlert);
        assert_eq!(batch[1].recipient_email, "alice@example.com");
        assert_eq!(batch[1].param("conflicting_member"), Some("Carol"));

        assert_eq!(
            store.invite(session.id, free.id).await.map(|i| i.status),
            Some(InviteStatus::Pending)
        );
        assert!(store.invite(session.id, busy.id).await.is_none());
    }
}
