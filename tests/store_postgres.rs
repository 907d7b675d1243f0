//! Integration tests per i repository PostgreSQL
//!
//! Ogni test riceve un database nuovo con le migrazioni di `./migrations` applicate
//! (serve `DATABASE_URL`).

#[cfg(test)]
mod postgres_store_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use sqlx::PgPool;
    use studygroup_server::dtos::{CreateGroupMessageDTO, CreateSessionDTO};
    use studygroup_server::entities::{InviteStatus, Session};
    use studygroup_server::repositories::{
        MessageRepository, MessageStore, SessionRepository, SessionStore, StoreError,
    };
    use uuid::Uuid;

    const GROUP: i64 = 1;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2099, 12, 25, 10, 0, 0).unwrap()
    }

    async fn session_at(repo: &SessionRepository, group_id: i64, start_at: DateTime<Utc>) -> Session {
        repo.create_session(&CreateSessionDTO {
            group_id,
            creator_id: Uuid::new_v4(),
            start_at,
            venue: Some("Library".into()),
            topic: None,
            time_goal_minutes: Some(60),
            content_goal: None,
        })
        .await
        .expect("Failed to create session")
    }

    fn text(group_id: i64, session_id: Option<i64>, sender_id: Uuid, content: &str) -> CreateGroupMessageDTO {
        CreateGroupMessageDTO {
            group_id,
            session_id,
            sender_id,
            content: Some(content.to_string()),
            attachment_url: None,
        }
    }

    // ============================================================
    // Test per SessionRepository::upsert_invite
    // ============================================================

    #[sqlx::test]
    async fn test_second_accept_at_same_instant_is_slot_taken(pool: PgPool) -> sqlx::Result<()> {
        let repo = SessionRepository::new(pool.clone());
        let user = Uuid::new_v4();
        let first = session_at(&repo, GROUP, start()).await;
        let second = session_at(&repo, 2, start()).await;

        repo.upsert_invite(first.id, user, InviteStatus::Accepted)
            .await
            .expect("First accept should succeed");

        let result = repo.upsert_invite(second.id, user, InviteStatus::Accepted).await;
        assert!(matches!(result, Err(StoreError::SlotTaken)), "got {:?}", result);

        // il record in pending/declined non è coperto dall'indice parziale
        repo.upsert_invite(second.id, user, InviteStatus::Declined)
            .await
            .expect("Decline should not collide");

        let accepted = repo.list_accepted_invites_for_user(user).await.unwrap();
        assert_eq!(accepted, vec![first.id]);
        Ok(())
    }

    #[sqlx::test]
    async fn test_accepts_at_different_instants_coexist(pool: PgPool) -> sqlx::Result<()> {
        let repo = SessionRepository::new(pool.clone());
        let user = Uuid::new_v4();
        let morning = session_at(&repo, GROUP, start()).await;
        let later = session_at(&repo, GROUP, start() + Duration::milliseconds(1)).await;

        repo.upsert_invite(morning.id, user, InviteStatus::Accepted).await.unwrap();
        repo.upsert_invite(later.id, user, InviteStatus::Accepted).await.unwrap();

        let mut accepted = repo.list_accepted_invites_for_user(user).await.unwrap();
        accepted.sort();
        assert_eq!(accepted, vec![morning.id, later.id]);
        Ok(())
    }

    #[sqlx::test]
    async fn test_invite_for_missing_session(pool: PgPool) -> sqlx::Result<()> {
        let repo = SessionRepository::new(pool.clone());

        let result = repo
            .upsert_invite(9999, Uuid::new_v4(), InviteStatus::Pending)
            .await;
        assert!(matches!(result, Err(StoreError::MissingReference)), "got {:?}", result);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM session_invites")
            .fetch_one(&pool)
            .await?;
        assert_eq!(rows, 0);
        Ok(())
    }

    #[sqlx::test]
    async fn test_upsert_same_pair_overwrites(pool: PgPool) -> sqlx::Result<()> {
        let repo = SessionRepository::new(pool.clone());
        let user = Uuid::new_v4();
        let session = session_at(&repo, GROUP, start()).await;

        let pending = repo.upsert_invite(session.id, user, InviteStatus::Pending).await.unwrap();
        assert!(pending.responded_at.is_none());

        let first = repo.upsert_invite(session.id, user, InviteStatus::Accepted).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        // accettare di nuovo la stessa sessione non è un conflitto con se stessi
        let second = repo.upsert_invite(session.id, user, InviteStatus::Accepted).await.unwrap();

        assert_eq!(second.status, InviteStatus::Accepted);
        assert!(second.responded_at.unwrap() > first.responded_at.unwrap());

        let roster = repo.list_invites_for_session(session.id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].responded_at, second.responded_at);
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_session_removes_invites(pool: PgPool) -> sqlx::Result<()> {
        let repo = SessionRepository::new(pool.clone());
        let user = Uuid::new_v4();
        let session = session_at(&repo, GROUP, start()).await;
        repo.upsert_invite(session.id, user, InviteStatus::Accepted).await.unwrap();

        repo.delete_session(session.id).await.unwrap();

        assert!(repo.get_session(session.id).await.unwrap().is_none());
        assert!(repo.list_accepted_invites_for_user(user).await.unwrap().is_empty());
        // lo slot è di nuovo libero
        let other = session_at(&repo, GROUP, start()).await;
        repo.upsert_invite(other.id, user, InviteStatus::Accepted).await.unwrap();
        Ok(())
    }

    // ============================================================
    // Test per SessionRepository::list_sessions
    // ============================================================

    #[sqlx::test]
    async fn test_list_sessions_ordered_by_start(pool: PgPool) -> sqlx::Result<()> {
        let repo = SessionRepository::new(pool.clone());
        let late = session_at(&repo, GROUP, start() + Duration::days(2)).await;
        let early = session_at(&repo, GROUP, start()).await;
        let middle = session_at(&repo, GROUP, start() + Duration::days(1)).await;
        session_at(&repo, 2, start() - Duration::days(1)).await;

        let sessions = repo.list_sessions(GROUP).await.unwrap();
        let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![early.id, middle.id, late.id]);
        assert_eq!(sessions[0].start_at, start());
        Ok(())
    }

    // ============================================================
    // Test per MessageRepository
    // ============================================================

    #[sqlx::test]
    async fn test_list_recent_messages_newest_in_chronological_order(pool: PgPool) -> sqlx::Result<()> {
        let repo = MessageRepository::new(pool.clone());
        let sender = Uuid::new_v4();
        for i in 1..=5 {
            repo.create_message(&text(GROUP, None, sender, &format!("m{}", i)))
                .await
                .unwrap();
        }
        repo.create_message(&text(2, None, sender, "other group")).await.unwrap();

        let recent = repo.list_recent_messages(GROUP, None, 2).await.unwrap();
        let contents: Vec<_> = recent.iter().filter_map(|m| m.content.as_deref()).collect();
        assert_eq!(contents, vec!["m4", "m5"]);

        let all = repo.list_recent_messages(GROUP, None, 50).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        Ok(())
    }

    #[sqlx::test]
    async fn test_list_recent_messages_by_session(pool: PgPool) -> sqlx::Result<()> {
        let sessions = SessionRepository::new(pool.clone());
        let repo = MessageRepository::new(pool.clone());
        let sender = Uuid::new_v4();
        let session = session_at(&sessions, GROUP, start()).await;

        repo.create_message(&text(GROUP, None, sender, "general")).await.unwrap();
        repo.create_message(&text(GROUP, Some(session.id), sender, "about the session"))
            .await
            .unwrap();

        let scoped = repo.list_recent_messages(GROUP, Some(session.id), 50).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].content.as_deref(), Some("about the session"));
        Ok(())
    }

    #[sqlx::test]
    async fn test_message_for_missing_session(pool: PgPool) -> sqlx::Result<()> {
        let repo = MessageRepository::new(pool.clone());

        let result = repo
            .create_message(&text(GROUP, Some(9999), Uuid::new_v4(), "lost"))
            .await;
        assert!(matches!(result, Err(StoreError::MissingReference)), "got {:?}", result);
        Ok(())
    }
}
