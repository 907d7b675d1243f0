//! MembershipRepository - Repository PostgreSQL per la relazione group_members

use super::{MembershipStore, StoreError};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct MembershipRepository {
    connection_pool: PgPool,
}

impl MembershipRepository {
    pub fn new(connection_pool: PgPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl MembershipStore for MembershipRepository {
    async fn is_member(&self, group_id: i64, user_id: Uuid) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(exists)
    }

    async fn list_member_ids(&self, group_id: i64) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM group_members WHERE group_id = $1 ORDER BY joined_at ASC",
        )
        .bind(group_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(ids)
    }
}
