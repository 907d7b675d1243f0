//! ProfileRepository - Repository PostgreSQL per i profili

use super::{ProfileStore, StoreError};
use crate::entities::Profile;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct ProfileRepository {
    connection_pool: PgPool,
}

impl ProfileRepository {
    pub fn new(connection_pool: PgPool) -> Self {
        Self { connection_pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn find_many(&self, user_ids: &[Uuid]) -> Result<Vec<Profile>, StoreError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT id, full_name, email FROM profiles WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(profiles)
    }
}
