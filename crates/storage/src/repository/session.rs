use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Session;

pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i32) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (session_id, user_id)
            VALUES ($1, $2)
            RETURNING session_id, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(session)
    }

    pub async fn find(&self, session_id: Uuid) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT session_id, user_id, created_at FROM sessions WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(session)
    }

    /// Deleting an unknown session is not an error
    pub async fn delete(&self, session_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
