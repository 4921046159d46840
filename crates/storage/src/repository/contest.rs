use sqlx::PgPool;

use crate::error::Result;
use crate::models::Contest;

pub struct ContestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContestRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>("SELECT id, title FROM contest WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(contest)
    }

    /// Number of players registered in a contest
    pub async fn count_players(&self, contest_id: i32) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contest_player WHERE contest_id = $1")
            .bind(contest_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
