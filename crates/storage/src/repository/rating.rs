use sqlx::PgPool;

use crate::error::Result;
use crate::models::{RatingCalculation, RatingHistory};

pub struct RatingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RatingRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All rating outcomes of a user in calculation order
    pub async fn history_for_user(&self, user_id: i32) -> Result<Vec<RatingHistory>> {
        let history = sqlx::query_as::<_, RatingHistory>(
            r#"
            SELECT rating_calculation_id, user_id, rating_after, rank
            FROM rating_history
            WHERE user_id = $1
            ORDER BY rating_calculation_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(history)
    }

    pub async fn find_calculation(&self, id: i32) -> Result<Option<RatingCalculation>> {
        let calculation = sqlx::query_as::<_, RatingCalculation>(
            "SELECT id, contest_id FROM rating_calculation WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(calculation)
    }
}
