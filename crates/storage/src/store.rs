//! Data-access contracts the domain services are written against.
//!
//! `Database` implements every trait on top of the repositories; tests plug
//! in-memory fakes instead.

use async_trait::async_trait;

use crate::Database;
use crate::error::Result;
use crate::models::{Contest, RatingCalculation, RatingHistory, User};
use crate::repository::{contest::ContestRepository, rating::RatingRepository, user::UserRepository};

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Writes every field and the full privilege set, or nothing.
    async fn save(&self, user: &User) -> Result<()>;
}

#[async_trait]
pub trait RatingHistoryStore: Send + Sync {
    /// Ascending by rating calculation id.
    async fn find_by_user(&self, user_id: i32) -> Result<Vec<RatingHistory>>;
}

#[async_trait]
pub trait RatingCalculationStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<RatingCalculation>>;
}

#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Contest>>;
}

#[async_trait]
pub trait ContestPlayerStore: Send + Sync {
    async fn count(&self, contest_id: i32) -> Result<i64>;
}

#[async_trait]
impl IdentityStore for Database {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        UserRepository::new(self.pool()).find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        UserRepository::new(self.pool())
            .find_by_username(username)
            .await
    }

    async fn save(&self, user: &User) -> Result<()> {
        UserRepository::new(self.pool()).save(user).await
    }
}

#[async_trait]
impl RatingHistoryStore for Database {
    async fn find_by_user(&self, user_id: i32) -> Result<Vec<RatingHistory>> {
        RatingRepository::new(self.pool())
            .history_for_user(user_id)
            .await
    }
}

#[async_trait]
impl RatingCalculationStore for Database {
    async fn find_by_id(&self, id: i32) -> Result<Option<RatingCalculation>> {
        RatingRepository::new(self.pool()).find_calculation(id).await
    }
}

#[async_trait]
impl ContestStore for Database {
    async fn find_by_id(&self, id: i32) -> Result<Option<Contest>> {
        ContestRepository::new(self.pool()).find_by_id(id).await
    }
}

#[async_trait]
impl ContestPlayerStore for Database {
    async fn count(&self, contest_id: i32) -> Result<i64> {
        ContestRepository::new(self.pool())
            .count_players(contest_id)
            .await
    }
}
