use sqlx::PgPool;
use storage::{
    dto::{common::PaginationParams, user::UserOrdering},
    error::Result,
    models::User,
    repository::user::UserRepository,
};

/// One page of visible users together with the total count
pub async fn list_users(
    pool: &PgPool,
    ordering: UserOrdering,
    pagination: &PaginationParams,
) -> Result<(Vec<User>, i64)> {
    let repo = UserRepository::new(pool);
    let total_items = repo.count_shown().await?;
    let users = repo.list_shown(ordering, pagination).await?;
    Ok((users, total_items))
}

/// Look a user up by exact username
pub async fn find_user(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let repo = UserRepository::new(pool);
    repo.find_by_username(username).await
}
