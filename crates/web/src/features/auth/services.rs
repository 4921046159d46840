use sqlx::PgPool;
use storage::{
    dto::user::LoginRequest,
    error::{DomainError, DomainResult, Result},
    models::{Session, User},
    repository::{session::SessionRepository, user::UserRepository},
};
use uuid::Uuid;

/// Resolve a session id into its user, if both still exist
pub async fn resolve_session(pool: &PgPool, session_id: Uuid) -> Result<Option<User>> {
    let Some(session) = SessionRepository::new(pool).find(session_id).await? else {
        return Ok(None);
    };

    UserRepository::new(pool).find_by_id(session.user_id).await
}

/// Check credentials and open a new session
pub async fn login(pool: &PgPool, request: &LoginRequest) -> DomainResult<(Session, User)> {
    let user = UserRepository::new(pool)
        .find_by_username(&request.username)
        .await?
        .filter(|user| user.password == request.password)
        .ok_or_else(|| DomainError::InvalidInput("Invalid username or password".to_string()))?;

    let session = SessionRepository::new(pool).create(user.id).await?;

    Ok((session, user))
}

/// Close a session
pub async fn logout(pool: &PgPool, session_id: Uuid) -> Result<()> {
    SessionRepository::new(pool).delete(session_id).await
}
