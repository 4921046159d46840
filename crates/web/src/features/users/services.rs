use storage::{
    Database,
    dto::{rating::RatingTrajectoryEntry, user::EditUserRequest},
    error::{DomainError, DomainResult},
    models::User,
    services::{
        profile_edit::{self, ProfileEditOutcome},
        rating_trajectory::RatingTrajectoryBuilder,
    },
    store::IdentityStore,
};

/// Get a user by id
pub async fn get_user(db: &Database, id: i32) -> DomainResult<User> {
    IdentityStore::find_by_id(db, id)
        .await?
        .ok_or(DomainError::NotFound("User"))
}

/// Rating trajectory of a user, most recent contest first
pub async fn get_rating_history(
    db: &Database,
    user_id: i32,
    default_rating: i32,
) -> DomainResult<Vec<RatingTrajectoryEntry>> {
    RatingTrajectoryBuilder::new(db, default_rating)
        .build(user_id)
        .await
}

/// Apply an edit request on behalf of `actor`
pub async fn edit_user(
    db: &Database,
    actor: Option<&User>,
    target_id: i32,
    request: &EditUserRequest,
) -> DomainResult<ProfileEditOutcome> {
    profile_edit::edit_profile(db, actor, target_id, request).await
}

/// Soft delete a user on behalf of `actor`
pub async fn delete_user(db: &Database, actor: Option<&User>, target_id: i32) -> DomainResult<User> {
    profile_edit::soft_delete(db, actor, target_id).await
}
