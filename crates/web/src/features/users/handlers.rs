use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::user::{EditUserRequest, UserEditView, UserProfileResponse, UserResponse},
    error::DomainError,
};
use validator::Validate;

use crate::error::WebError;
use crate::middleware::session::SessionContext;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = i32, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User profile with rating history", body = UserProfileResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i32>,
) -> Result<Response, WebError> {
    let actor = session.require_actor()?;

    let user = services::get_user(&state.db, id).await?;
    let rating_history =
        services::get_rating_history(&state.db, user.id, state.config.default_rating).await?;

    let allowed_edit = user.is_allowed_edit_by(Some(actor));
    let email_visible = user.public_email || allowed_edit;

    let response = UserProfileResponse {
        user: UserResponse::from_user(user, email_visible),
        allowed_edit,
        email_visible,
        rating_history,
    };

    Ok(Json(response).into_response())
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/edit",
    params(
        ("id" = i32, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Editable view of the user", body = UserEditView),
        (status = 403, description = "Not allowed to edit this user"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user_edit(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i32>,
) -> Result<Response, WebError> {
    let user = services::get_user(&state.db, id).await?;
    if !user.is_allowed_edit_by(session.actor()) {
        return Err(DomainError::Unauthorized.into());
    }

    Ok(Json(UserEditView::new(user, session.allowed_manage())).into_response())
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/edit",
    params(
        ("id" = i32, Path, description = "User id")
    ),
    request_body = EditUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEditView),
        (status = 400, description = "Invalid username, wrong old password or validation error"),
        (status = 403, description = "Not allowed to edit this user"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already taken")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    mut session: SessionContext,
    Path(id): Path<i32>,
    Json(req): Json<EditUserRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let outcome = services::edit_user(&state.db, session.actor(), id, &req).await?;
    if outcome.refresh_session {
        session.refresh(outcome.user.clone());
    }

    Ok(Json(UserEditView::new(outcome.user, session.allowed_manage())).into_response())
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/delete",
    params(
        ("id" = i32, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User hidden and disabled"),
        (status = 400, description = "Administrators cannot be deleted"),
        (status = 403, description = "Not allowed to delete this user"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i32>,
) -> Result<Response, WebError> {
    services::delete_user(&state.db, session.actor(), id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
