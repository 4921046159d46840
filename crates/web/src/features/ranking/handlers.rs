use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use storage::dto::{
    common::PaginatedResponse,
    user::{FindUserQuery, FindUserResponse, UserListKind, UserListQuery, UserResponse},
};

use crate::error::WebError;
use crate::middleware::session::SessionContext;
use crate::state::AppState;

use super::services;

async fn user_listing(
    state: &AppState,
    query: &UserListQuery,
    kind: UserListKind,
) -> Result<Response, WebError> {
    let (default_sort, default_order) = match kind {
        UserListKind::Ranklist => (&state.config.ranklist_sort, &state.config.ranklist_order),
        UserListKind::Userlist => (&state.config.userlist_sort, &state.config.userlist_order),
    };
    let ordering = query
        .ordering(kind, default_sort, default_order)
        .map_err(WebError::BadRequest)?;
    let pagination = query.pagination();
    pagination.validate().map_err(WebError::BadRequest)?;

    let (users, total_items) = services::list_users(state.db.pool(), ordering, &pagination).await?;
    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(PaginatedResponse::new(data, pagination, total_items)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/ranklist",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users ordered by rating, accepted count, id or username", body = PaginatedResponse<UserResponse>),
        (status = 400, description = "Invalid sort or pagination parameters"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Account disabled")
    ),
    tag = "users"
)]
pub async fn get_ranklist(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<UserListQuery>,
) -> Result<Response, WebError> {
    session.require_available_actor()?;
    user_listing(&state, &query, UserListKind::Ranklist).await
}

#[utoipa::path(
    get,
    path = "/api/userlist",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users ordered by registration time, id or username", body = PaginatedResponse<UserResponse>),
        (status = 400, description = "Invalid sort or pagination parameters"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Account disabled")
    ),
    tag = "users"
)]
pub async fn get_userlist(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<UserListQuery>,
) -> Result<Response, WebError> {
    session.require_available_actor()?;
    user_listing(&state, &query, UserListKind::Userlist).await
}

#[utoipa::path(
    get,
    path = "/api/find_user",
    params(FindUserQuery),
    responses(
        (status = 200, description = "User found", body = FindUserResponse),
        (status = 404, description = "No such user")
    ),
    tag = "users"
)]
pub async fn find_user(
    State(state): State<AppState>,
    Query(query): Query<FindUserQuery>,
) -> Result<Response, WebError> {
    let user = services::find_user(state.db.pool(), &query.username)
        .await?
        .ok_or(WebError::NotFound)?;

    Ok(Json(FindUserResponse { user_id: user.id }).into_response())
}
