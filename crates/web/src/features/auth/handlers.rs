use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use storage::dto::user::{LoginRequest, LoginResponse, UserResponse};
use validator::Validate;

use crate::error::WebError;
use crate::middleware::session::{SessionContext, expired_session_cookie, session_cookie};
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = LoginResponse),
        (status = 400, description = "Invalid credentials or already logged in")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    session: SessionContext,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<Response, WebError> {
    if session.actor().is_some() {
        return Err(WebError::BadRequest(
            "You are already logged in, please log out first".to_string(),
        ));
    }
    req.validate()?;

    let (new_session, user) = services::login(state.db.pool(), &req).await?;
    tracing::info!(user_id = user.id, "User logged in");

    let response = LoginResponse {
        user: UserResponse::from_user(user, true),
    };

    Ok((jar.add(session_cookie(new_session.session_id)), Json(response)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 204, description = "Session closed and cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    session: SessionContext,
    jar: CookieJar,
) -> Result<Response, WebError> {
    if let Some(session_id) = session.session_id() {
        services::logout(state.db.pool(), session_id).await?;
    }

    Ok((jar.remove(expired_session_cookie()), StatusCode::NO_CONTENT).into_response())
}
