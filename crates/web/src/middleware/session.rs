//! Resolves the `login` cookie into the acting user for the current request.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use storage::models::{MANAGE_USER, User};
use uuid::Uuid;

use crate::error::WebError;
use crate::features::auth::services;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "login";

/// Session-bound view of who is making the request.
///
/// Handlers pass the actor explicitly into the domain services; nothing is
/// kept in global state.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session_id: Option<Uuid>,
    actor: Option<User>,
}

impl SessionContext {
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn actor(&self) -> Option<&User> {
        self.actor.as_ref()
    }

    pub fn require_actor(&self) -> Result<&User, WebError> {
        self.actor().ok_or(WebError::NotLoggedIn)
    }

    /// Logged in and not disabled by an administrator.
    pub fn require_available_actor(&self) -> Result<&User, WebError> {
        let actor = self.require_actor()?;
        if !actor.is_available {
            return Err(WebError::Forbidden(
                "You do not have permission, please contact an administrator".to_string(),
            ));
        }
        Ok(actor)
    }

    pub fn allowed_manage(&self) -> bool {
        self.actor()
            .is_some_and(|actor| actor.has_privilege(MANAGE_USER))
    }

    /// Replaces the cached actor after it edited its own profile. Updates for
    /// any other user are ignored.
    pub fn refresh(&mut self, user: User) {
        if self.actor.as_ref().is_some_and(|actor| actor.id == user.id) {
            self.actor = Some(user);
        }
    }
}

pub fn session_cookie(session_id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(session_id) = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        else {
            return Ok(Self::default());
        };

        let actor = services::resolve_session(state.db.pool(), session_id).await?;
        if actor.is_none() {
            tracing::debug!(%session_id, "Session cookie does not resolve to a user");
            return Ok(Self::default());
        }

        Ok(Self {
            session_id: Some(session_id),
            actor,
        })
    }
}
