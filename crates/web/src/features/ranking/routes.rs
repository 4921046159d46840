use axum::{Router, routing::get};

use super::handlers::{find_user, get_ranklist, get_userlist};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ranklist", get(get_ranklist))
        .route("/userlist", get(get_userlist))
        .route("/find_user", get(find_user))
}
