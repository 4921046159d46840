use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{delete_user, get_user, get_user_edit, update_user};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_user))
        .route("/:id/edit", get(get_user_edit).post(update_user))
        .route("/:id/delete", post(delete_user))
}
