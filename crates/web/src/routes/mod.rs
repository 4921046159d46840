use axum::Router;

use crate::features::{auth, ranking, users};
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes::routes())
        .merge(ranking::routes::routes())
        .nest("/users", users::routes::routes())
}
