use anyhow::Context;
use axum::Router;
use storage::Database;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod routes;
mod state;

use config::Config;
use features::{auth, ranking, users};
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::login,
        auth::handlers::logout,
        ranking::handlers::get_ranklist,
        ranking::handlers::get_userlist,
        ranking::handlers::find_user,
        users::handlers::get_user,
        users::handlers::get_user_edit,
        users::handlers::update_user,
        users::handlers::delete_user,
    ),
    components(
        schemas(
            storage::dto::common::PaginationMeta,
            storage::dto::rating::RatingTrajectoryEntry,
            storage::dto::user::UserResponse,
            storage::dto::user::UserProfileResponse,
            storage::dto::user::UserEditView,
            storage::dto::user::EditUserRequest,
            storage::dto::user::PrivilegeInput,
            storage::dto::user::FindUserResponse,
            storage::dto::user::LoginRequest,
            storage::dto::user::LoginResponse,
        )
    ),
    tags(
        (name = "auth", description = "Session endpoints"),
        (name = "users", description = "User listings, profiles and profile editing"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting user pages API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let bind_address = format!("{}:{}", config.host, config.port);
    let state = AppState::new(db, config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", routes::api_routes())
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
