//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, a body size limit,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use optimal_core::config::OptimalConfig;
use optimal_core::error::OptimalError;

use crate::handlers;
use crate::openapi::{ApiDoc, OPENAPI_JSON_PATH, SWAGGER_UI_PATH};
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/messages", post(handlers::messages))
        .route("/messages/session/{name}", delete(handlers::reset_session))
        .route("/{agent_id}/message", post(handlers::agent_message))
        .route("/users/{user_id}/state", get(handlers::get_user_state))
        .route("/users/{user_id}/strategy", put(handlers::update_strategy))
        .route("/users/{user_id}/vault", put(handlers::update_vault))
        .route(
            "/users/{user_id}/strategy/generate",
            post(handlers::generate_strategy),
        )
        .merge(SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server on the configured port.
///
/// Binds to 127.0.0.1 (localhost only).
pub async fn start_server(config: &OptimalConfig, state: AppState) -> Result<(), OptimalError> {
    let addr = format!("127.0.0.1:{}", config.general.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
