//! OptimalAI API crate - axum HTTP server and route handlers.
//!
//! Serves the message endpoint (backed by the demo agent), the per-user
//! state endpoints, the generate-strategy action, the OpenAPI document,
//! and a health check.

pub mod actions;
pub mod agent;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
