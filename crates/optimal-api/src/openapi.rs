//! OpenAPI document for the HTTP API.
//!
//! Served as JSON at [`OPENAPI_JSON_PATH`] and browsable through Swagger UI
//! at [`SWAGGER_UI_PATH`].

use utoipa::OpenApi;

use optimal_chat::protocol::{MessageRequest, RawResponseRecord};
use optimal_core::types::{Strategy, UserState};

use crate::error::ErrorBody;
use crate::handlers;

pub const SWAGGER_UI_PATH: &str = "/api-docs";
pub const OPENAPI_JSON_PATH: &str = "/api-docs.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OptimalAI API",
        version = "0.0.1",
        description = "API documentation for the OptimalAI backend"
    ),
    servers((url = "http://localhost:3000", description = "Development server")),
    paths(
        handlers::health,
        handlers::agent_message,
        handlers::messages,
        handlers::reset_session,
        handlers::get_user_state,
        handlers::update_strategy,
        handlers::update_vault,
        handlers::generate_strategy,
    ),
    components(schemas(
        MessageRequest,
        RawResponseRecord,
        UserState,
        Strategy,
        ErrorBody,
    )),
    tags(
        (name = "system", description = "Health and metadata"),
        (name = "messages", description = "Conversation with the agent"),
        (name = "users", description = "Per-user wallet, vault and strategy state")
    )
)]
pub struct ApiDoc;
