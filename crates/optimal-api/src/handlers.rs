//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path parameters and JSON bodies via axum
//! extractors, calls into AppState services, and returns JSON responses.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use optimal_chat::protocol::{MessageRequest, RawResponseRecord};
use optimal_core::error::OptimalError;
use optimal_core::types::{is_evm_address, Strategy, UserState};

use crate::actions::ActionOutcome;
use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Whether messages are answered by the scripted demo agent.
    pub demo_mode: bool,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultAddressRequest {
    pub vault_address: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GenerateStrategyRequest {
    /// Free-form description of the user's goals and risk appetite.
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GenerateStrategyResponse {
    pub outcome: ActionOutcome,
    /// The outcome as a response record, ready for the client classifier.
    pub record: RawResponseRecord,
}

// =============================================================================
// Health
// =============================================================================

/// GET /health - health check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = HealthResponse)),
    tag = "system"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        demo_mode: state.config.demo.enabled,
    })
}

// =============================================================================
// Messages
// =============================================================================

/// POST /{agent_id}/message - send a message to an agent.
#[utoipa::path(
    post,
    path = "/{agent_id}/message",
    params(("agent_id" = String, Path, description = "Agent identifier")),
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Agent response batch", body = [RawResponseRecord]),
        (status = 400, description = "Empty message", body = ErrorBody),
        (status = 503, description = "No agent configured", body = ErrorBody)
    ),
    tag = "messages"
)]
pub async fn agent_message(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<Vec<RawResponseRecord>>, ApiError> {
    tracing::debug!(agent_id = %agent_id, sender = %request.name, "Message for agent");
    reply(&state, &request).await
}

/// POST /messages - send a message to the default agent.
#[utoipa::path(
    post,
    path = "/messages",
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Agent response batch", body = [RawResponseRecord]),
        (status = 400, description = "Empty message", body = ErrorBody),
        (status = 503, description = "No agent configured", body = ErrorBody)
    ),
    tag = "messages"
)]
pub async fn messages(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<Vec<RawResponseRecord>>, ApiError> {
    reply(&state, &request).await
}

async fn reply(
    state: &AppState,
    request: &MessageRequest,
) -> Result<Json<Vec<RawResponseRecord>>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("'text' must not be empty".to_string()));
    }
    if !state.config.demo.enabled {
        return Err(ApiError::ServiceUnavailable(
            "no agent runtime is configured and demo mode is disabled".to_string(),
        ));
    }
    Ok(Json(state.agent.respond(request).await))
}

/// DELETE /messages/session/{name} - restart a sender's demo conversation.
#[utoipa::path(
    delete,
    path = "/messages/session/{name}",
    params(("name" = String, Path, description = "Sender name used in message requests")),
    responses(
        (status = 204, description = "Conversation rewound to the start"),
        (status = 404, description = "Sender has no conversation", body = ErrorBody)
    ),
    tag = "messages"
)]
pub async fn reset_session(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.agent.reset(&name).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("No conversation for sender: {}", name)))
    }
}

// =============================================================================
// User state
// =============================================================================

/// GET /users/{user_id}/state - user state, created from the account on first read.
#[utoipa::path(
    get,
    path = "/users/{user_id}/state",
    params(("user_id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "User state", body = UserState),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn get_user_state(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserState>, ApiError> {
    Ok(Json(state.users.get_or_create_user_state(&user_id)?))
}

/// PUT /users/{user_id}/strategy - replace the user's strategy.
#[utoipa::path(
    put,
    path = "/users/{user_id}/strategy",
    params(("user_id" = String, Path, description = "Account id")),
    request_body = Strategy,
    responses(
        (status = 200, description = "Updated user state", body = UserState),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn update_strategy(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(strategy): Json<Strategy>,
) -> Result<Json<UserState>, ApiError> {
    state.users.get_or_create_user_state(&user_id)?;
    state.users.update_user_strategy(&user_id, &strategy)?;
    load_user(&state, &user_id)
}

/// PUT /users/{user_id}/vault - record the user's vault address.
#[utoipa::path(
    put,
    path = "/users/{user_id}/vault",
    params(("user_id" = String, Path, description = "Account id")),
    request_body = VaultAddressRequest,
    responses(
        (status = 200, description = "Updated user state", body = UserState),
        (status = 400, description = "Not an EVM address", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn update_vault(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<VaultAddressRequest>,
) -> Result<Json<UserState>, ApiError> {
    if !is_evm_address(&body.vault_address) {
        return Err(OptimalError::InvalidAddress(body.vault_address).into());
    }
    state.users.get_or_create_user_state(&user_id)?;
    state
        .users
        .update_user_vault_address(&user_id, &body.vault_address)?;
    load_user(&state, &user_id)
}

/// POST /users/{user_id}/strategy/generate - run the generate-strategy action.
#[utoipa::path(
    post,
    path = "/users/{user_id}/strategy/generate",
    params(("user_id" = String, Path, description = "Account id")),
    request_body = GenerateStrategyRequest,
    responses(
        (status = 200, description = "Strategy generated and stored", body = GenerateStrategyResponse),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 409, description = "User already has a strategy", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn generate_strategy(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<GenerateStrategyRequest>,
) -> Result<Json<GenerateStrategyResponse>, ApiError> {
    state.users.get_or_create_user_state(&user_id)?;

    let outcome = state.generate_strategy.handle(&user_id, &body.prompt).await;
    match &outcome {
        ActionOutcome::Completed { .. } => {}
        ActionOutcome::Skipped { reason } => return Err(ApiError::Conflict(reason.clone())),
        ActionOutcome::Failed { reason } => return Err(ApiError::Internal(reason.clone())),
    }

    let record = outcome.to_record(optimal_chat::replayer::DEMO_AGENT_NAME);
    Ok(Json(GenerateStrategyResponse { outcome, record }))
}

fn load_user(state: &AppState, user_id: &str) -> Result<Json<UserState>, ApiError> {
    state
        .users
        .get_user_by_id(user_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User state not found: {}", user_id)))
}
