use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session::{
        ActionResponse, ConfigInput, CreateSessionRequest, ScoreboardResponse, SessionSummary,
    },
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes handling session management and the scoreboard.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/config", patch(update_config))
        .route("/scoreboard", get(scoreboard))
}

/// Create a fresh trivia session and register it.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionSummary),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    payload.validate()?;
    let summary = session_service::create_session(&state, payload).await?;
    Ok(Json(summary))
}

/// Fetch the full projection of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session found", body = SessionSummary),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = session_service::get_session(&state, id).await?;
    Ok(Json(summary))
}

/// Merge a partial configuration update into the session.
#[utoipa::path(
    patch,
    path = "/sessions/{id}/config",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = ConfigInput,
    responses(
        (status = 200, description = "Configuration updated", body = SessionSummary),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn update_config(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfigInput>,
) -> Result<Json<SessionSummary>, AppError> {
    payload.validate()?;
    let summary = session_service::update_config(&state, id, payload).await?;
    Ok(Json(summary))
}

/// Remove a session from memory and storage.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session deleted", body = ActionResponse),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    session_service::delete_session(&state, id).await?;
    Ok(Json(ActionResponse {
        message: format!("session `{id}` deleted"),
    }))
}

/// Ranked scoreboard across all known sessions.
#[utoipa::path(
    get,
    path = "/scoreboard",
    tag = "sessions",
    responses((status = 200, description = "Scoreboard", body = ScoreboardResponse))
)]
pub async fn scoreboard(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardResponse>, AppError> {
    let board = session_service::scoreboard(&state).await?;
    Ok(Json(board))
}
