//! Gameplay routes: lifecycle transitions and the question/answer flow.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        question::{AnswerResultView, QuestionView, SelectAnswerRequest, SubmitAnswerRequest},
        session::SessionSummary,
    },
    error::AppError,
    services::{game_service, session_service},
    state::SharedState,
};

/// Routes handling the gameplay lifecycle and question flow.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/{id}/start", post(start_game))
        .route("/sessions/{id}/pause", post(pause_game))
        .route("/sessions/{id}/resume", post(resume_game))
        .route("/sessions/{id}/end", post(end_game))
        .route("/sessions/{id}/reset", post(reset_game))
        .route("/sessions/{id}/question", post(next_question))
        .route("/sessions/{id}/answer", put(select_answer).post(submit_answer))
}

/// Start a new game on an idle session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    tag = "play",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Game started", body = SessionSummary),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Game cannot start from the current phase")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let slot = session_service::resolve_slot(&state, id).await?;
    let summary = game_service::start_game(&state, &slot).await?;
    Ok(Json(summary))
}

/// Suspend gameplay; a no-op when the session is not playing.
#[utoipa::path(
    post,
    path = "/sessions/{id}/pause",
    tag = "play",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Game paused (or already not playing)", body = SessionSummary),
        (status = 404, description = "Session not found")
    )
)]
pub async fn pause_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let slot = session_service::resolve_slot(&state, id).await?;
    let summary = game_service::pause_game(&state, &slot).await?;
    Ok(Json(summary))
}

/// Resume gameplay from a pause.
#[utoipa::path(
    post,
    path = "/sessions/{id}/resume",
    tag = "play",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Game resumed", body = SessionSummary),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session is not paused")
    )
)]
pub async fn resume_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let slot = session_service::resolve_slot(&state, id).await?;
    let summary = game_service::resume_game(&state, &slot).await?;
    Ok(Json(summary))
}

/// Finish the game and compute final statistics.
#[utoipa::path(
    post,
    path = "/sessions/{id}/end",
    tag = "play",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Game ended", body = SessionSummary),
        (status = 404, description = "Session not found"),
        (status = 409, description = "No game is running")
    )
)]
pub async fn end_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let slot = session_service::resolve_slot(&state, id).await?;
    let summary = game_service::end_game(&state, &slot).await?;
    Ok(Json(summary))
}

/// Discard all progress and return the session to idle.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reset",
    tag = "play",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session reset", body = SessionSummary),
        (status = 404, description = "Session not found")
    )
)]
pub async fn reset_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let slot = session_service::resolve_slot(&state, id).await?;
    let summary = game_service::reset_game(&state, &slot).await?;
    Ok(Json(summary))
}

/// Generate and serve the next question.
#[utoipa::path(
    post,
    path = "/sessions/{id}/question",
    tag = "play",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Question served", body = QuestionView),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session is not playing or generation is in flight"),
        (status = 502, description = "Question generation failed")
    )
)]
pub async fn next_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionView>, AppError> {
    let slot = session_service::resolve_slot(&state, id).await?;
    let view = game_service::next_question(&state, &slot).await?;
    Ok(Json(view))
}

/// Record the player's selected answer without submitting it.
#[utoipa::path(
    put,
    path = "/sessions/{id}/answer",
    tag = "play",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = SelectAnswerRequest,
    responses(
        (status = 200, description = "Selection recorded", body = QuestionView),
        (status = 404, description = "Session not found"),
        (status = 409, description = "No active question accepts a selection")
    )
)]
pub async fn select_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectAnswerRequest>,
) -> Result<Json<QuestionView>, AppError> {
    let slot = session_service::resolve_slot(&state, id).await?;
    let view = game_service::select_answer(&slot, payload).await?;
    Ok(Json(view))
}

/// Submit the answer for grading.
#[utoipa::path(
    post,
    path = "/sessions/{id}/answer",
    tag = "play",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer graded", body = AnswerResultView),
        (status = 404, description = "Session not found"),
        (status = 409, description = "No active question or already submitted")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<AnswerResultView>, AppError> {
    let slot = session_service::resolve_slot(&state, id).await?;
    let result = game_service::submit_answer(&state, &slot, payload).await?;
    Ok(Json(result))
}
