use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/public",
    tag = "sse",
    responses((status = 200, description = "Public SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream cross-session events (scoreboard, achievements, system status).
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    info!("New public SSE connection");
    let degraded = state.is_degraded().await;
    sse_service::broadcast_handshake(state.public_sse(), "public", degraded);
    sse_service::to_sse_stream(receiver, StreamKind::Public)
}

#[utoipa::path(
    get,
    path = "/sse/sessions/{id}",
    tag = "sse",
    params(("id" = String, Path, description = "Identifier of the session to follow")),
    responses(
        (status = 200, description = "Session SSE stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Session not found")
    )
)]
/// Stream the private events of one session (questions, ticks, results).
pub async fn session_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let receiver = sse_service::subscribe_session(&state, id)?;
    info!(session_id = %id, "New session SSE connection");
    if let Some(slot) = state.slot(id) {
        let degraded = state.is_degraded().await;
        let snapshot = slot.snapshot().await;
        sse_service::broadcast_session_handshake(slot.events(), &id.to_string(), degraded, snapshot);
    }
    Ok(sse_service::to_sse_stream(receiver, StreamKind::Session(id)))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/sessions/{id}", get(session_stream))
}
