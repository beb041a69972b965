use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::session_stream,
        crate::routes::sessions::create_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::update_config,
        crate::routes::sessions::delete_session,
        crate::routes::sessions::scoreboard,
        crate::routes::play::start_game,
        crate::routes::play::pause_game,
        crate::routes::play::resume_game,
        crate::routes::play::end_game,
        crate::routes::play::reset_game,
        crate::routes::play::next_question,
        crate::routes::play::select_answer,
        crate::routes::play::submit_answer,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::ConfigInput,
            crate::dto::session::ConfigView,
            crate::dto::session::StatsSummary,
            crate::dto::session::SessionSummary,
            crate::dto::session::ScoreboardEntry,
            crate::dto::session::ScoreboardResponse,
            crate::dto::session::ActionResponse,
            crate::dto::question::QuestionView,
            crate::dto::question::SelectAnswerRequest,
            crate::dto::question::SubmitAnswerRequest,
            crate::dto::question::AnswerResultView,
            crate::dto::sse::Handshake,
            crate::dto::sse::SessionHandshake,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "sessions", description = "Session management endpoints"),
        (name = "play", description = "Gameplay lifecycle and question flow"),
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
