use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{
        phase::VisiblePhase,
        question::{AnswerResultView, QuestionView},
        session::{ScoreboardEntry, StatsSummary},
    },
    state::session::Achievement,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name; `None` for unnamed events.
    pub event: Option<String>,
    /// Pre-rendered JSON data payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`public` or a session id).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to a session SSE client, including where the
/// lifecycle currently stands.
pub struct SessionHandshake {
    /// Identifier of the session stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
    /// Lifecycle phase of the session at subscription time.
    pub phase: VisiblePhase,
    /// Phase a pending transition is moving towards, if one is in flight.
    pub pending: Option<VisiblePhase>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Whether the backend is currently running without a storage backend.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever a session's lifecycle phase changes.
pub struct PhaseChangedEvent {
    /// Session whose phase changed.
    pub session_id: Uuid,
    /// New lifecycle phase.
    pub phase: VisiblePhase,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a new question has been installed on a session.
pub struct QuestionReadyEvent {
    /// Session the question was installed on.
    pub session_id: Uuid,
    /// The question, without the correct answer.
    pub question: QuestionView,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per second while a question countdown is running.
pub struct TimerTickEvent {
    /// Session whose countdown ticked.
    pub session_id: Uuid,
    /// Seconds left on the countdown.
    pub time_remaining: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the countdown of the active question reaches zero.
pub struct QuestionTimeoutEvent {
    /// Session whose countdown expired.
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an answer has been graded.
pub struct AnswerSubmittedEvent {
    /// Session the answer belongs to.
    pub session_id: Uuid,
    /// Graded outcome, including the revealed correct answer.
    pub result: AnswerResultView,
    /// Statistics after the submission was applied.
    pub stats: StatsSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a submission unlocked an achievement.
pub struct AchievementEvent {
    /// Session that unlocked the achievement.
    pub session_id: Uuid,
    /// The unlocked achievement.
    pub achievement: Achievement,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast on the public stream when a session's score changes.
pub struct ScoreboardEvent {
    /// Ranked entries, highest score first.
    pub entries: Vec<ScoreboardEntry>,
}
