use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Question difficulty persisted alongside configuration and history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyEntity {
    Easy,
    Medium,
    Hard,
}

/// Answer slot identifier persisted in session history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnswerLetterEntity {
    A,
    B,
    C,
    D,
}

/// Lifecycle phase the session was in when last persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GamePhaseEntity {
    Idle,
    Starting,
    Playing,
    Paused,
    Ended,
}

/// Gameplay configuration persisted with the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfigEntity {
    /// Difficulty requested for generated questions.
    pub difficulty: DifficultyEntity,
    /// Category requested for generated questions.
    pub category: String,
    /// Countdown allotted to each question, in seconds.
    pub time_per_question_secs: u32,
    /// Optional cap on the number of questions for the session.
    pub max_questions: Option<u32>,
    /// Whether answer explanations are surfaced after submission.
    pub enable_explanations: bool,
    /// Whether the next question is scheduled automatically after a submission.
    pub auto_advance: bool,
    /// Delay before an automatic advance, in seconds.
    pub auto_advance_delay_secs: u32,
}

/// Cumulative statistics persisted with the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStatsEntity {
    /// Total number of submitted answers.
    pub questions_answered: u32,
    /// Number of correct submissions.
    pub correct_answers: u32,
    /// Length of the trailing run of correct answers.
    pub current_streak: u32,
    /// Longest streak observed so far.
    pub max_streak: u32,
    /// Total points accumulated.
    pub total_score: u32,
    /// Points earned this session.
    pub points_this_session: u32,
    /// Wall-clock seconds played, computed when the game ends.
    pub total_time_played_secs: u64,
    /// Average seconds per question, computed when the game ends.
    pub average_time_per_question_secs: f64,
    /// Percentage of correct answers in `[0, 100]`.
    pub accuracy: f64,
    /// Wall-clock instant the session started accumulating.
    pub started_at: SystemTime,
}

/// One previously served question, kept for dedupe and avoid-lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionRecordEntity {
    /// Question identifier.
    pub id: Uuid,
    /// Question text.
    pub text: String,
}

/// Aggregate session entity persisted by the storage layer.
///
/// The active question is deliberately absent: a rehydrated session always
/// resumes without a question on display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntity {
    /// Primary key of the session.
    pub id: Uuid,
    /// Opaque player identifier supplied at creation.
    pub player_id: String,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the session was mutated.
    pub updated_at: SystemTime,
    /// Lifecycle phase at persistence time.
    pub phase: GamePhaseEntity,
    /// Gameplay configuration.
    pub config: GameConfigEntity,
    /// Cumulative statistics.
    pub stats: GameStatsEntity,
    /// Questions already served this session, oldest first.
    pub question_history: Vec<QuestionRecordEntity>,
}
