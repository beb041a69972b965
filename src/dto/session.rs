//! DTO definitions for session management and the scoreboard.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_system_time,
        phase::VisiblePhase,
        question::{AnswerResultView, QuestionView},
        validation::{validate_category, validate_player_id},
    },
    state::{
        session::{ConfigPatch, Difficulty, GameConfig, GameSession, GameStats},
        state_machine::GamePhase,
    },
};

/// Payload used to bootstrap a brand-new trivia session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Opaque identifier for the player this session belongs to.
    pub player_id: String,
    /// Optional initial configuration; omitted fields take defaults.
    #[serde(default)]
    pub config: Option<ConfigInput>,
}

impl Validate for CreateSessionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_player_id(&self.player_id) {
            errors.add("player_id", e);
        }

        if let Some(ref config) = self.config {
            errors.merge_self("config", config.validate());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Partial configuration supplied at creation or through a PATCH.
#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct ConfigInput {
    /// Requested question difficulty.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Requested question category.
    #[serde(default)]
    pub category: Option<String>,
    /// Countdown allotted to each question, in seconds.
    #[serde(default)]
    pub time_per_question_secs: Option<u32>,
    /// Question cap for the session.
    /// If not specified, keeps the current cap.
    /// If null is specified, removes the cap.
    /// If a number is specified, sets the cap to this value.
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<u32>)]
    pub max_questions: Option<Option<u32>>,
    /// Whether answer explanations are surfaced after submission.
    #[serde(default)]
    pub enable_explanations: Option<bool>,
    /// Whether the next question is scheduled automatically after a submission.
    #[serde(default)]
    pub auto_advance: Option<bool>,
    /// Delay before an automatic advance, in seconds.
    #[serde(default)]
    pub auto_advance_delay_secs: Option<u32>,
}

/// Serde helper distinguishing an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

impl Validate for ConfigInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref category) = self.category {
            if let Err(e) = validate_category(category) {
                errors.add("category", e);
            }
        }

        if let Some(secs) = self.time_per_question_secs {
            if !(5..=300).contains(&secs) {
                let mut err = validator::ValidationError::new("time_per_question_range");
                err.message = Some("Time per question must be between 5 and 300 seconds".into());
                errors.add("time_per_question_secs", err);
            }
        }

        if let Some(Some(max)) = self.max_questions {
            if max == 0 {
                let mut err = validator::ValidationError::new("max_questions_zero");
                err.message = Some("Question cap must be at least 1".into());
                errors.add("max_questions", err);
            }
        }

        if let Some(delay) = self.auto_advance_delay_secs {
            if delay > 60 {
                let mut err = validator::ValidationError::new("auto_advance_delay_range");
                err.message = Some("Auto-advance delay must be at most 60 seconds".into());
                errors.add("auto_advance_delay_secs", err);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl From<ConfigInput> for ConfigPatch {
    fn from(input: ConfigInput) -> Self {
        Self {
            difficulty: input.difficulty,
            category: input.category,
            time_per_question_secs: input.time_per_question_secs,
            max_questions: input.max_questions,
            enable_explanations: input.enable_explanations,
            auto_advance: input.auto_advance,
            auto_advance_delay_secs: input.auto_advance_delay_secs,
        }
    }
}

/// Effective session configuration as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ConfigView {
    /// Question difficulty.
    pub difficulty: Difficulty,
    /// Question category.
    pub category: String,
    /// Countdown allotted to each question, in seconds.
    pub time_per_question_secs: u32,
    /// Optional question cap.
    pub max_questions: Option<u32>,
    /// Whether answer explanations are surfaced after submission.
    pub enable_explanations: bool,
    /// Whether the next question is scheduled automatically.
    pub auto_advance: bool,
    /// Delay before an automatic advance, in seconds.
    pub auto_advance_delay_secs: u32,
}

impl From<&GameConfig> for ConfigView {
    fn from(config: &GameConfig) -> Self {
        Self {
            difficulty: config.difficulty,
            category: config.category.clone(),
            time_per_question_secs: config.time_per_question_secs,
            max_questions: config.max_questions,
            enable_explanations: config.enable_explanations,
            auto_advance: config.auto_advance,
            auto_advance_delay_secs: config.auto_advance_delay_secs,
        }
    }
}

/// Cumulative statistics as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct StatsSummary {
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
    /// Percentage of correct answers in `[0, 100]`.
    pub accuracy: f64,
    /// Wall-clock seconds played, computed when the game ends.
    pub total_time_played_secs: u64,
    /// Average seconds per question, computed when the game ends.
    pub average_time_per_question_secs: f64,
}

impl From<&GameStats> for StatsSummary {
    fn from(stats: &GameStats) -> Self {
        Self {
            questions_answered: stats.questions_answered,
            correct_answers: stats.correct_answers,
            current_streak: stats.current_streak,
            max_streak: stats.max_streak,
            total_score: stats.total_score,
            accuracy: stats.accuracy,
            total_time_played_secs: stats.total_time_played_secs,
            average_time_per_question_secs: stats.average_time_per_question_secs,
        }
    }
}

/// Full projection of a session returned by the REST API.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: Uuid,
    /// Player the session belongs to.
    pub player_id: String,
    /// Current lifecycle phase.
    pub phase: VisiblePhase,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last-update timestamp (RFC 3339).
    pub updated_at: String,
    /// Effective configuration.
    pub config: ConfigView,
    /// Cumulative statistics.
    pub stats: StatsSummary,
    /// The active question, if one is installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    /// Result of the most recent submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_result: Option<AnswerResultView>,
    /// Last upstream failure surfaced to the client, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SessionSummary {
    /// Build the summary from the session data and its lifecycle phase.
    pub fn from_parts(session: &GameSession, phase: GamePhase) -> Self {
        Self {
            session_id: session.session_id,
            player_id: session.player_id.clone(),
            phase: phase.into(),
            created_at: format_system_time(session.created_at),
            updated_at: format_system_time(session.updated_at),
            config: (&session.config).into(),
            stats: (&session.stats).into(),
            current_question: session.current_question.as_ref().map(Into::into),
            last_result: session.last_result.as_ref().map(Into::into),
            last_error: session.last_error.clone(),
        }
    }
}

/// One row of the cross-session scoreboard.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ScoreboardEntry {
    /// Session identifier.
    pub session_id: Uuid,
    /// Player the session belongs to.
    pub player_id: String,
    /// Total points accumulated.
    pub total_score: u32,
    /// Percentage of correct answers in `[0, 100]`.
    pub accuracy: f64,
    /// Longest streak observed.
    pub max_streak: u32,
    /// Total number of submitted answers.
    pub questions_answered: u32,
    /// Current lifecycle phase of the session.
    pub phase: VisiblePhase,
}

/// Scoreboard returned by the REST API, ordered by score descending.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreboardResponse {
    /// Ranked entries, highest score first.
    pub entries: Vec<ScoreboardEntry>,
}

/// Generic action acknowledgement used by lifecycle endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human-readable confirmation message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_session_request_validates_player_id() {
        let request = CreateSessionRequest {
            player_id: String::new(),
            config: None,
        };
        assert!(request.validate().is_err());

        let request = CreateSessionRequest {
            player_id: "player-1".into(),
            config: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn config_input_rejects_out_of_range_countdown() {
        let input = ConfigInput {
            time_per_question_secs: Some(2),
            ..ConfigInput::default()
        };
        assert!(input.validate().is_err());

        let input = ConfigInput {
            time_per_question_secs: Some(30),
            ..ConfigInput::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn config_input_distinguishes_null_from_absent_cap() {
        let absent: ConfigInput = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.max_questions, None);

        let cleared: ConfigInput = serde_json::from_str(r#"{"max_questions": null}"#).unwrap();
        assert_eq!(cleared.max_questions, Some(None));

        let set: ConfigInput = serde_json::from_str(r#"{"max_questions": 10}"#).unwrap();
        assert_eq!(set.max_questions, Some(Some(10)));
    }

    #[test]
    fn config_input_rejects_zero_cap() {
        let input = ConfigInput {
            max_questions: Some(Some(0)),
            ..ConfigInput::default()
        };
        assert!(input.validate().is_err());
    }
}
