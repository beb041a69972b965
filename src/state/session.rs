use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{
    AnswerLetterEntity, DifficultyEntity, GameConfigEntity, GamePhaseEntity, GameStatsEntity,
    QuestionRecordEntity, SessionEntity,
};
use crate::state::state_machine::GamePhase;

/// Number of answer options every question carries.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Question difficulty, driving base points and generation prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Base value 10 points.
    Easy,
    /// Base value 20 points.
    Medium,
    /// Base value 30 points.
    Hard,
}

impl Difficulty {
    /// Base points awarded for a correct answer at this difficulty.
    pub fn base_points(self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 20,
            Difficulty::Hard => 30,
        }
    }
}

/// Answer slot identifier for the four options of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AnswerLetter {
    /// First option.
    A,
    /// Second option.
    B,
    /// Third option.
    C,
    /// Fourth option.
    D,
}

impl AnswerLetter {
    /// Index of the option this letter refers to.
    pub fn index(self) -> usize {
        match self {
            AnswerLetter::A => 0,
            AnswerLetter::B => 1,
            AnswerLetter::C => 2,
            AnswerLetter::D => 3,
        }
    }
}

/// Per-session gameplay configuration; partial updates merge over the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Difficulty requested for generated questions.
    pub difficulty: Difficulty,
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

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            category: "general".into(),
            time_per_question_secs: 30,
            max_questions: None,
            enable_explanations: true,
            auto_advance: false,
            auto_advance_delay_secs: 5,
        }
    }
}

/// Partial configuration update shallow-merged into [`GameConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    /// New difficulty, when present.
    pub difficulty: Option<Difficulty>,
    /// New category, when present.
    pub category: Option<String>,
    /// New per-question countdown, when present.
    pub time_per_question_secs: Option<u32>,
    /// New question cap; `Some(None)` clears the cap.
    pub max_questions: Option<Option<u32>>,
    /// New explanations toggle, when present.
    pub enable_explanations: Option<bool>,
    /// New auto-advance toggle, when present.
    pub auto_advance: Option<bool>,
    /// New auto-advance delay, when present.
    pub auto_advance_delay_secs: Option<u32>,
}

impl GameConfig {
    /// Shallow-merge a patch into this configuration.
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(secs) = patch.time_per_question_secs {
            self.time_per_question_secs = secs;
        }
        if let Some(max) = patch.max_questions {
            self.max_questions = max;
        }
        if let Some(enable) = patch.enable_explanations {
            self.enable_explanations = enable;
        }
        if let Some(auto) = patch.auto_advance {
            self.auto_advance = auto;
        }
        if let Some(delay) = patch.auto_advance_delay_secs {
            self.auto_advance_delay_secs = delay;
        }
    }
}

/// Sub-state of the active question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPhase {
    /// Question installed, no answer chosen yet.
    Ready,
    /// An answer has been selected but not submitted.
    Answering,
    /// The answer has been submitted and the result is on display.
    Reviewing,
}

/// Payload required to install a new question on a session.
#[derive(Debug, Clone)]
pub struct QuestionSpec {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Question text shown to the player.
    pub text: String,
    /// The four candidate answers, in display order.
    pub options: Vec<String>,
    /// Letter of the correct option; never exposed before submission.
    pub correct_answer: AnswerLetter,
    /// Category the question belongs to.
    pub category: String,
    /// Difficulty the question was generated at.
    pub difficulty: Difficulty,
    /// Optional explanation surfaced after submission.
    pub explanation: Option<String>,
}

/// The single active question of a session.
#[derive(Debug, Clone)]
pub struct CurrentQuestion {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Question text shown to the player.
    pub text: String,
    /// The four candidate answers, in display order.
    pub options: Vec<String>,
    /// Letter of the correct option.
    pub correct_answer: AnswerLetter,
    /// Category the question belongs to.
    pub category: String,
    /// Difficulty the question was generated at.
    pub difficulty: Difficulty,
    /// Seconds left on the countdown.
    pub time_remaining: u32,
    /// Answer currently selected by the player, if any.
    pub selected_answer: Option<AnswerLetter>,
    /// Wall-clock instant the question was installed.
    pub started_at: SystemTime,
    /// Whether the answer has been submitted; monotonic per question.
    pub is_submitted: bool,
    /// Sub-state of the question flow.
    pub phase: QuestionPhase,
    /// Optional explanation surfaced after submission.
    pub explanation: Option<String>,
}

/// Cumulative statistics for a session; counters only ever grow except the
/// current streak, which resets on an incorrect answer.
#[derive(Debug, Clone, PartialEq)]
pub struct GameStats {
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
    /// Points earned this session; mirrors `total_score` until multi-session
    /// carry-over exists.
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

impl GameStats {
    /// Fresh statistics anchored at the current instant.
    pub fn new() -> Self {
        Self {
            questions_answered: 0,
            correct_answers: 0,
            current_streak: 0,
            max_streak: 0,
            total_score: 0,
            points_this_session: 0,
            total_time_played_secs: 0,
            average_time_per_question_secs: 0.0,
            accuracy: 0.0,
            started_at: SystemTime::now(),
        }
    }

    /// Fold one submission outcome into the counters.
    pub fn apply_submission(&mut self, is_correct: bool, points_earned: u32) {
        self.questions_answered += 1;
        if is_correct {
            self.correct_answers += 1;
            self.current_streak += 1;
            self.max_streak = self.max_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
        self.total_score += points_earned;
        self.points_this_session += points_earned;
        self.accuracy = f64::from(self.correct_answers) / f64::from(self.questions_answered) * 100.0;
    }

    /// Compute end-of-game wall-clock totals.
    pub fn finalize(&mut self, now: SystemTime) {
        self.total_time_played_secs = now
            .duration_since(self.started_at)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        if self.questions_answered > 0 {
            self.average_time_per_question_secs =
                self.total_time_played_secs as f64 / f64::from(self.questions_answered);
        }
    }
}

impl Default for GameStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Achievement categories, listed in detection priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    /// Every answer so far was correct (requires at least five).
    PerfectAccuracy,
    /// Total score crossed a milestone threshold.
    ScoreMilestone,
    /// The trailing correct streak reached a threshold.
    AnswerStreak,
    /// A correct answer landed inside the speed-bonus window.
    SpeedBonus,
}

/// A single achievement unlocked by a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Achievement {
    /// Achievement category.
    pub kind: AchievementKind,
    /// Short display title.
    pub title: String,
    /// Longer message shown to the player.
    pub message: String,
    /// Threshold value the achievement relates to (streak length, milestone
    /// score, tier), when meaningful.
    pub value: Option<u32>,
}

/// Transient record of the most recent submission, overwritten each round.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    /// Whether the submitted answer was correct.
    pub is_correct: bool,
    /// Points awarded for the submission.
    pub points_earned: u32,
    /// Letter of the correct option.
    pub correct_answer: AnswerLetter,
    /// Letter the player submitted, if any was selected before the deadline.
    pub selected_answer: Option<AnswerLetter>,
    /// Seconds spent on the question, floored at one.
    pub time_taken_secs: u32,
    /// Explanation for the correct answer, when enabled and available.
    pub explanation: Option<String>,
    /// Whether this submission ended a running streak.
    pub streak_broken: bool,
    /// Achievement unlocked by this submission, if any.
    pub achievement: Option<Achievement>,
}

/// Identifier and text of a previously served question, kept for dedupe and
/// provider avoid-lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    /// Question identifier.
    pub id: Uuid,
    /// Question text.
    pub text: String,
}

/// Aggregated state for one trivia session.
///
/// All mutators are synchronous and cannot fail; question-scoped operations
/// are no-ops (returning `false`) when no eligible question is active.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Primary key of the session.
    pub session_id: Uuid,
    /// Opaque player identifier supplied at creation.
    pub player_id: String,
    /// Creation timestamp for auditing/debugging.
    pub created_at: SystemTime,
    /// Last time the session was mutated.
    pub updated_at: SystemTime,
    /// Gameplay configuration.
    pub config: GameConfig,
    /// Cumulative statistics.
    pub stats: GameStats,
    /// The active question, if one is installed.
    pub current_question: Option<CurrentQuestion>,
    /// Result of the most recent submission.
    pub last_result: Option<AnswerResult>,
    /// Questions already served this session, oldest first.
    pub question_history: Vec<QuestionRecord>,
    /// Last upstream failure surfaced to the UI, cleared on the next success.
    pub last_error: Option<String>,
}

impl GameSession {
    /// Build a fresh session with the provided identity and configuration.
    pub fn new(session_id: Uuid, player_id: String, config: GameConfig) -> Self {
        let timestamp = SystemTime::now();
        Self {
            session_id,
            player_id,
            created_at: timestamp,
            updated_at: timestamp,
            config,
            stats: GameStats::new(),
            current_question: None,
            last_result: None,
            question_history: Vec::new(),
            last_error: None,
        }
    }

    /// Install a new question, replacing any previous one. The countdown is
    /// primed from the configured time per question.
    pub fn install_question(&mut self, spec: QuestionSpec) {
        self.current_question = Some(CurrentQuestion {
            id: spec.id,
            text: spec.text,
            options: spec.options,
            correct_answer: spec.correct_answer,
            category: spec.category,
            difficulty: spec.difficulty,
            time_remaining: self.config.time_per_question_secs,
            selected_answer: None,
            started_at: SystemTime::now(),
            is_submitted: false,
            phase: QuestionPhase::Ready,
            explanation: spec.explanation,
        });
        self.last_error = None;
        self.touch();
    }

    /// Record the player's selected answer. No-op when no question is active
    /// or the question was already submitted.
    pub fn select_answer(&mut self, answer: AnswerLetter) -> bool {
        let Some(question) = self.current_question.as_mut() else {
            return false;
        };
        if question.is_submitted {
            return false;
        }

        question.selected_answer = Some(answer);
        question.phase = QuestionPhase::Answering;
        self.touch();
        true
    }

    /// Overwrite the remaining countdown on the active question. No-op when no
    /// unsubmitted question is active. Reaching zero does not auto-submit;
    /// callers observe `time_remaining == 0`.
    pub fn update_timer(&mut self, time_remaining: u32) -> bool {
        let Some(question) = self.current_question.as_mut() else {
            return false;
        };
        if question.is_submitted {
            return false;
        }

        question.time_remaining = time_remaining;
        true
    }

    /// Apply a graded submission: mark the question submitted, store the
    /// result, fold the outcome into the statistics, and append the question
    /// to the history. No-op when no question is active or it was already
    /// submitted (`is_submitted` is monotonic per question).
    pub fn apply_result(&mut self, result: AnswerResult) -> bool {
        let Some(question) = self.current_question.as_mut() else {
            return false;
        };
        if question.is_submitted {
            return false;
        }

        question.is_submitted = true;
        question.phase = QuestionPhase::Reviewing;
        self.question_history.push(QuestionRecord {
            id: question.id,
            text: question.text.clone(),
        });

        self.stats
            .apply_submission(result.is_correct, result.points_earned);
        self.last_result = Some(result);
        self.last_error = None;
        self.touch();
        true
    }

    /// Drop the active question when advancing to the next one.
    pub fn clear_question(&mut self) {
        self.current_question = None;
        self.touch();
    }

    /// Compute end-of-game totals from the wall clock.
    pub fn finalize(&mut self) {
        let now = SystemTime::now();
        self.stats.finalize(now);
        self.updated_at = now;
    }

    /// Return the session to its initial state, keeping identity and config.
    pub fn reset(&mut self) {
        self.stats = GameStats::new();
        self.current_question = None;
        self.last_result = None;
        self.question_history.clear();
        self.last_error = None;
        self.touch();
    }

    /// Record an upstream failure so the UI can offer a retry.
    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.touch();
    }

    /// Texts of previously served questions, for provider avoid-lists.
    pub fn served_texts(&self) -> Vec<String> {
        self.question_history
            .iter()
            .map(|record| record.text.clone())
            .collect()
    }

    /// Whether the configured question cap has been reached.
    pub fn question_cap_reached(&self) -> bool {
        self.config
            .max_questions
            .is_some_and(|max| self.stats.questions_answered >= max)
    }

    fn touch(&mut self) {
        self.updated_at = SystemTime::now();
    }
}

impl From<DifficultyEntity> for Difficulty {
    fn from(value: DifficultyEntity) -> Self {
        match value {
            DifficultyEntity::Easy => Difficulty::Easy,
            DifficultyEntity::Medium => Difficulty::Medium,
            DifficultyEntity::Hard => Difficulty::Hard,
        }
    }
}

impl From<Difficulty> for DifficultyEntity {
    fn from(value: Difficulty) -> Self {
        match value {
            Difficulty::Easy => DifficultyEntity::Easy,
            Difficulty::Medium => DifficultyEntity::Medium,
            Difficulty::Hard => DifficultyEntity::Hard,
        }
    }
}

impl From<AnswerLetterEntity> for AnswerLetter {
    fn from(value: AnswerLetterEntity) -> Self {
        match value {
            AnswerLetterEntity::A => AnswerLetter::A,
            AnswerLetterEntity::B => AnswerLetter::B,
            AnswerLetterEntity::C => AnswerLetter::C,
            AnswerLetterEntity::D => AnswerLetter::D,
        }
    }
}

impl From<AnswerLetter> for AnswerLetterEntity {
    fn from(value: AnswerLetter) -> Self {
        match value {
            AnswerLetter::A => AnswerLetterEntity::A,
            AnswerLetter::B => AnswerLetterEntity::B,
            AnswerLetter::C => AnswerLetterEntity::C,
            AnswerLetter::D => AnswerLetterEntity::D,
        }
    }
}

impl From<GameConfigEntity> for GameConfig {
    fn from(value: GameConfigEntity) -> Self {
        Self {
            difficulty: value.difficulty.into(),
            category: value.category,
            time_per_question_secs: value.time_per_question_secs,
            max_questions: value.max_questions,
            enable_explanations: value.enable_explanations,
            auto_advance: value.auto_advance,
            auto_advance_delay_secs: value.auto_advance_delay_secs,
        }
    }
}

impl From<GameConfig> for GameConfigEntity {
    fn from(value: GameConfig) -> Self {
        Self {
            difficulty: value.difficulty.into(),
            category: value.category,
            time_per_question_secs: value.time_per_question_secs,
            max_questions: value.max_questions,
            enable_explanations: value.enable_explanations,
            auto_advance: value.auto_advance,
            auto_advance_delay_secs: value.auto_advance_delay_secs,
        }
    }
}

impl From<GameStatsEntity> for GameStats {
    fn from(value: GameStatsEntity) -> Self {
        Self {
            questions_answered: value.questions_answered,
            correct_answers: value.correct_answers,
            current_streak: value.current_streak,
            max_streak: value.max_streak,
            total_score: value.total_score,
            points_this_session: value.points_this_session,
            total_time_played_secs: value.total_time_played_secs,
            average_time_per_question_secs: value.average_time_per_question_secs,
            accuracy: value.accuracy,
            started_at: value.started_at,
        }
    }
}

impl From<GameStats> for GameStatsEntity {
    fn from(value: GameStats) -> Self {
        Self {
            questions_answered: value.questions_answered,
            correct_answers: value.correct_answers,
            current_streak: value.current_streak,
            max_streak: value.max_streak,
            total_score: value.total_score,
            points_this_session: value.points_this_session,
            total_time_played_secs: value.total_time_played_secs,
            average_time_per_question_secs: value.average_time_per_question_secs,
            accuracy: value.accuracy,
            started_at: value.started_at,
        }
    }
}

impl From<QuestionRecordEntity> for QuestionRecord {
    fn from(value: QuestionRecordEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
        }
    }
}

impl From<QuestionRecord> for QuestionRecordEntity {
    fn from(value: QuestionRecord) -> Self {
        Self {
            id: value.id,
            text: value.text,
        }
    }
}

impl From<GamePhaseEntity> for GamePhase {
    fn from(value: GamePhaseEntity) -> Self {
        match value {
            GamePhaseEntity::Idle => GamePhase::Idle,
            GamePhaseEntity::Starting => GamePhase::Starting,
            GamePhaseEntity::Playing => GamePhase::Playing,
            GamePhaseEntity::Paused => GamePhase::Paused,
            GamePhaseEntity::Ended => GamePhase::Ended,
        }
    }
}

impl From<GamePhase> for GamePhaseEntity {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Idle => GamePhaseEntity::Idle,
            GamePhase::Starting => GamePhaseEntity::Starting,
            GamePhase::Playing => GamePhaseEntity::Playing,
            GamePhase::Paused => GamePhaseEntity::Paused,
            GamePhase::Ended => GamePhaseEntity::Ended,
        }
    }
}

impl From<(&GameSession, GamePhase)> for SessionEntity {
    fn from((session, phase): (&GameSession, GamePhase)) -> Self {
        Self {
            id: session.session_id,
            player_id: session.player_id.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            phase: phase.into(),
            config: session.config.clone().into(),
            stats: session.stats.clone().into(),
            question_history: session
                .question_history
                .iter()
                .cloned()
                .map(Into::into)
                .collect(),
        }
    }
}

impl From<(SessionEntity, GamePhase)> for GameSession {
    fn from((entity, _phase): (SessionEntity, GamePhase)) -> Self {
        Self {
            session_id: entity.id,
            player_id: entity.player_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            config: entity.config.into(),
            stats: entity.stats.into(),
            current_question: None,
            last_result: None,
            question_history: entity
                .question_history
                .into_iter()
                .map(Into::into)
                .collect(),
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(difficulty: Difficulty) -> QuestionSpec {
        QuestionSpec {
            id: Uuid::new_v4(),
            text: "Which planet is known as the red planet?".into(),
            options: vec![
                "Venus".into(),
                "Mars".into(),
                "Jupiter".into(),
                "Mercury".into(),
            ],
            correct_answer: AnswerLetter::B,
            category: "science".into(),
            difficulty,
            explanation: None,
        }
    }

    fn correct_result(points: u32) -> AnswerResult {
        AnswerResult {
            is_correct: true,
            points_earned: points,
            correct_answer: AnswerLetter::B,
            selected_answer: Some(AnswerLetter::B),
            time_taken_secs: 5,
            explanation: None,
            streak_broken: false,
            achievement: None,
        }
    }

    fn incorrect_result() -> AnswerResult {
        AnswerResult {
            is_correct: false,
            points_earned: 0,
            correct_answer: AnswerLetter::B,
            selected_answer: Some(AnswerLetter::A),
            time_taken_secs: 5,
            explanation: None,
            streak_broken: false,
            achievement: None,
        }
    }

    fn session() -> GameSession {
        GameSession::new(
            Uuid::new_v4(),
            "p1".into(),
            GameConfig {
                difficulty: Difficulty::Hard,
                ..GameConfig::default()
            },
        )
    }

    #[test]
    fn hard_correct_submission_updates_stats() {
        let mut session = session();
        session.install_question(question(Difficulty::Hard));
        assert!(session.select_answer(AnswerLetter::B));
        assert!(session.apply_result(correct_result(30)));

        let stats = &session.stats;
        assert_eq!(stats.questions_answered, 1);
        assert_eq!(stats.correct_answers, 1);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.max_streak, 1);
        assert_eq!(stats.total_score, 30);
        assert_eq!(stats.accuracy, 100.0);
        assert_eq!(session.question_history.len(), 1);
    }

    #[test]
    fn incorrect_submissions_keep_streak_at_zero() {
        let mut session = session();

        session.install_question(question(Difficulty::Hard));
        session.apply_result(correct_result(30));
        session.install_question(question(Difficulty::Hard));
        session.apply_result(incorrect_result());

        assert_eq!(session.stats.current_streak, 0);
        assert_eq!(session.stats.max_streak, 1);

        session.install_question(question(Difficulty::Hard));
        session.apply_result(incorrect_result());

        assert_eq!(session.stats.current_streak, 0);
        assert_eq!(session.stats.max_streak, 1);
        assert!((session.stats.accuracy - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn streak_never_exceeds_max_streak() {
        let mut session = session();
        for round in 0..10 {
            session.install_question(question(Difficulty::Easy));
            if round % 3 == 2 {
                session.apply_result(incorrect_result());
            } else {
                session.apply_result(correct_result(10));
            }
            assert!(session.stats.current_streak <= session.stats.max_streak);
            assert!(session.stats.correct_answers <= session.stats.questions_answered);
            assert!((0.0..=100.0).contains(&session.stats.accuracy));
        }
    }

    #[test]
    fn question_cannot_be_submitted_twice() {
        let mut session = session();
        session.install_question(question(Difficulty::Medium));
        assert!(session.apply_result(correct_result(20)));
        assert!(!session.apply_result(correct_result(20)));
        assert_eq!(session.stats.questions_answered, 1);
        assert_eq!(session.stats.total_score, 20);
    }

    #[test]
    fn question_scoped_mutators_are_noops_without_a_question() {
        let mut session = session();
        assert!(!session.select_answer(AnswerLetter::A));
        assert!(!session.update_timer(10));
        assert!(!session.apply_result(correct_result(10)));
        assert!(session.last_result.is_none());
    }

    #[test]
    fn select_after_submit_is_a_noop() {
        let mut session = session();
        session.install_question(question(Difficulty::Easy));
        session.apply_result(correct_result(10));
        assert!(!session.select_answer(AnswerLetter::C));

        let question = session.current_question.as_ref().unwrap();
        assert_eq!(question.phase, QuestionPhase::Reviewing);
        assert_eq!(question.selected_answer, None);
    }

    #[test]
    fn reset_restores_defaults_and_clears_question() {
        let mut session = session();
        session.install_question(question(Difficulty::Hard));
        session.apply_result(correct_result(30));
        session.record_error("upstream hiccup".into());

        session.reset();

        assert!(session.current_question.is_none());
        assert!(session.last_result.is_none());
        assert!(session.question_history.is_empty());
        assert!(session.last_error.is_none());
        assert_eq!(session.stats.questions_answered, 0);
        assert_eq!(session.stats.total_score, 0);
    }

    #[test]
    fn config_merge_is_shallow() {
        let mut config = GameConfig::default();
        config.merge(ConfigPatch {
            difficulty: Some(Difficulty::Hard),
            max_questions: Some(Some(10)),
            ..ConfigPatch::default()
        });

        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.max_questions, Some(10));
        // Untouched fields keep their previous values.
        assert_eq!(config.category, "general");
        assert_eq!(config.time_per_question_secs, 30);
    }

    #[test]
    fn install_question_primes_countdown_from_config() {
        let mut session = session();
        session.config.time_per_question_secs = 45;
        session.install_question(question(Difficulty::Easy));

        let question = session.current_question.as_ref().unwrap();
        assert_eq!(question.time_remaining, 45);
        assert!(!question.is_submitted);
        assert_eq!(question.phase, QuestionPhase::Ready);
    }

    #[test]
    fn finalize_computes_average_time() {
        let mut session = session();
        session.install_question(question(Difficulty::Easy));
        session.apply_result(correct_result(10));
        session.finalize();
        assert!(session.stats.average_time_per_question_secs >= 0.0);
    }
}
