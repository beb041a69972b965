//! DTO definitions for the question flow (serving, selecting, submitting).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::session::{
    Achievement, AnswerLetter, AnswerResult, CurrentQuestion, Difficulty, QuestionPhase,
};

/// Projection of the active question sent to clients.
///
/// The correct answer and the explanation are deliberately absent; both are
/// only revealed through [`AnswerResultView`] after submission.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct QuestionView {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Question text shown to the player.
    pub text: String,
    /// The four candidate answers, in display order.
    pub options: Vec<String>,
    /// Category the question belongs to.
    pub category: String,
    /// Difficulty the question was generated at.
    pub difficulty: Difficulty,
    /// Seconds left on the countdown.
    pub time_remaining: u32,
    /// Answer currently selected by the player, if any.
    pub selected_answer: Option<AnswerLetter>,
    /// Whether the answer has been submitted.
    pub is_submitted: bool,
    /// Sub-state of the question flow.
    pub phase: QuestionPhase,
}

impl From<&CurrentQuestion> for QuestionView {
    fn from(question: &CurrentQuestion) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            options: question.options.clone(),
            category: question.category.clone(),
            difficulty: question.difficulty,
            time_remaining: question.time_remaining,
            selected_answer: question.selected_answer,
            is_submitted: question.is_submitted,
            phase: question.phase,
        }
    }
}

/// Request to record the player's currently selected answer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectAnswerRequest {
    /// Letter of the option being selected.
    pub answer: AnswerLetter,
}

/// Request to submit the answer for grading.
///
/// When `answer` is present it overrides any previously selected letter;
/// omitting it submits the current selection (or no answer at all, which
/// grades as incorrect).
#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct SubmitAnswerRequest {
    /// Optional letter submitted directly, bypassing a prior selection.
    #[serde(default)]
    pub answer: Option<AnswerLetter>,
}

/// Graded outcome of a submission, revealing the correct answer.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct AnswerResultView {
    /// Whether the submitted answer was correct.
    pub is_correct: bool,
    /// Points awarded for the submission.
    pub points_earned: u32,
    /// Letter of the correct option.
    pub correct_answer: AnswerLetter,
    /// Letter the player submitted, if any.
    pub selected_answer: Option<AnswerLetter>,
    /// Seconds spent on the question, floored at one.
    pub time_taken_secs: u32,
    /// Explanation for the correct answer, when enabled and available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Whether this submission ended a running streak.
    pub streak_broken: bool,
    /// Achievement unlocked by this submission, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement: Option<Achievement>,
}

impl From<&AnswerResult> for AnswerResultView {
    fn from(result: &AnswerResult) -> Self {
        Self {
            is_correct: result.is_correct,
            points_earned: result.points_earned,
            correct_answer: result.correct_answer,
            selected_answer: result.selected_answer,
            time_taken_secs: result.time_taken_secs,
            explanation: result.explanation.clone(),
            streak_broken: result.streak_broken,
            achievement: result.achievement.clone(),
        }
    }
}
