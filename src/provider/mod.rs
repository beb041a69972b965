//! Question generation collaborators: the LLM-backed upstream provider and
//! the built-in fallback bank. External responses are validated here at the
//! boundary before anything enters the core.

pub mod fallback;
pub mod llm;

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::state::session::{AnswerLetter, Difficulty, OPTIONS_PER_QUESTION};

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error raised by a question provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The HTTP request to the upstream generator failed.
    #[error("upstream request failed: {source}")]
    Http {
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The upstream generator answered with an unexpected status.
    #[error("upstream returned status {status}")]
    Status {
        /// HTTP status received.
        status: reqwest::StatusCode,
    },
    /// The upstream payload could not be interpreted as a question.
    #[error("malformed upstream payload: {reason}")]
    MalformedPayload {
        /// Human-readable description of the defect.
        reason: String,
    },
    /// No provider is configured and the fallback bank has no candidate left.
    #[error("no question available for this request")]
    Exhausted,
}

/// Request passed to a question provider.
#[derive(Debug, Clone)]
pub struct QuestionRequest {
    /// Session the question is generated for.
    pub session_id: Uuid,
    /// Requested category, when the session pinned one.
    pub category: Option<String>,
    /// Requested difficulty.
    pub difficulty: Difficulty,
    /// Texts of questions already served; best-effort avoid-list.
    pub avoid_texts: Vec<String>,
}

/// A question produced by a provider, validated at the boundary.
#[derive(Debug, Clone)]
pub struct GeneratedQuestion {
    /// Question text.
    pub text: String,
    /// The four candidate answers, in display order.
    pub options: Vec<String>,
    /// Letter of the correct option.
    pub correct_answer: AnswerLetter,
    /// Category the question belongs to.
    pub category: String,
    /// Difficulty the question was generated at.
    pub difficulty: Difficulty,
    /// Optional explanation of the correct answer.
    pub explanation: Option<String>,
}

impl GeneratedQuestion {
    /// Reject questions that do not meet the structural contract.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.text.trim().is_empty() {
            return Err(ProviderError::MalformedPayload {
                reason: "question text is empty".into(),
            });
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(ProviderError::MalformedPayload {
                reason: format!(
                    "expected {OPTIONS_PER_QUESTION} options, got {}",
                    self.options.len()
                ),
            });
        }
        if self.options.iter().any(|option| option.trim().is_empty()) {
            return Err(ProviderError::MalformedPayload {
                reason: "one or more options are empty".into(),
            });
        }
        Ok(())
    }
}

/// Abstraction over the upstream question generation operation.
pub trait QuestionProvider: Send + Sync {
    /// Generate one question for the given request.
    fn generate(&self, request: QuestionRequest) -> BoxFuture<'static, ProviderResult<GeneratedQuestion>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_question() -> GeneratedQuestion {
        GeneratedQuestion {
            text: "What is 2 + 2?".into(),
            options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
            correct_answer: AnswerLetter::B,
            category: "general".into(),
            difficulty: Difficulty::Easy,
            explanation: None,
        }
    }

    #[test]
    fn valid_question_passes_validation() {
        assert!(valid_question().validate().is_ok());
    }

    #[test]
    fn wrong_option_count_is_rejected() {
        let mut question = valid_question();
        question.options.pop();
        assert!(matches!(
            question.validate(),
            Err(ProviderError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn empty_text_is_rejected() {
        let mut question = valid_question();
        question.text = "   ".into();
        assert!(question.validate().is_err());
    }

    #[test]
    fn empty_option_is_rejected() {
        let mut question = valid_question();
        question.options[2] = String::new();
        assert!(question.validate().is_err());
    }
}
