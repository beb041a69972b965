//! LLM-backed question provider speaking the OpenAI-style chat-completions
//! protocol. The model is asked for strict JSON which is parsed and validated
//! before it is allowed into the core.

use std::{env, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    GeneratedQuestion, ProviderError, ProviderResult, QuestionProvider, QuestionRequest,
};
use crate::state::session::AnswerLetter;

const BASE_URL_ENV: &str = "TRIVIA_LLM_BASE_URL";
const API_KEY_ENV: &str = "TRIVIA_LLM_API_KEY";
const MODEL_ENV: &str = "TRIVIA_LLM_MODEL";
const TIMEOUT_ENV: &str = "TRIVIA_LLM_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SYSTEM_PROMPT: &str = "You are a trivia question writer. Reply with a single JSON object \
and nothing else, using this shape: {\"question\": string, \"options\": [string, string, string, \
string], \"correct_answer\": \"A\"|\"B\"|\"C\"|\"D\", \"explanation\": string}. The options must \
contain exactly one correct answer.";

/// Connection settings for the upstream generator, read from the environment.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the chat-completions API.
    pub base_url: String,
    /// Bearer token for the API.
    pub api_key: String,
    /// Model identifier requested for generation.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl LlmConfig {
    /// Build a configuration from the environment. Returns `None` when no API
    /// key is set, in which case the backend runs on the fallback bank alone.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty())?;
        let base_url = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.into());
        let timeout = env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Some(Self {
            base_url,
            api_key,
            model,
            timeout,
        })
    }
}

/// Question provider backed by a hosted chat-completions model.
#[derive(Clone)]
pub struct LlmQuestionProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmQuestionProvider {
    /// Build the HTTP client with the configured request timeout.
    pub fn new(config: LlmConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ProviderError::Http { source })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            model: config.model,
        })
    }

    fn user_prompt(request: &QuestionRequest) -> String {
        let difficulty = match request.difficulty {
            crate::state::session::Difficulty::Easy => "easy",
            crate::state::session::Difficulty::Medium => "medium",
            crate::state::session::Difficulty::Hard => "hard",
        };
        let category = request.category.as_deref().unwrap_or("general knowledge");

        let mut prompt =
            format!("Write one {difficulty} multiple-choice trivia question about {category}.");
        if !request.avoid_texts.is_empty() {
            prompt.push_str("\nDo not repeat any of these questions:\n");
            for text in &request.avoid_texts {
                prompt.push_str("- ");
                prompt.push_str(text);
                prompt.push('\n');
            }
        }
        prompt
    }

    async fn request_question(
        client: Client,
        base_url: String,
        api_key: String,
        model: String,
        request: QuestionRequest,
    ) -> ProviderResult<GeneratedQuestion> {
        let body = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(&request),
                },
            ],
            temperature: 0.8,
        };

        let response = client
            .post(format!("{base_url}/chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Http { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status { status });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|source| ProviderError::Http { source })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::MalformedPayload {
                reason: "completion contained no choices".into(),
            })?;

        debug!(session_id = %request.session_id, "received question completion");

        let raw = parse_question_payload(&content)?;
        let question = GeneratedQuestion {
            text: raw.question,
            options: raw.options,
            correct_answer: raw.correct_answer.parse_letter()?,
            category: request
                .category
                .unwrap_or_else(|| "general".into()),
            difficulty: request.difficulty,
            explanation: raw.explanation,
        };
        question.validate()?;
        Ok(question)
    }
}

impl QuestionProvider for LlmQuestionProvider {
    fn generate(
        &self,
        request: QuestionRequest,
    ) -> BoxFuture<'static, ProviderResult<GeneratedQuestion>> {
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        Box::pin(Self::request_question(
            client, base_url, api_key, model, request,
        ))
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RawQuestionPayload {
    question: String,
    options: Vec<String>,
    correct_answer: RawLetter,
    #[serde(default)]
    explanation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawLetter(String);

impl RawLetter {
    fn parse_letter(&self) -> ProviderResult<AnswerLetter> {
        match self.0.trim() {
            "A" | "a" => Ok(AnswerLetter::A),
            "B" | "b" => Ok(AnswerLetter::B),
            "C" | "c" => Ok(AnswerLetter::C),
            "D" | "d" => Ok(AnswerLetter::D),
            other => Err(ProviderError::MalformedPayload {
                reason: format!("correct_answer `{other}` is not one of A-D"),
            }),
        }
    }
}

/// Extract the JSON object from the completion text, tolerating Markdown code
/// fences some models insist on adding.
fn parse_question_payload(content: &str) -> ProviderResult<RawQuestionPayload> {
    let trimmed = content.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(stripped).map_err(|err| ProviderError::MalformedPayload {
        reason: format!("completion is not valid question JSON: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::Difficulty;
    use uuid::Uuid;

    #[test]
    fn payload_parses_plain_json() {
        let payload = parse_question_payload(
            r#"{"question":"Q?","options":["a","b","c","d"],"correct_answer":"B","explanation":"because"}"#,
        )
        .unwrap();
        assert_eq!(payload.question, "Q?");
        assert_eq!(payload.options.len(), 4);
        assert!(matches!(
            payload.correct_answer.parse_letter().unwrap(),
            AnswerLetter::B
        ));
    }

    #[test]
    fn payload_parses_fenced_json() {
        let fenced = "```json\n{\"question\":\"Q?\",\"options\":[\"a\",\"b\",\"c\",\"d\"],\"correct_answer\":\"d\"}\n```";
        let payload = parse_question_payload(fenced).unwrap();
        assert!(matches!(
            payload.correct_answer.parse_letter().unwrap(),
            AnswerLetter::D
        ));
    }

    #[test]
    fn invalid_letter_is_rejected() {
        let payload = parse_question_payload(
            r#"{"question":"Q?","options":["a","b","c","d"],"correct_answer":"E"}"#,
        )
        .unwrap();
        assert!(payload.correct_answer.parse_letter().is_err());
    }

    #[test]
    fn prose_payload_is_rejected() {
        assert!(parse_question_payload("Here is your question: what is 2+2?").is_err());
    }

    #[test]
    fn user_prompt_carries_avoid_list() {
        let prompt = LlmQuestionProvider::user_prompt(&QuestionRequest {
            session_id: Uuid::new_v4(),
            category: Some("history".into()),
            difficulty: Difficulty::Hard,
            avoid_texts: vec!["Old question?".into()],
        });
        assert!(prompt.contains("hard"));
        assert!(prompt.contains("history"));
        assert!(prompt.contains("Old question?"));
    }
}
