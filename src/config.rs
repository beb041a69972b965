//! Application-level configuration loading, including the built-in fallback
//! question bank used when the upstream generator is unavailable.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::session::{AnswerLetter, Difficulty, OPTIONS_PER_QUESTION};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_BACK_CONFIG_PATH";

/// A question from the baked-in or configured fallback bank.
#[derive(Debug, Clone)]
pub struct FallbackQuestion {
    /// Question text.
    pub text: String,
    /// The four candidate answers.
    pub options: Vec<String>,
    /// Letter of the correct option.
    pub correct_answer: AnswerLetter,
    /// Category the question belongs to.
    pub category: String,
    /// Difficulty of the question.
    pub difficulty: Difficulty,
    /// Optional explanation surfaced after submission.
    pub explanation: Option<String>,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    fallback_questions: Vec<FallbackQuestion>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in question bank.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        count = app_config.fallback_questions.len(),
                        "loaded fallback question bank from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Questions served when the upstream generator fails or is unconfigured.
    pub fn fallback_questions(&self) -> &[FallbackQuestion] {
        &self.fallback_questions
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fallback_questions: default_question_bank(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    questions: Vec<RawQuestion>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let fallback_questions = value
            .questions
            .into_iter()
            .filter_map(|raw| {
                if raw.options.len() != OPTIONS_PER_QUESTION {
                    warn!(
                        text = %raw.text,
                        count = raw.options.len(),
                        "skipping configured question without exactly four options"
                    );
                    return None;
                }
                Some(raw.into())
            })
            .collect::<Vec<_>>();

        if fallback_questions.is_empty() {
            warn!("configured question bank is empty; restoring built-in defaults");
            return Self::default();
        }

        Self { fallback_questions }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single fallback question in the configuration file.
struct RawQuestion {
    text: String,
    options: Vec<String>,
    correct_answer: AnswerLetter,
    category: String,
    difficulty: Difficulty,
    #[serde(default)]
    explanation: Option<String>,
}

impl From<RawQuestion> for FallbackQuestion {
    fn from(value: RawQuestion) -> Self {
        Self {
            text: value.text,
            options: value.options,
            correct_answer: value.correct_answer,
            category: value.category,
            difficulty: value.difficulty,
            explanation: value.explanation,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn question(
    text: &str,
    options: [&str; OPTIONS_PER_QUESTION],
    correct_answer: AnswerLetter,
    category: &str,
    difficulty: Difficulty,
    explanation: &str,
) -> FallbackQuestion {
    FallbackQuestion {
        text: text.into(),
        options: options.into_iter().map(Into::into).collect(),
        correct_answer,
        category: category.into(),
        difficulty,
        explanation: Some(explanation.into()),
    }
}

/// Built-in question bank shipped with the binary.
fn default_question_bank() -> Vec<FallbackQuestion> {
    vec![
        question(
            "Which planet in our solar system has the most moons?",
            ["Jupiter", "Saturn", "Neptune", "Uranus"],
            AnswerLetter::B,
            "science",
            Difficulty::Medium,
            "Saturn overtook Jupiter after dozens of small irregular moons were confirmed.",
        ),
        question(
            "What is the chemical symbol for gold?",
            ["Go", "Gd", "Au", "Ag"],
            AnswerLetter::C,
            "science",
            Difficulty::Easy,
            "Au comes from aurum, the Latin word for gold.",
        ),
        question(
            "Which gas makes up most of Earth's atmosphere?",
            ["Oxygen", "Carbon dioxide", "Hydrogen", "Nitrogen"],
            AnswerLetter::D,
            "science",
            Difficulty::Easy,
            "Nitrogen accounts for roughly 78% of the atmosphere by volume.",
        ),
        question(
            "In which year did the Berlin Wall fall?",
            ["1987", "1989", "1991", "1993"],
            AnswerLetter::B,
            "history",
            Difficulty::Medium,
            "The wall was opened on 9 November 1989.",
        ),
        question(
            "Who was the first emperor of Rome?",
            ["Julius Caesar", "Nero", "Augustus", "Constantine"],
            AnswerLetter::C,
            "history",
            Difficulty::Medium,
            "Octavian took the title Augustus in 27 BC, marking the start of the empire.",
        ),
        question(
            "Which treaty ended the First World War with Germany?",
            [
                "Treaty of Versailles",
                "Treaty of Trianon",
                "Treaty of Brest-Litovsk",
                "Treaty of Saint-Germain",
            ],
            AnswerLetter::A,
            "history",
            Difficulty::Hard,
            "The Treaty of Versailles was signed on 28 June 1919.",
        ),
        question(
            "What is the longest river in the world by most measurements?",
            ["Amazon", "Yangtze", "Nile", "Mississippi"],
            AnswerLetter::C,
            "geography",
            Difficulty::Easy,
            "The Nile runs about 6,650 km from its farthest headstream to the Mediterranean.",
        ),
        question(
            "Which country has the most time zones, including overseas territories?",
            ["Russia", "United States", "France", "China"],
            AnswerLetter::C,
            "geography",
            Difficulty::Hard,
            "France spans twelve time zones thanks to its overseas territories.",
        ),
        question(
            "Which city hosted the first modern Olympic Games in 1896?",
            ["Paris", "Athens", "London", "Rome"],
            AnswerLetter::B,
            "sports",
            Difficulty::Easy,
            "The first modern games were held in Athens, honouring their ancient origin.",
        ),
        question(
            "How many players from one team are on a volleyball court at a time?",
            ["Five", "Six", "Seven", "Eight"],
            AnswerLetter::B,
            "sports",
            Difficulty::Easy,
            "Indoor volleyball is played six against six.",
        ),
        question(
            "Who painted 'The Starry Night'?",
            ["Claude Monet", "Vincent van Gogh", "Paul Cézanne", "Edvard Munch"],
            AnswerLetter::B,
            "arts",
            Difficulty::Easy,
            "Van Gogh painted it in 1889 from his asylum room in Saint-Rémy.",
        ),
        question(
            "Which composer wrote the opera 'The Magic Flute'?",
            ["Beethoven", "Haydn", "Mozart", "Wagner"],
            AnswerLetter::C,
            "arts",
            Difficulty::Medium,
            "Mozart premiered Die Zauberflöte in Vienna in 1791, months before his death.",
        ),
        question(
            "In computing, what does 'CPU' stand for?",
            [
                "Central Processing Unit",
                "Computer Power Unit",
                "Central Program Utility",
                "Core Processing Unit",
            ],
            AnswerLetter::A,
            "general",
            Difficulty::Easy,
            "The CPU executes the instructions of a computer program.",
        ),
        question(
            "Which element has the atomic number 1?",
            ["Helium", "Hydrogen", "Lithium", "Oxygen"],
            AnswerLetter::B,
            "science",
            Difficulty::Easy,
            "Hydrogen, with a single proton, is the lightest element.",
        ),
        question(
            "What is the smallest prime number greater than 100?",
            ["101", "103", "107", "109"],
            AnswerLetter::A,
            "general",
            Difficulty::Hard,
            "101 is prime; 100 is divisible by 2 and 5.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_bank_is_well_formed() {
        let bank = default_question_bank();
        assert!(!bank.is_empty());
        for question in &bank {
            assert_eq!(question.options.len(), OPTIONS_PER_QUESTION);
            assert!(!question.text.trim().is_empty());
            assert!(question.correct_answer.index() < question.options.len());
        }
    }

    #[test]
    fn raw_config_with_bad_entries_keeps_valid_ones() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "questions": [
                    {
                        "text": "Too few options",
                        "options": ["a", "b"],
                        "correct_answer": "A",
                        "category": "general",
                        "difficulty": "easy"
                    },
                    {
                        "text": "Valid",
                        "options": ["a", "b", "c", "d"],
                        "correct_answer": "C",
                        "category": "general",
                        "difficulty": "medium"
                    }
                ]
            }"#,
        )
        .unwrap();

        let config: AppConfig = raw.into();
        assert_eq!(config.fallback_questions().len(), 1);
        assert_eq!(config.fallback_questions()[0].text, "Valid");
    }

    #[test]
    fn empty_configured_bank_restores_defaults() {
        let raw = RawConfig { questions: vec![] };
        let config: AppConfig = raw.into();
        assert!(!config.fallback_questions().is_empty());
    }
}
