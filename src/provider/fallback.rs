//! Built-in question bank consulted whenever the upstream generator fails,
//! returns something unusable, or is not configured at all.

use rand::prelude::IndexedRandom;
use rand::rng;

use super::{GeneratedQuestion, QuestionRequest};
use crate::config::FallbackQuestion;

/// Draw a fallback question matching the request as closely as possible.
///
/// Candidates are filtered against the avoid-list first. Among the remaining
/// questions the match preference is category + difficulty, then difficulty
/// alone, then anything left; `None` only when every bank question was
/// already served.
pub fn draw(bank: &[FallbackQuestion], request: &QuestionRequest) -> Option<GeneratedQuestion> {
    let fresh: Vec<&FallbackQuestion> = bank
        .iter()
        .filter(|question| !request.avoid_texts.contains(&question.text))
        .collect();

    if fresh.is_empty() {
        return None;
    }

    let category_match: Vec<&FallbackQuestion> = fresh
        .iter()
        .copied()
        .filter(|question| {
            question.difficulty == request.difficulty
                && request
                    .category
                    .as_deref()
                    .is_none_or(|category| question.category.eq_ignore_ascii_case(category))
        })
        .collect();

    let difficulty_match: Vec<&FallbackQuestion> = fresh
        .iter()
        .copied()
        .filter(|question| question.difficulty == request.difficulty)
        .collect();

    let mut rng = rng();
    let chosen: &FallbackQuestion = if let Some(question) = category_match.choose(&mut rng) {
        *question
    } else if let Some(question) = difficulty_match.choose(&mut rng) {
        *question
    } else {
        fresh
            .choose(&mut rng)
            .copied()
            .expect("fresh candidates checked non-empty above")
    };

    Some(GeneratedQuestion {
        text: chosen.text.clone(),
        options: chosen.options.clone(),
        correct_answer: chosen.correct_answer,
        category: chosen.category.clone(),
        difficulty: chosen.difficulty,
        explanation: chosen.explanation.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::{AnswerLetter, Difficulty};
    use uuid::Uuid;

    fn bank_question(text: &str, category: &str, difficulty: Difficulty) -> FallbackQuestion {
        FallbackQuestion {
            text: text.into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: AnswerLetter::A,
            category: category.into(),
            difficulty,
            explanation: None,
        }
    }

    fn request(category: Option<&str>, difficulty: Difficulty, avoid: &[&str]) -> QuestionRequest {
        QuestionRequest {
            session_id: Uuid::new_v4(),
            category: category.map(Into::into),
            difficulty,
            avoid_texts: avoid.iter().map(|text| text.to_string()).collect(),
        }
    }

    #[test]
    fn prefers_matching_category_and_difficulty() {
        let bank = vec![
            bank_question("q1", "science", Difficulty::Easy),
            bank_question("q2", "history", Difficulty::Easy),
        ];
        let drawn = draw(&bank, &request(Some("history"), Difficulty::Easy, &[])).unwrap();
        assert_eq!(drawn.text, "q2");
    }

    #[test]
    fn falls_back_to_difficulty_then_anything() {
        let bank = vec![
            bank_question("q1", "science", Difficulty::Easy),
            bank_question("q2", "science", Difficulty::Hard),
        ];

        let by_difficulty = draw(&bank, &request(Some("sports"), Difficulty::Hard, &[])).unwrap();
        assert_eq!(by_difficulty.text, "q2");

        let anything = draw(&bank, &request(Some("sports"), Difficulty::Medium, &[])).unwrap();
        assert!(anything.text == "q1" || anything.text == "q2");
    }

    #[test]
    fn avoid_list_excludes_served_questions() {
        let bank = vec![
            bank_question("q1", "science", Difficulty::Easy),
            bank_question("q2", "science", Difficulty::Easy),
        ];
        let drawn = draw(&bank, &request(None, Difficulty::Easy, &["q1"])).unwrap();
        assert_eq!(drawn.text, "q2");
    }

    #[test]
    fn exhausted_bank_yields_none() {
        let bank = vec![bank_question("q1", "science", Difficulty::Easy)];
        assert!(draw(&bank, &request(None, Difficulty::Easy, &["q1"])).is_none());
    }
}
