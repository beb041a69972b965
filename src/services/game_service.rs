//! Core gameplay flow: lifecycle transitions, question generation and
//! serving, answer selection, and submission grading.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        question::{AnswerResultView, QuestionView, SelectAnswerRequest, SubmitAnswerRequest},
        session::{SessionSummary, StatsSummary},
    },
    error::ServiceError,
    provider::{GeneratedQuestion, ProviderError, QuestionRequest, fallback},
    services::{achievements, scoring, session_service, sse_events},
    state::{
        SessionSlot, SharedState,
        session::{AnswerResult, Difficulty, GameSession, QuestionSpec},
        state_machine::{GameEvent, GamePhase},
        transitions::run_transition_with_broadcast,
    },
};

/// Start a new game on an idle session and serve the first question.
///
/// The session moves through `starting` into `playing`; the first question is
/// generated outside the transition so a slow upstream never blocks the
/// lifecycle. A generation failure leaves the session playing with
/// `last_error` set, and the client retries through the question endpoint.
pub async fn start_game(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
) -> Result<SessionSummary, ServiceError> {
    run_transition_with_broadcast(state, slot, GameEvent::Initialize, || async {
        slot.with_session_mut(|session| session.reset()).await;
        Ok(())
    })
    .await?;

    run_transition_with_broadcast(state, slot, GameEvent::Begin, || async { Ok(()) }).await?;

    session_service::persist_session(state, slot).await;
    info!(session_id = %slot.session_id(), "game started");

    if let Err(err) = next_question(state, slot).await {
        warn!(
            session_id = %slot.session_id(),
            error = %err,
            "failed to serve the first question"
        );
    }

    Ok(session_service::summary(slot).await)
}

/// Suspend gameplay, freezing the countdown. A no-op outside `playing`.
pub async fn pause_game(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
) -> Result<SessionSummary, ServiceError> {
    if slot.phase().await != GamePhase::Playing {
        return Ok(session_service::summary(slot).await);
    }

    run_transition_with_broadcast(state, slot, GameEvent::Pause, || async {
        slot.stop_timer().await;
        Ok(())
    })
    .await?;

    session_service::persist_session(state, slot).await;
    Ok(session_service::summary(slot).await)
}

/// Resume gameplay from a pause, restarting the countdown when an
/// unsubmitted question still has time left.
pub async fn resume_game(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
) -> Result<SessionSummary, ServiceError> {
    run_transition_with_broadcast(state, slot, GameEvent::Resume, || async { Ok(()) }).await?;

    let resume_countdown = slot
        .read_session(|session| {
            session
                .current_question
                .as_ref()
                .is_some_and(|question| !question.is_submitted && question.time_remaining > 0)
        })
        .await;
    if resume_countdown {
        slot.start_timer().await;
    }

    session_service::persist_session(state, slot).await;
    Ok(session_service::summary(slot).await)
}

/// Finish the game, computing final statistics.
pub async fn end_game(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
) -> Result<SessionSummary, ServiceError> {
    run_transition_with_broadcast(state, slot, GameEvent::End, || async {
        slot.stop_timer().await;
        slot.with_session_mut(|session| session.finalize()).await;
        Ok(())
    })
    .await?;

    session_service::persist_session(state, slot).await;
    sse_events::broadcast_scoreboard(state, session_service::resident_entries(state).await);
    info!(session_id = %slot.session_id(), "game ended");
    Ok(session_service::summary(slot).await)
}

/// Discard all progress and return the session to idle; valid from any phase.
pub async fn reset_game(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
) -> Result<SessionSummary, ServiceError> {
    run_transition_with_broadcast(state, slot, GameEvent::Reset, || async {
        slot.stop_timer().await;
        slot.with_session_mut(|session| session.reset()).await;
        Ok(())
    })
    .await?;

    session_service::persist_session(state, slot).await;
    Ok(session_service::summary(slot).await)
}

/// Generate and install the next question, start its countdown, and announce
/// it on the session stream.
pub async fn next_question(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
) -> Result<QuestionView, ServiceError> {
    ensure_phase(slot, GamePhase::Playing, "serve a question").await?;

    let cap_reached = slot
        .read_session(|session| session.question_cap_reached())
        .await;
    if cap_reached {
        return Err(ServiceError::InvalidState(
            "question cap reached for this session".into(),
        ));
    }

    let _gate = slot.try_begin_generation()?;

    let (difficulty, category, avoid) = slot
        .read_session(|session| {
            (
                session.config.difficulty,
                session.config.category.clone(),
                session.served_texts(),
            )
        })
        .await;

    let generated = match generate_question(state, slot, difficulty, category, avoid).await {
        Ok(question) => question,
        Err(err) => {
            slot.with_session_mut(|session| session.record_error(err.to_string()))
                .await;
            return Err(err);
        }
    };

    let spec = QuestionSpec {
        id: Uuid::new_v4(),
        text: generated.text,
        options: generated.options,
        correct_answer: generated.correct_answer,
        category: generated.category,
        difficulty: generated.difficulty,
        explanation: generated.explanation,
    };

    let view = slot
        .with_session_mut(|session| {
            session.install_question(spec);
            session.current_question.as_ref().map(QuestionView::from)
        })
        .await
        .ok_or_else(|| ServiceError::InvalidState("question failed to install".into()))?;

    session_service::persist_session(state, slot).await;
    sse_events::broadcast_question_ready(slot, view.clone());
    slot.start_timer().await;

    Ok(view)
}

/// Record the player's selected answer on the active question.
pub async fn select_answer(
    slot: &Arc<SessionSlot>,
    request: SelectAnswerRequest,
) -> Result<QuestionView, ServiceError> {
    ensure_phase(slot, GamePhase::Playing, "select an answer").await?;

    let view = slot
        .with_session_mut(|session| {
            if session.select_answer(request.answer) {
                session.current_question.as_ref().map(QuestionView::from)
            } else {
                None
            }
        })
        .await;

    view.ok_or_else(|| {
        ServiceError::InvalidState("no active question is accepting a selection".into())
    })
}

/// Grade the submitted answer, fold it into the statistics, and announce the
/// outcome.
///
/// Submitting with no selection (and no answer in the request) grades as
/// incorrect; the countdown reaching zero leads here through the client, not
/// through the backend.
pub async fn submit_answer(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
    request: SubmitAnswerRequest,
) -> Result<AnswerResultView, ServiceError> {
    ensure_phase(slot, GamePhase::Playing, "submit an answer").await?;

    slot.stop_timer().await;

    let (result, stats, submitted_question_id) = slot
        .with_session_mut(|session| grade_submission(session, request))
        .await?;

    session_service::persist_session(state, slot).await;

    let result_view = AnswerResultView::from(&result);
    sse_events::broadcast_answer_submitted(slot, result_view.clone(), stats);
    if let Some(achievement) = result.achievement.clone() {
        sse_events::broadcast_achievement(state, slot, achievement);
    }
    sse_events::broadcast_scoreboard(state, session_service::resident_entries(state).await);

    let (cap_reached, auto_advance, delay_secs) = slot
        .read_session(|session| {
            (
                session.question_cap_reached(),
                session.config.auto_advance,
                session.config.auto_advance_delay_secs,
            )
        })
        .await;

    if cap_reached {
        if let Err(err) = end_game(state, slot).await {
            warn!(
                session_id = %slot.session_id(),
                error = %err,
                "failed to end game after reaching the question cap"
            );
        }
    } else if auto_advance {
        schedule_auto_advance(state.clone(), slot.clone(), submitted_question_id, delay_secs);
    }

    Ok(result_view)
}

/// Grade one submission against the active question. Runs under the session
/// write lock so grading and statistics update are atomic.
fn grade_submission(
    session: &mut GameSession,
    request: SubmitAnswerRequest,
) -> Result<(AnswerResult, StatsSummary, Uuid), ServiceError> {
    {
        let Some(question) = session.current_question.as_ref() else {
            return Err(ServiceError::InvalidState("no active question".into()));
        };
        if question.is_submitted {
            return Err(ServiceError::InvalidState(
                "answer already submitted for this question".into(),
            ));
        }
    }

    if let Some(answer) = request.answer {
        session.select_answer(answer);
    }

    let (question_id, selected, correct, difficulty, time_remaining, explanation) = {
        // Checked non-empty above; select_answer never removes the question.
        let question = session.current_question.as_ref().ok_or_else(|| {
            ServiceError::InvalidState("no active question".into())
        })?;
        (
            question.id,
            question.selected_answer,
            question.correct_answer,
            question.difficulty,
            question.time_remaining,
            question.explanation.clone(),
        )
    };

    let is_correct = selected == Some(correct);
    let limit = session.config.time_per_question_secs;
    let time_taken = limit.saturating_sub(time_remaining).max(1);
    let points = scoring::calculate_points(difficulty, time_taken, limit, is_correct);

    let prev_stats = session.stats.clone();
    let streak_broken = !is_correct && prev_stats.current_streak > 0;
    let achievement = achievements::detect(&prev_stats, is_correct, points, time_taken);
    let explanation = if session.config.enable_explanations {
        explanation
    } else {
        None
    };

    let result = AnswerResult {
        is_correct,
        points_earned: points,
        correct_answer: correct,
        selected_answer: selected,
        time_taken_secs: time_taken,
        explanation,
        streak_broken,
        achievement,
    };
    session.apply_result(result.clone());

    Ok((result, (&session.stats).into(), question_id))
}

/// Serve the next question automatically once the advance delay elapses,
/// unless the session moved on in the meantime.
fn schedule_auto_advance(
    state: SharedState,
    slot: Arc<SessionSlot>,
    submitted_question_id: Uuid,
    delay_secs: u32,
) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(u64::from(delay_secs))).await;

        if slot.phase().await != GamePhase::Playing {
            return;
        }
        if state.slot(slot.session_id()).is_none() {
            return;
        }

        // Only advance past the question we just graded; a manual advance or
        // reset in the meantime wins.
        let still_on_submitted = slot
            .read_session(|session| {
                session
                    .current_question
                    .as_ref()
                    .is_some_and(|question| {
                        question.id == submitted_question_id && question.is_submitted
                    })
            })
            .await;
        if !still_on_submitted {
            return;
        }

        if let Err(err) = next_question(&state, &slot).await {
            warn!(
                session_id = %slot.session_id(),
                error = %err,
                "auto-advance failed to serve the next question"
            );
        }
    });
}

/// Produce the next question, preferring the upstream provider and falling
/// back to the built-in bank.
///
/// A provider response duplicating an already-served question is retried
/// once before the bank takes over.
async fn generate_question(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
    difficulty: Difficulty,
    category: String,
    avoid: Vec<String>,
) -> Result<GeneratedQuestion, ServiceError> {
    let request = QuestionRequest {
        session_id: slot.session_id(),
        category: Some(category),
        difficulty,
        avoid_texts: avoid,
    };

    if let Some(provider) = state.provider() {
        match provider.generate(request.clone()).await {
            Ok(question) if !request.avoid_texts.contains(&question.text) => return Ok(question),
            Ok(_) => {
                warn!(
                    session_id = %slot.session_id(),
                    "provider repeated an already-served question; retrying once"
                );
                match provider.generate(request.clone()).await {
                    Ok(retry) if !request.avoid_texts.contains(&retry.text) => return Ok(retry),
                    Ok(_) => warn!(
                        session_id = %slot.session_id(),
                        "provider retry repeated a served question; using the built-in bank"
                    ),
                    Err(err) => warn!(
                        session_id = %slot.session_id(),
                        error = %err,
                        "provider retry failed; using the built-in bank"
                    ),
                }
            }
            Err(err) => warn!(
                session_id = %slot.session_id(),
                error = %err,
                "question provider failed; using the built-in bank"
            ),
        }
    }

    fallback::draw(state.config().fallback_questions(), &request)
        .ok_or(ServiceError::Upstream(ProviderError::Exhausted))
}

/// Fail with a conflict unless the session is in `expected`.
async fn ensure_phase(
    slot: &Arc<SessionSlot>,
    expected: GamePhase,
    action: &str,
) -> Result<(), ServiceError> {
    let phase = slot.phase().await;
    if phase != expected {
        return Err(ServiceError::InvalidState(format!(
            "cannot {action} while in {phase:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        provider::{ProviderResult, QuestionProvider},
        state::{
            AppState,
            session::{AnswerLetter, GameConfig, QuestionRecord},
        },
    };

    fn playing_slot(config: GameConfig) -> Arc<SessionSlot> {
        let session = GameSession::new(Uuid::new_v4(), "p1".into(), config);
        SessionSlot::new(session, GamePhase::Playing)
    }

    fn test_state() -> SharedState {
        AppState::new(AppConfig::load(), None)
    }

    fn install_medium_question(session: &mut GameSession) -> Uuid {
        let id = Uuid::new_v4();
        session.install_question(QuestionSpec {
            id,
            text: "What is the chemical symbol for gold?".into(),
            options: vec!["Ag".into(), "Au".into(), "Gd".into(), "Go".into()],
            correct_answer: AnswerLetter::B,
            category: "science".into(),
            difficulty: Difficulty::Medium,
            explanation: Some("Aurum.".into()),
        });
        id
    }

    #[tokio::test]
    async fn submit_without_question_conflicts() {
        let state = test_state();
        let slot = playing_slot(GameConfig::default());
        let outcome = submit_answer(&state, &slot, SubmitAnswerRequest::default()).await;
        assert!(matches!(outcome, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn submit_grades_and_updates_stats() {
        let state = test_state();
        let slot = playing_slot(GameConfig::default());
        slot.with_session_mut(|session| {
            install_medium_question(session);
        })
        .await;

        let result = submit_answer(
            &state,
            &slot,
            SubmitAnswerRequest {
                answer: Some(AnswerLetter::B),
            },
        )
        .await
        .unwrap();

        assert!(result.is_correct);
        // Instant answer on a 30s medium question: 20 base + 10 time + 4 speed.
        assert_eq!(result.points_earned, 34);

        let (answered, score) = slot
            .read_session(|session| {
                (
                    session.stats.questions_answered,
                    session.stats.total_score,
                )
            })
            .await;
        assert_eq!(answered, 1);
        assert_eq!(score, 34);
    }

    #[tokio::test]
    async fn submit_twice_conflicts() {
        let state = test_state();
        let slot = playing_slot(GameConfig::default());
        slot.with_session_mut(|session| {
            install_medium_question(session);
        })
        .await;

        submit_answer(
            &state,
            &slot,
            SubmitAnswerRequest {
                answer: Some(AnswerLetter::A),
            },
        )
        .await
        .unwrap();

        let second = submit_answer(&state, &slot, SubmitAnswerRequest::default()).await;
        assert!(matches!(second, Err(ServiceError::InvalidState(_))));
    }

    #[tokio::test]
    async fn submit_without_selection_grades_incorrect() {
        let state = test_state();
        let slot = playing_slot(GameConfig::default());
        slot.with_session_mut(|session| {
            install_medium_question(session);
        })
        .await;

        let result = submit_answer(&state, &slot, SubmitAnswerRequest::default())
            .await
            .unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.points_earned, 0);
        assert_eq!(result.selected_answer, None);
    }

    #[tokio::test]
    async fn next_question_uses_fallback_bank_without_provider() {
        let state = test_state();
        let slot = playing_slot(GameConfig::default());
        state.insert_slot(slot.clone());

        let view = next_question(&state, &slot).await.unwrap();
        assert_eq!(view.options.len(), 4);
        assert!(!view.is_submitted);

        slot.stop_timer().await;
    }

    #[tokio::test]
    async fn next_question_respects_cap() {
        let state = test_state();
        let config = GameConfig {
            max_questions: Some(1),
            ..GameConfig::default()
        };
        let slot = playing_slot(config);
        slot.with_session_mut(|session| {
            session.stats.apply_submission(true, 10);
        })
        .await;

        let outcome = next_question(&state, &slot).await;
        assert!(matches!(outcome, Err(ServiceError::InvalidState(_))));
    }

    /// Provider stub that always returns the same question text and counts
    /// how often it was asked.
    struct RepeatingProvider {
        calls: Arc<AtomicUsize>,
        text: String,
    }

    impl QuestionProvider for RepeatingProvider {
        fn generate(
            &self,
            _request: QuestionRequest,
        ) -> BoxFuture<'static, ProviderResult<GeneratedQuestion>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let question = GeneratedQuestion {
                text: self.text.clone(),
                options: vec!["1899".into(), "1905".into(), "1912".into(), "1920".into()],
                correct_answer: AnswerLetter::A,
                category: "general".into(),
                difficulty: Difficulty::Medium,
                explanation: None,
            };
            Box::pin(async move { Ok(question) })
        }
    }

    #[tokio::test]
    async fn pause_outside_playing_is_a_noop() {
        let state = test_state();

        let session = GameSession::new(Uuid::new_v4(), "p1".into(), GameConfig::default());
        let slot = SessionSlot::new(session, GamePhase::Idle);
        let summary = pause_game(&state, &slot).await.unwrap();
        assert_eq!(summary.phase, GamePhase::Idle.into());
        assert_eq!(slot.phase().await, GamePhase::Idle);

        let session = GameSession::new(Uuid::new_v4(), "p1".into(), GameConfig::default());
        let slot = SessionSlot::new(session, GamePhase::Paused);
        let summary = pause_game(&state, &slot).await.unwrap();
        assert_eq!(summary.phase, GamePhase::Paused.into());
        assert_eq!(slot.phase().await, GamePhase::Paused);
    }

    #[tokio::test]
    async fn repeated_provider_question_is_retried_once_then_bank_serves() {
        let repeated = "In which year was the first transatlantic radio signal sent?".to_string();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = RepeatingProvider {
            calls: calls.clone(),
            text: repeated.clone(),
        };
        let state = AppState::new(AppConfig::load(), Some(Arc::new(provider)));

        let slot = playing_slot(GameConfig::default());
        slot.with_session_mut(|session| {
            session.question_history.push(QuestionRecord {
                id: Uuid::new_v4(),
                text: repeated.clone(),
            });
        })
        .await;
        state.insert_slot(slot.clone());

        let view = next_question(&state, &slot).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_ne!(view.text, repeated);

        slot.stop_timer().await;
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advance_serves_next_question_after_delay() {
        let state = test_state();
        let config = GameConfig {
            auto_advance: true,
            ..GameConfig::default()
        };
        let slot = playing_slot(config);
        state.insert_slot(slot.clone());
        let first_id = slot
            .with_session_mut(|session| install_medium_question(session))
            .await;

        submit_answer(
            &state,
            &slot,
            SubmitAnswerRequest {
                answer: Some(AnswerLetter::B),
            },
        )
        .await
        .unwrap();

        // Paused clock jumps straight past the 5s advance delay.
        tokio::time::sleep(Duration::from_secs(7)).await;

        let (current_id, is_submitted) = slot
            .read_session(|session| {
                let question = session.current_question.as_ref().unwrap();
                (question.id, question.is_submitted)
            })
            .await;
        assert_ne!(current_id, first_id);
        assert!(!is_submitted);

        slot.stop_timer().await;
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advance_stands_down_after_reset() {
        let state = test_state();
        let config = GameConfig {
            auto_advance: true,
            ..GameConfig::default()
        };
        let slot = playing_slot(config);
        state.insert_slot(slot.clone());
        slot.with_session_mut(|session| {
            install_medium_question(session);
        })
        .await;

        submit_answer(
            &state,
            &slot,
            SubmitAnswerRequest {
                answer: Some(AnswerLetter::B),
            },
        )
        .await
        .unwrap();
        reset_game(&state, &slot).await.unwrap();

        tokio::time::sleep(Duration::from_secs(7)).await;

        assert_eq!(slot.phase().await, GamePhase::Idle);
        let has_question = slot
            .read_session(|session| session.current_question.is_some())
            .await;
        assert!(!has_question);
    }

    #[tokio::test]
    async fn select_answer_requires_playing_phase() {
        let session = GameSession::new(Uuid::new_v4(), "p1".into(), GameConfig::default());
        let slot = SessionSlot::new(session, GamePhase::Idle);

        let outcome = select_answer(
            &slot,
            SelectAnswerRequest {
                answer: AnswerLetter::A,
            },
        )
        .await;
        assert!(matches!(outcome, Err(ServiceError::InvalidState(_))));
    }
}
