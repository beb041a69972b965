//! Typed SSE payload construction and fan-out to the public and per-session
//! broadcast hubs.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        question::{AnswerResultView, QuestionView},
        session::{ScoreboardEntry, StatsSummary},
        sse::{
            AchievementEvent, AnswerSubmittedEvent, PhaseChangedEvent, QuestionReadyEvent,
            QuestionTimeoutEvent, ScoreboardEvent, ServerEvent, SystemStatus, TimerTickEvent,
        },
    },
    state::{SessionSlot, SharedState, session::Achievement, state_machine::GamePhase},
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_QUESTION_READY: &str = "question.ready";
const EVENT_TIMER_TICK: &str = "question.tick";
const EVENT_QUESTION_TIMEOUT: &str = "question.timeout";
const EVENT_ANSWER_SUBMITTED: &str = "answer.submitted";
const EVENT_ACHIEVEMENT: &str = "achievement.unlocked";
const EVENT_SCOREBOARD: &str = "scoreboard";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast a lifecycle phase change on the session stream and mirror it on
/// the public stream.
pub fn broadcast_phase_changed(state: &SharedState, slot: &Arc<SessionSlot>, phase: GamePhase) {
    let payload = PhaseChangedEvent {
        session_id: slot.session_id(),
        phase: phase.into(),
    };
    send_session_event(slot, EVENT_PHASE_CHANGED, &payload);
    send_public_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast the freshly installed question to the session stream.
pub fn broadcast_question_ready(slot: &Arc<SessionSlot>, question: QuestionView) {
    let payload = QuestionReadyEvent {
        session_id: slot.session_id(),
        question,
    };
    send_session_event(slot, EVENT_QUESTION_READY, &payload);
}

/// Broadcast one countdown tick to the session stream.
pub fn broadcast_timer_tick(slot: &Arc<SessionSlot>, time_remaining: u32) {
    let payload = TimerTickEvent {
        session_id: slot.session_id(),
        time_remaining,
    };
    send_session_event(slot, EVENT_TIMER_TICK, &payload);
}

/// Broadcast that the countdown of the active question reached zero.
pub fn broadcast_question_timeout(slot: &Arc<SessionSlot>) {
    let payload = QuestionTimeoutEvent {
        session_id: slot.session_id(),
    };
    send_session_event(slot, EVENT_QUESTION_TIMEOUT, &payload);
}

/// Broadcast a graded submission with the updated statistics.
pub fn broadcast_answer_submitted(
    slot: &Arc<SessionSlot>,
    result: AnswerResultView,
    stats: StatsSummary,
) {
    let payload = AnswerSubmittedEvent {
        session_id: slot.session_id(),
        result,
        stats,
    };
    send_session_event(slot, EVENT_ANSWER_SUBMITTED, &payload);
}

/// Broadcast an unlocked achievement on the session stream and mirror it on
/// the public stream.
pub fn broadcast_achievement(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
    achievement: Achievement,
) {
    let payload = AchievementEvent {
        session_id: slot.session_id(),
        achievement,
    };
    send_session_event(slot, EVENT_ACHIEVEMENT, &payload);
    send_public_event(state, EVENT_ACHIEVEMENT, &payload);
}

/// Broadcast the ranked scoreboard to public subscribers.
pub fn broadcast_scoreboard(state: &SharedState, entries: Vec<ScoreboardEntry>) {
    let payload = ScoreboardEvent { entries };
    send_public_event(state, EVENT_SCOREBOARD, &payload);
}

/// Broadcast a degraded mode flip to public subscribers.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_public_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_session_event(slot: &Arc<SessionSlot>, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => slot.events().broadcast(event),
        Err(err) => warn!(
            event,
            session_id = %slot.session_id(),
            error = %err,
            "failed to serialize session SSE payload"
        ),
    }
}
