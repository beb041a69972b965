use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::services::sse_events;
use crate::state::SessionSlot;

/// Cancellable handle for the one-second countdown of the active question.
///
/// The owning session slot holds at most one of these at a time; starting a
/// new countdown first stops the previous one, and `stop` is idempotent so
/// submit, pause, end, and reset can all tear it down unconditionally. The
/// tick task exits on its own when the question is submitted, replaced, or
/// reaches zero, so an aborted handle never touches a superseded question.
pub struct QuestionTimer {
    handle: JoinHandle<()>,
}

impl QuestionTimer {
    /// Spawn the countdown task for the question currently installed on `slot`.
    pub fn start(slot: Arc<SessionSlot>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;

                let remaining = {
                    let mut session = slot.session().write().await;
                    let Some(question) = session.current_question.as_ref() else {
                        break;
                    };
                    if question.is_submitted {
                        break;
                    }

                    let next = question.time_remaining.saturating_sub(1);
                    session.update_timer(next);
                    next
                };

                sse_events::broadcast_timer_tick(&slot, remaining);

                if remaining == 0 {
                    // The countdown expiring does not auto-submit; clients
                    // observe the zero and submit (or skip) themselves.
                    sse_events::broadcast_question_timeout(&slot);
                    break;
                }
            }
        });

        Self { handle }
    }

    /// Stop the countdown. Safe to call on an already-finished timer.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
