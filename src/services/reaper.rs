//! Background sweep evicting finished and abandoned sessions from memory.
//!
//! Evicted sessions are persisted first, so a later lookup rehydrates them
//! from storage; eviction only reclaims memory, it never loses progress.

use std::time::{Duration, SystemTime};

use tracing::{info, warn};

use crate::{
    services::session_service,
    state::{SharedState, state_machine::GamePhase},
};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
/// How long an ended session stays resident after its last update.
const ENDED_TTL: Duration = Duration::from_secs(15 * 60);
/// How long any session stays resident without being touched.
const STALE_TTL: Duration = Duration::from_secs(60 * 60);

/// Periodically evict ended and stale session slots.
pub async fn run(state: SharedState) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        sweep(&state).await;
    }
}

/// One eviction pass over the resident slots.
pub async fn sweep(state: &SharedState) {
    let now = SystemTime::now();

    for slot in state.slots() {
        let phase = slot.phase().await;
        let updated_at = slot.read_session(|session| session.updated_at).await;

        let age = match now.duration_since(updated_at) {
            Ok(age) => age,
            Err(_) => continue,
        };

        let evict = match phase {
            GamePhase::Ended => age >= ENDED_TTL,
            _ => age >= STALE_TTL,
        };
        if !evict {
            continue;
        }

        if state.is_degraded().await {
            // Without a storage backend eviction would lose the session.
            warn!(
                session_id = %slot.session_id(),
                "skipping eviction of stale session while degraded"
            );
            continue;
        }

        session_service::persist_session(state, &slot).await;
        slot.stop_timer().await;
        state.remove_slot(slot.session_id());
        info!(session_id = %slot.session_id(), ?phase, "evicted session from memory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::{
        config::AppConfig,
        state::{
            AppState, SessionSlot,
            session::{GameConfig, GameSession},
        },
    };

    #[tokio::test]
    async fn sweep_keeps_fresh_sessions() {
        let state = AppState::new(AppConfig::load(), None);
        let session = GameSession::new(Uuid::new_v4(), "p1".into(), GameConfig::default());
        let id = session.session_id;
        state.insert_slot(SessionSlot::new(session, GamePhase::Playing));

        sweep(&state).await;
        assert!(state.slot(id).is_some());
    }

    #[tokio::test]
    async fn sweep_spares_stale_sessions_while_degraded() {
        let state = AppState::new(AppConfig::load(), None);
        let mut session = GameSession::new(Uuid::new_v4(), "p1".into(), GameConfig::default());
        session.updated_at = SystemTime::now() - (STALE_TTL + Duration::from_secs(1));
        let id = session.session_id;
        state.insert_slot(SessionSlot::new(session, GamePhase::Ended));

        // No session store installed, so the state is degraded.
        sweep(&state).await;
        assert!(state.slot(id).is_some());
    }
}
