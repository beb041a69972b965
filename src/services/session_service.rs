//! Session lifecycle management: creation, lookup with rehydration from
//! storage, configuration updates, deletion, and the cross-session
//! scoreboard.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::SessionEntity,
    dto::session::{
        ConfigInput, CreateSessionRequest, ScoreboardEntry, ScoreboardResponse, SessionSummary,
    },
    error::ServiceError,
    state::{
        SessionSlot, SharedState,
        session::{ConfigPatch, GameConfig, GameSession},
        state_machine::GamePhase,
    },
};

/// Bootstrap a brand-new session and register its slot.
///
/// The session is persisted best-effort: a storage failure leaves the
/// backend serving the in-memory slot and is only logged.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionSummary, ServiceError> {
    let mut config = GameConfig::default();
    if let Some(input) = request.config {
        config.merge(ConfigPatch::from(input));
    }

    let session = GameSession::new(Uuid::new_v4(), request.player_id, config);
    let slot = SessionSlot::new(session, GamePhase::Idle);
    state.insert_slot(slot.clone());

    info!(session_id = %slot.session_id(), "session created");
    persist_session(state, &slot).await;

    Ok(summary(&slot).await)
}

/// Fetch the full projection of a session, rehydrating it from storage when
/// it is not resident in memory.
pub async fn get_session(state: &SharedState, id: Uuid) -> Result<SessionSummary, ServiceError> {
    let slot = resolve_slot(state, id).await?;
    Ok(summary(&slot).await)
}

/// Merge a partial configuration update into the session.
pub async fn update_config(
    state: &SharedState,
    id: Uuid,
    input: ConfigInput,
) -> Result<SessionSummary, ServiceError> {
    let slot = resolve_slot(state, id).await?;

    slot.with_session_mut(|session| session.config.merge(ConfigPatch::from(input)))
        .await;

    persist_session(state, &slot).await;
    Ok(summary(&slot).await)
}

/// Remove a session from memory and from storage.
pub async fn delete_session(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let removed = match state.remove_slot(id) {
        Some(slot) => {
            slot.stop_timer().await;
            true
        }
        None => false,
    };

    let deleted_from_store = match state.session_store().await {
        Some(store) => store.delete_session(id).await?,
        None => false,
    };

    if !removed && !deleted_from_store {
        return Err(ServiceError::NotFound(format!("session `{id}` not found")));
    }

    info!(session_id = %id, "session deleted");
    Ok(())
}

/// Ranked scoreboard across resident sessions and stored ones.
///
/// In-memory slots take precedence over their persisted counterparts since
/// they carry the freshest statistics. Without a storage backend the
/// scoreboard degrades to resident sessions only.
pub async fn scoreboard(state: &SharedState) -> Result<ScoreboardResponse, ServiceError> {
    let mut entries = resident_entries(state).await;
    let resident: Vec<Uuid> = entries.iter().map(|entry| entry.session_id).collect();

    if let Some(store) = state.session_store().await {
        match store.list_sessions().await {
            Ok(stored) => {
                for entity in stored {
                    if resident.contains(&entity.id) {
                        continue;
                    }
                    entries.push(ScoreboardEntry {
                        session_id: entity.id,
                        player_id: entity.player_id,
                        total_score: entity.stats.total_score,
                        accuracy: entity.stats.accuracy,
                        max_streak: entity.stats.max_streak,
                        questions_answered: entity.stats.questions_answered,
                        phase: GamePhase::from(entity.phase).into(),
                    });
                }
            }
            Err(err) => warn!(error = %err, "failed to list stored sessions for scoreboard"),
        }
    }

    entries.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    Ok(ScoreboardResponse { entries })
}

/// Scoreboard rows built from the sessions currently resident in memory,
/// ordered by score descending.
pub async fn resident_entries(state: &SharedState) -> Vec<ScoreboardEntry> {
    let mut entries = Vec::new();
    for slot in state.slots() {
        let phase = slot.phase().await;
        let entry = slot
            .read_session(|session| ScoreboardEntry {
                session_id: session.session_id,
                player_id: session.player_id.clone(),
                total_score: session.stats.total_score,
                accuracy: session.stats.accuracy,
                max_streak: session.stats.max_streak,
                questions_answered: session.stats.questions_answered,
                phase: phase.into(),
            })
            .await;
        entries.push(entry);
    }
    entries.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    entries
}

/// Find the in-memory slot for a session, rehydrating it from storage when
/// the backend was restarted since the session was last touched.
pub async fn resolve_slot(
    state: &SharedState,
    id: Uuid,
) -> Result<Arc<SessionSlot>, ServiceError> {
    if let Some(slot) = state.slot(id) {
        return Ok(slot);
    }

    let store = state
        .session_store()
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` not found")))?;

    let Some(entity) = store.find_session(id).await? else {
        return Err(ServiceError::NotFound(format!("session `{id}` not found")));
    };

    let phase = rehydrated_phase(entity.phase.into());
    let session = GameSession::from((entity, phase));
    let slot = SessionSlot::new(session, phase);
    state.insert_slot(slot.clone());

    info!(session_id = %id, ?phase, "session rehydrated from storage");
    Ok(slot)
}

/// Persist the session best-effort; a missing or failing store only logs.
pub async fn persist_session(state: &SharedState, slot: &Arc<SessionSlot>) {
    let Some(store) = state.session_store().await else {
        return;
    };

    let phase = slot.phase().await;
    let entity: SessionEntity = slot
        .read_session(|session| SessionEntity::from((session, phase)))
        .await;

    if let Err(err) = store.save_session(entity).await {
        warn!(session_id = %slot.session_id(), error = %err, "failed to persist session");
    }
}

/// Build the full session projection.
pub async fn summary(slot: &Arc<SessionSlot>) -> SessionSummary {
    let phase = slot.phase().await;
    slot.read_session(|session| SessionSummary::from_parts(session, phase))
        .await
}

/// Phase a persisted session resumes in.
///
/// A session that was mid-game comes back paused since no countdown survives
/// a restart, and a session caught bootstrapping starts over from idle.
fn rehydrated_phase(persisted: GamePhase) -> GamePhase {
    match persisted {
        GamePhase::Playing => GamePhase::Paused,
        GamePhase::Starting => GamePhase::Idle,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playing_sessions_rehydrate_paused() {
        assert_eq!(rehydrated_phase(GamePhase::Playing), GamePhase::Paused);
        assert_eq!(rehydrated_phase(GamePhase::Starting), GamePhase::Idle);
        assert_eq!(rehydrated_phase(GamePhase::Paused), GamePhase::Paused);
        assert_eq!(rehydrated_phase(GamePhase::Ended), GamePhase::Ended);
        assert_eq!(rehydrated_phase(GamePhase::Idle), GamePhase::Idle);
    }
}
