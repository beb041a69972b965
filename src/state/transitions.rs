use std::sync::Arc;

use crate::{
    error::ServiceError,
    services::sse_events::broadcast_phase_changed,
    state::{SessionSlot, SharedState, state_machine::GameEvent},
};

/// Execute a planned state-machine transition, then broadcast the resulting phase change.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    state: &SharedState,
    slot: &Arc<SessionSlot>,
    event: GameEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let (result, next) = slot.run_transition(event, work).await?;
    broadcast_phase_changed(state, slot, next);
    Ok(result)
}
