use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, ServerEvent, SessionHandshake},
    error::ServiceError,
    state::{SharedState, Snapshot, SseHub},
};

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Subscribe to the private event stream of one session.
pub fn subscribe_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<broadcast::Receiver<ServerEvent>, ServiceError> {
    let slot = state
        .slot(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;
    Ok(slot.events().subscribe())
}

/// Identifies the target SSE stream for connection lifecycle logging.
#[derive(Clone)]
pub enum StreamKind {
    Public,
    Session(Uuid),
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Public => tracing::info!("Public SSE stream disconnected"),
            StreamKind::Session(session_id) => {
                tracing::info!(%session_id, "Session SSE stream disconnected")
            }
        }
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Send the initial handshake onto a stream so new subscribers learn the
/// degraded flag immediately.
pub fn broadcast_handshake(hub: &SseHub, stream: &str, degraded: bool) {
    if let Ok(event) = ServerEvent::json(
        Some("handshake".to_string()),
        &Handshake {
            stream: stream.to_string(),
            message: format!("{stream} stream connected"),
            degraded,
        },
    ) {
        hub.broadcast(event);
    }
}

/// Send the initial handshake onto a session stream, carrying the lifecycle
/// position taken from the slot's state-machine snapshot.
pub fn broadcast_session_handshake(hub: &SseHub, stream: &str, degraded: bool, snapshot: Snapshot) {
    if let Ok(event) = ServerEvent::json(
        Some("handshake".to_string()),
        &SessionHandshake {
            stream: stream.to_string(),
            message: format!("{stream} stream connected"),
            degraded,
            phase: snapshot.phase.into(),
            pending: snapshot.pending.map(Into::into),
        },
    ) {
        hub.broadcast(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::GamePhase;

    #[test]
    fn session_handshake_carries_lifecycle_position() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();

        let snapshot = Snapshot {
            phase: GamePhase::Paused,
            version: 3,
            pending: None,
        };
        broadcast_session_handshake(&hub, "stream-under-test", false, snapshot);

        let event = receiver.try_recv().expect("handshake should be broadcast");
        assert_eq!(event.event.as_deref(), Some("handshake"));
        assert!(event.data.contains("\"phase\":\"paused\""));
        assert!(event.data.contains("\"degraded\":false"));
    }

    #[test]
    fn public_handshake_names_the_stream() {
        let hub = SseHub::new(4);
        let mut receiver = hub.subscribe();

        broadcast_handshake(&hub, "public", true);

        let event = receiver.try_recv().expect("handshake should be broadcast");
        assert_eq!(event.event.as_deref(), Some("handshake"));
        assert!(event.data.contains("\"stream\":\"public\""));
        assert!(event.data.contains("\"degraded\":true"));
    }
}
