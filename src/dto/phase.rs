use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// No game is running for this session.
    Idle,
    /// The session is bootstrapping a new game.
    Starting,
    /// Questions are being served and answered.
    Playing,
    /// Gameplay is suspended.
    Paused,
    /// The game is over; final statistics are available.
    Ended,
}

impl From<GamePhase> for VisiblePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Idle => VisiblePhase::Idle,
            GamePhase::Starting => VisiblePhase::Starting,
            GamePhase::Playing => VisiblePhase::Playing,
            GamePhase::Paused => VisiblePhase::Paused,
            GamePhase::Ended => VisiblePhase::Ended,
        }
    }
}
