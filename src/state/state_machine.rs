use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Lifecycle phases a trivia session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No game is running; the session only carries identity and config.
    Idle,
    /// A session has been bootstrapped but gameplay has not begun.
    Starting,
    /// Questions are being served and answered.
    Playing,
    /// Gameplay is suspended; the countdown is frozen.
    Paused,
    /// The game is over and final statistics have been computed.
    Ended,
}

/// Events that can be applied to the lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Bootstrap a fresh session from idle.
    Initialize,
    /// Begin serving questions.
    Begin,
    /// Suspend gameplay, freezing the countdown.
    Pause,
    /// Resume gameplay from a pause.
    Resume,
    /// Finish the game and compute final statistics.
    End,
    /// Discard all progress and return to idle; valid from any phase.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: GamePhase,
        /// Current phase.
        actual: GamePhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: GamePhase,
    /// Phase the state machine will transition to.
    pub to: GamePhase,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<GamePhase>,
}

/// State machine enforcing the session lifecycle
/// `idle -> starting -> playing <-> paused -> ended -> idle`.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            version: 0,
            pending: None,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state machine resuming from a persisted phase.
    pub fn with_phase(phase: GamePhase) -> Self {
        Self {
            phase,
            version: 0,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: GameEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Idle, GameEvent::Initialize) => GamePhase::Starting,
            (GamePhase::Starting, GameEvent::Begin) => GamePhase::Playing,
            (GamePhase::Playing, GameEvent::Pause) => GamePhase::Paused,
            (GamePhase::Paused, GameEvent::Resume) => GamePhase::Playing,
            (GamePhase::Playing | GamePhase::Paused, GameEvent::End) => GamePhase::Ended,
            (_, GameEvent::Reset) => GamePhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut GameStateMachine, event: GameEvent) -> GamePhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), GamePhase::Idle);
    }

    #[test]
    fn full_happy_path_through_game() {
        let mut sm = GameStateMachine::new();

        assert_eq!(apply(&mut sm, GameEvent::Initialize), GamePhase::Starting);
        assert_eq!(apply(&mut sm, GameEvent::Begin), GamePhase::Playing);
        assert_eq!(apply(&mut sm, GameEvent::Pause), GamePhase::Paused);
        assert_eq!(apply(&mut sm, GameEvent::Resume), GamePhase::Playing);
        assert_eq!(apply(&mut sm, GameEvent::End), GamePhase::Ended);
        assert_eq!(apply(&mut sm, GameEvent::Reset), GamePhase::Idle);
    }

    #[test]
    fn end_is_reachable_from_pause() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::Initialize);
        apply(&mut sm, GameEvent::Begin);
        apply(&mut sm, GameEvent::Pause);
        assert_eq!(apply(&mut sm, GameEvent::End), GamePhase::Ended);
    }

    #[test]
    fn reset_is_valid_from_every_phase() {
        for events in [
            &[][..],
            &[GameEvent::Initialize][..],
            &[GameEvent::Initialize, GameEvent::Begin][..],
            &[GameEvent::Initialize, GameEvent::Begin, GameEvent::Pause][..],
            &[GameEvent::Initialize, GameEvent::Begin, GameEvent::End][..],
        ] {
            let mut sm = GameStateMachine::new();
            for event in events {
                apply(&mut sm, *event);
            }
            assert_eq!(apply(&mut sm, GameEvent::Reset), GamePhase::Idle);
        }
    }

    #[test]
    fn pause_outside_playing_is_rejected() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::Initialize);

        let err = sm.plan(GameEvent::Pause).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, GamePhase::Starting);
                assert_eq!(invalid.event, GameEvent::Pause);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = GameStateMachine::new();
        let err = sm.plan(GameEvent::Begin).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, GamePhase::Idle);
                assert_eq!(invalid.event, GameEvent::Begin);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plan_while_pending_is_rejected() {
        let mut sm = GameStateMachine::new();
        let _plan = sm.plan(GameEvent::Initialize).unwrap();
        assert_eq!(
            sm.plan(GameEvent::Reset).unwrap_err(),
            PlanError::AlreadyPending
        );
    }

    #[test]
    fn apply_with_stale_id_keeps_pending_plan() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::Initialize).unwrap();
        let err = sm.apply(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApplyError::IdMismatch { .. }));

        // The original plan must still be applicable.
        assert_eq!(sm.apply(plan.id).unwrap(), GamePhase::Starting);
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::Initialize).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
        assert_eq!(sm.phase(), GamePhase::Idle);
    }
}
