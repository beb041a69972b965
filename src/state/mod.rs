pub mod session;
mod sse;
pub mod state_machine;
pub mod timer;
pub mod transitions;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::session_store::SessionStore,
    error::ServiceError,
    provider::QuestionProvider,
    state::{
        session::GameSession,
        state_machine::{GamePhase, GameStateMachine},
        timer::QuestionTimer,
    },
};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, PlanError, Snapshot};
use self::state_machine::{GameEvent, Plan, PlanId};

/// Shared handle on the central application state.
pub type SharedState = Arc<AppState>;

/// Upper bound on how long transition work may run before the plan is aborted.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Broadcast channel capacity for the public and per-session SSE hubs.
const SSE_CHANNEL_CAPACITY: usize = 16;

/// Central application state storing session slots, the persistence handle,
/// the question provider, and the public broadcast hub.
pub struct AppState {
    config: AppConfig,
    session_store: RwLock<Option<Arc<dyn SessionStore>>>,
    provider: Option<Arc<dyn QuestionProvider>>,
    sessions: DashMap<Uuid, Arc<SessionSlot>>,
    public_sse: SseHub,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, provider: Option<Arc<dyn QuestionProvider>>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            session_store: RwLock::new(None),
            provider,
            sessions: DashMap::new(),
            public_sse: SseHub::new(SSE_CHANNEL_CAPACITY),
            degraded: degraded_tx,
        })
    }

    /// Application configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Upstream question provider, when one is configured.
    pub fn provider(&self) -> Option<Arc<dyn QuestionProvider>> {
        self.provider.clone()
    }

    /// Obtain a handle to the current session store, if one is installed.
    pub async fn session_store(&self) -> Option<Arc<dyn SessionStore>> {
        let guard = self.session_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the session store or fail with a degraded-mode error.
    pub async fn require_session_store(&self) -> Result<Arc<dyn SessionStore>, ServiceError> {
        self.session_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new session store implementation and leave degraded mode.
    pub async fn install_session_store(&self, store: Arc<dyn SessionStore>) {
        {
            let mut guard = self.session_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current session store and enter degraded mode.
    pub async fn clear_session_store(&self) {
        {
            let mut guard = self.session_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.session_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    /// Register a session slot under its session id.
    pub fn insert_slot(&self, slot: Arc<SessionSlot>) {
        self.sessions.insert(slot.session_id(), slot);
    }

    /// Look up the in-memory slot for a session.
    pub fn slot(&self, session_id: Uuid) -> Option<Arc<SessionSlot>> {
        self.sessions
            .get(&session_id)
            .map(|entry| entry.value().clone())
    }

    /// Drop the in-memory slot for a session, returning it when present.
    pub fn remove_slot(&self, session_id: Uuid) -> Option<Arc<SessionSlot>> {
        self.sessions.remove(&session_id).map(|(_, slot)| slot)
    }

    /// Snapshot of all resident session slots.
    pub fn slots(&self) -> Vec<Arc<SessionSlot>> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

/// Per-session container owning the lifecycle state machine, the session
/// data, the countdown timer handle, and the private event hub.
pub struct SessionSlot {
    session_id: Uuid,
    machine: RwLock<GameStateMachine>,
    session: RwLock<GameSession>,
    timer: Mutex<Option<QuestionTimer>>,
    generation_gate: Mutex<()>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
    events: SseHub,
}

impl SessionSlot {
    /// Build a slot around a session, seeding the state machine at `phase`.
    pub fn new(session: GameSession, phase: GamePhase) -> Arc<Self> {
        Arc::new(Self {
            session_id: session.session_id,
            machine: RwLock::new(GameStateMachine::with_phase(phase)),
            session: RwLock::new(session),
            timer: Mutex::new(None),
            generation_gate: Mutex::new(()),
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
            events: SseHub::new(SSE_CHANNEL_CAPACITY),
        })
    }

    /// Identifier of the session this slot manages.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Lock guarding the session data.
    pub fn session(&self) -> &RwLock<GameSession> {
        &self.session
    }

    /// Broadcast hub for this session's private SSE stream.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Snapshot the current phase of the lifecycle state machine.
    pub async fn phase(&self) -> GamePhase {
        self.machine.read().await.phase()
    }

    /// Snapshot of the lifecycle state machine (phase, version, pending).
    pub async fn snapshot(&self) -> Snapshot {
        self.machine.read().await.snapshot()
    }

    /// Read the session data through a projection.
    pub async fn read_session<F, T>(&self, read: F) -> T
    where
        F: FnOnce(&GameSession) -> T,
    {
        let guard = self.session.read().await;
        read(&guard)
    }

    /// Mutate the session data through a closure.
    pub async fn with_session_mut<F, T>(&self, mutate: F) -> T
    where
        F: FnOnce(&mut GameSession) -> T,
    {
        let mut guard = self.session.write().await;
        mutate(&mut guard)
    }

    /// Acquire the question-generation gate without waiting; fails while a
    /// prior generation for this session is still in flight.
    pub fn try_begin_generation(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, ServiceError> {
        self.generation_gate.try_lock().map_err(|_| {
            ServiceError::InvalidState("question generation already in progress".into())
        })
    }

    /// Start (or restart) the countdown for the installed question, cancelling
    /// any previous timer first so only one tick task exists per session.
    pub async fn start_timer(self: &Arc<Self>) {
        let mut guard = self.timer.lock().await;
        if let Some(previous) = guard.take() {
            previous.stop();
        }
        *guard = Some(QuestionTimer::start(self.clone()));
    }

    /// Stop the countdown if one is running; safe to call repeatedly.
    pub async fn stop_timer(&self) {
        let mut guard = self.timer.lock().await;
        if let Some(timer) = guard.take() {
            timer.stop();
        }
    }

    /// Plan a transition on the lifecycle state machine, returning the plan.
    async fn plan_transition(&self, event: GameEvent) -> Result<Plan, PlanError> {
        let mut machine = self.machine.write().await;
        machine.plan(event)
    }

    /// Apply the planned transition, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let mut machine = self.machine.write().await;
        machine.apply(plan_id)
    }

    /// Abort a planned transition.
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut machine = self.machine.write().await;
        machine.abort(plan_id)
    }

    /// Plan `event`, run the side-effecting `work`, and commit the transition
    /// only when the work succeeds within the timeout; abort otherwise. The
    /// transition gate serialises concurrent lifecycle operations on this
    /// session.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: GameEvent,
        work: F,
    ) -> Result<(T, GamePhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}
