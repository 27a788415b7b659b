// Session state module
//
// This module provides the StateManager which owns the loader's session state
// (phase, progress, cancellation flag, usage tracker) behind Arc<RwLock<T>> and
// emits change events for anyone watching a load.

use crate::metrics::{UsageSnapshot, UsageTracker};
use crate::services::LoadError;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, watch};

/// Where a loader is in its lifecycle.
///
/// `Validating` and `Processing` are the in-flight phases; the terminal phases
/// stay visible until the next session starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Validating,
    Processing,
    Completed,
    Cancelled,
    Failed,
}

impl LoadPhase {
    /// True while a session holds the loader
    pub fn is_active(self) -> bool {
        matches!(self, LoadPhase::Validating | LoadPhase::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoadPhase::Idle => "idle",
            LoadPhase::Validating => "validating",
            LoadPhase::Processing => "processing",
            LoadPhase::Completed => "completed",
            LoadPhase::Cancelled => "cancelled",
            LoadPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change events emitted as a session progresses
///
/// Events are broadcast in the same order the loader invokes its callbacks.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A session took the loader
    SessionStarted { source: String },

    /// The session moved to another phase
    PhaseChanged { from: LoadPhase, to: LoadPhase },

    /// A window was delivered
    ProgressUpdated { processed: usize, total: usize },

    /// The session ended in a terminal phase
    SessionFinished { phase: LoadPhase },
}

/// Mutable state of one loader.
#[derive(Debug, Default)]
pub struct SessionState {
    pub phase: LoadPhase,
    pub source_name: Option<String>,
    pub processed: usize,
    pub total: usize,
    pub cancel_requested: bool,
    pub tracker: UsageTracker,
}

/// Thread-safe session state manager with event emission
///
/// The busy check and the per-session reset happen under one write lock in
/// [`begin_session`](Self::begin_session), so two callers can never both
/// observe an idle loader.
pub struct StateManager {
    /// The session state protected by RwLock for thread-safe access
    state: Arc<RwLock<SessionState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,

    /// Mirrors `cancel_requested`; written only while the state lock is held
    cancel_tx: watch::Sender<bool>,
}

impl StateManager {
    /// Create a new StateManager with an idle session and a platform-probed tracker
    pub fn new() -> Self {
        Self::with_tracker(UsageTracker::new())
    }

    /// Create a new StateManager around a specific tracker
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn with_tracker(tracker: UsageTracker) -> Self {
        let (state_tx, _) = broadcast::channel(100);
        let (cancel_tx, _) = watch::channel(false);
        Self {
            state: Arc::new(RwLock::new(SessionState {
                tracker,
                ..SessionState::default()
            })),
            state_tx,
            cancel_tx,
        }
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let busy = state_manager.read(|state| state.phase.is_active());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionState) -> R,
    {
        let state = self.read_lock();
        f(&state)
    }

    /// Execute a function with write access to the state. No events are emitted.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionState) -> R,
    {
        let mut state = self.write_lock();
        f(&mut state)
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, change: StateChange) {
        // Ignore send errors - it's OK if no one is listening
        let _ = self.state_tx.send(change);
    }

    /// Claim the loader for a new session.
    ///
    /// Fails with [`LoadError::Busy`] if another session is in flight, leaving
    /// that session untouched. Otherwise resets progress, the cancellation flag
    /// and the tracker, and moves to [`LoadPhase::Validating`].
    pub fn begin_session(&self, source_name: &str) -> Result<SessionGuard<'_>, LoadError> {
        let from = {
            let mut state = self.write_lock();
            if state.phase.is_active() {
                return Err(LoadError::Busy);
            }

            let from = state.phase;
            state.phase = LoadPhase::Validating;
            state.source_name = Some(source_name.to_string());
            state.processed = 0;
            state.total = 0;
            state.cancel_requested = false;
            self.cancel_tx.send_replace(false);
            state.tracker.reset();
            from
        };

        self.emit(StateChange::SessionStarted {
            source: source_name.to_string(),
        });
        self.emit(StateChange::PhaseChanged {
            from,
            to: LoadPhase::Validating,
        });

        Ok(SessionGuard {
            manager: self,
            finished: false,
        })
    }

    /// Current phase
    pub fn phase(&self) -> LoadPhase {
        self.read(|state| state.phase)
    }

    /// Whether a session is in flight
    pub fn is_active(&self) -> bool {
        self.phase().is_active()
    }

    /// Flag the in-flight session for cancellation.
    ///
    /// # Returns
    /// `true` if a session was in flight and is now flagged
    pub fn request_cancel(&self) -> bool {
        self.update(|state| {
            if state.phase.is_active() {
                state.cancel_requested = true;
                self.cancel_tx.send_replace(true);
                true
            } else {
                false
            }
        })
    }

    /// Receiver that turns `true` when the in-flight session is asked to stop.
    ///
    /// Reset to `false` atomically with the busy check in
    /// [`begin_session`](Self::begin_session), so a request made right after a
    /// session starts is never lost.
    pub fn cancel_signal(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    /// Whether the in-flight session has been asked to stop
    pub fn cancel_requested(&self) -> bool {
        self.read(|state| state.cancel_requested)
    }

    fn set_phase(&self, to: LoadPhase) {
        let from = self.update(|state| std::mem::replace(&mut state.phase, to));
        if from != to {
            tracing::debug!("Load phase {} -> {}", from, to);
            self.emit(StateChange::PhaseChanged { from, to });
        }
    }

    /// Record delivery of a window
    pub fn record_progress(&self, processed: usize, total: usize) {
        self.update(|state| {
            state.processed = processed;
            state.total = total;
        });
        self.emit(StateChange::ProgressUpdated { processed, total });
    }

    /// Count one operation in the session tracker
    pub fn track(&self, operation: &str) {
        self.update(|state| state.tracker.track(operation));
    }

    /// Record a tracker checkpoint
    pub fn checkpoint(&self) {
        self.update(|state| state.tracker.checkpoint());
    }

    /// Current tracker statistics
    pub fn usage(&self) -> UsageSnapshot {
        self.read(|state| state.tracker.snapshot())
    }

    /// Log the tracker's summary for the current or last session
    pub fn log_usage_summary(&self) {
        self.read(|state| state.tracker.log_summary());
    }

    fn finish(&self, phase: LoadPhase) {
        self.update(|state| {
            state.cancel_requested = false;
            self.cancel_tx.send_replace(false);
        });
        self.set_phase(phase);
        self.emit(StateChange::SessionFinished { phase });
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker for an in-flight session.
///
/// Ending the session goes through [`finish`](Self::finish). A guard dropped
/// without finishing (the load future was dropped mid-session) ends the
/// session as [`LoadPhase::Cancelled`], so the loader is never left busy.
pub struct SessionGuard<'a> {
    manager: &'a StateManager,
    finished: bool,
}

impl SessionGuard<'_> {
    /// Move the session from validation to window processing
    pub fn start_processing(&self) {
        self.manager.set_phase(LoadPhase::Processing);
    }

    /// End the session in a terminal phase and release the loader
    pub fn finish(mut self, phase: LoadPhase) {
        debug_assert!(!phase.is_active());
        self.finished = true;
        self.manager.finish(phase);
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Load session dropped before completion - releasing loader");
            self.manager.finish(LoadPhase::Cancelled);
        }
    }
}
