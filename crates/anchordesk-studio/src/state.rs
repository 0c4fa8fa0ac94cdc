//! Playback guard and phase tracking shared by every orchestrator.
//!
//! # Concurrency Model
//!
//! One `std::sync::Mutex` holds the guard flags, the phase, and the
//! cancellation token of the attempt in progress. Every method takes the lock
//! for a few field updates and never across an `.await`, so admission and
//! cancel decisions are atomic with respect to each other.
//!
//! The guard is at rest (all flags clear, no id) between attempts. Only
//! [`StudioState::finish`] returns it to rest, and it clears every flag in
//! one step.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use anchordesk_core::{
    BUSY_LOADING_MESSAGE, BUSY_LOCKED_MESSAGE, BroadcastPhase, StudioError, StudioEvent,
    StudioEventEmitter, StudioResult,
};

/// Mutual-exclusion flags for broadcast playback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackGuard {
    pub currently_playing_id: Option<String>,
    pub is_playing: bool,
    pub is_loading: bool,
    pub was_canceled: bool,
    pub broadcast_lock: bool,
}

impl PlaybackGuard {
    pub fn is_at_rest(&self) -> bool {
        *self == Self::default()
    }
}

/// An admitted broadcast attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: String,
    pub cancel: CancellationToken,
}

/// Result of an admission request that was not rejected.
#[derive(Debug)]
pub enum Admission {
    Granted(Attempt),
    /// The id is already playing; the request stops it instead.
    StopRequested,
}

/// What a stop request interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    /// An attempt still loading was canceled.
    Loading,
    /// Playback was halted.
    Playback,
    /// Nothing was running.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub guard: PlaybackGuard,
    pub phase: BroadcastPhase,
}

#[derive(Default)]
struct Inner {
    guard: PlaybackGuard,
    phase: BroadcastPhase,
    cancel: Option<CancellationToken>,
}

pub struct StudioState {
    inner: Mutex<Inner>,
    emitter: Arc<dyn StudioEventEmitter>,
}

impl StudioState {
    pub fn new(emitter: Arc<dyn StudioEventEmitter>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            emitter,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether a broadcast keyed by `id` may start.
    ///
    /// A request for the id already playing is a stop request. Otherwise a
    /// held lock or a load in progress rejects with [`StudioError::Busy`] and
    /// leaves the guard untouched.
    pub fn admit(&self, id: &str) -> StudioResult<Admission> {
        let mut inner = self.lock();

        if inner.guard.currently_playing_id.as_deref() == Some(id) {
            drop(inner);
            debug!(target: "anchordesk.studio", broadcast_id = id, "Repeat request stops the running broadcast");
            return Ok(Admission::StopRequested);
        }
        if inner.guard.broadcast_lock {
            return Err(StudioError::busy(BUSY_LOCKED_MESSAGE));
        }
        if inner.guard.is_loading {
            return Err(StudioError::busy(BUSY_LOADING_MESSAGE));
        }

        let cancel = CancellationToken::new();
        inner.guard = PlaybackGuard {
            currently_playing_id: Some(id.to_string()),
            is_playing: false,
            is_loading: true,
            was_canceled: false,
            broadcast_lock: true,
        };
        inner.cancel = Some(cancel.clone());
        inner.phase = BroadcastPhase::Locking;
        drop(inner);

        self.emit_phase(Some(id), BroadcastPhase::Locking);
        Ok(Admission::Granted(Attempt {
            id: id.to_string(),
            cancel,
        }))
    }

    /// Move the current attempt to `next`, rejecting edges the phase machine
    /// does not allow.
    pub fn transition(&self, next: BroadcastPhase) -> StudioResult<()> {
        let mut inner = self.lock();
        let current = inner.phase;
        if !current.can_transition_to(next) {
            warn!(target: "anchordesk.studio", from = %current, to = %next, "Rejected phase transition");
            return Err(StudioError::internal(format!(
                "invalid phase transition {current} -> {next}"
            )));
        }
        inner.phase = next;
        // Once on air, chained queue items stay in playback: a stop between
        // them halts the chain rather than canceling a load.
        if next == BroadcastPhase::Playing {
            inner.guard.is_loading = false;
            inner.guard.is_playing = true;
        }
        let id = inner.guard.currently_playing_id.clone();
        drop(inner);

        debug!(target: "anchordesk.studio", from = %current, to = %next, "Phase changed");
        self.emit_phase(id.as_deref(), next);
        Ok(())
    }

    /// Signal the running attempt to stop.
    ///
    /// Stopping while loading marks the attempt as canceled by the user.
    pub fn request_stop(&self) -> StopKind {
        let mut inner = self.lock();
        let Some(cancel) = inner.cancel.clone() else {
            return StopKind::Idle;
        };
        let kind = if inner.guard.is_loading {
            inner.guard.was_canceled = true;
            StopKind::Loading
        } else {
            StopKind::Playback
        };
        drop(inner);
        cancel.cancel();
        kind
    }

    pub fn was_canceled(&self) -> bool {
        self.lock().guard.was_canceled
    }

    /// Return to rest: every flag cleared at once, phase back to idle.
    pub fn finish(&self) {
        let mut inner = self.lock();
        let id = inner.guard.currently_playing_id.take();
        *inner = Inner::default();
        drop(inner);
        debug!(target: "anchordesk.studio", broadcast_id = ?id, "Guard at rest");
        self.emit_phase(id.as_deref(), BroadcastPhase::Idle);
    }

    pub fn phase(&self) -> BroadcastPhase {
        self.lock().phase
    }

    pub fn guard(&self) -> PlaybackGuard {
        self.lock().guard.clone()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.lock();
        StateSnapshot {
            guard: inner.guard.clone(),
            phase: inner.phase,
        }
    }

    fn emit_phase(&self, id: Option<&str>, phase: BroadcastPhase) {
        self.emitter.emit(StudioEvent::PhaseChanged {
            broadcast_id: id.map(str::to_string),
            phase,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchordesk_core::NoopEmitter;

    fn state() -> StudioState {
        StudioState::new(Arc::new(NoopEmitter::new()))
    }

    fn granted(admission: Admission) -> Attempt {
        match admission {
            Admission::Granted(attempt) => attempt,
            Admission::StopRequested => panic!("expected a grant"),
        }
    }

    #[test]
    fn test_admission_takes_lock() {
        let state = state();
        let attempt = granted(state.admit("a").unwrap());
        assert_eq!(attempt.id, "a");

        let guard = state.guard();
        assert!(guard.broadcast_lock);
        assert!(guard.is_loading);
        assert_eq!(state.phase(), BroadcastPhase::Locking);
    }

    #[test]
    fn test_busy_rejection_changes_nothing() {
        let state = state();
        granted(state.admit("a").unwrap());
        let before = state.snapshot();

        let err = state.admit("b").unwrap_err();
        assert_eq!(err.user_message(), BUSY_LOCKED_MESSAGE);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_same_id_is_a_stop_request() {
        let state = state();
        let attempt = granted(state.admit("a").unwrap());
        assert!(matches!(state.admit("a").unwrap(), Admission::StopRequested));

        assert_eq!(state.request_stop(), StopKind::Loading);
        assert!(attempt.cancel.is_cancelled());
        assert!(state.was_canceled());
    }

    #[test]
    fn test_stop_during_playback_is_not_a_cancel() {
        let state = state();
        let attempt = granted(state.admit("a").unwrap());
        state.transition(BroadcastPhase::Handshake).unwrap();
        state.transition(BroadcastPhase::Synthesizing).unwrap();
        state.transition(BroadcastPhase::Playing).unwrap();

        assert_eq!(state.request_stop(), StopKind::Playback);
        assert!(attempt.cancel.is_cancelled());
        assert!(!state.was_canceled());
    }

    #[test]
    fn test_chained_handshake_stays_in_playback() {
        let state = state();
        let attempt = granted(state.admit("a").unwrap());
        state.transition(BroadcastPhase::Handshake).unwrap();
        state.transition(BroadcastPhase::Synthesizing).unwrap();
        state.transition(BroadcastPhase::Playing).unwrap();
        state.transition(BroadcastPhase::Handshake).unwrap();

        let guard = state.guard();
        assert!(guard.is_playing);
        assert!(!guard.is_loading);
        assert_eq!(state.request_stop(), StopKind::Playback);
        assert!(attempt.cancel.is_cancelled());
        assert!(!state.was_canceled());
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let state = state();
        granted(state.admit("a").unwrap());
        assert!(state.transition(BroadcastPhase::Playing).is_err());
        assert_eq!(state.phase(), BroadcastPhase::Locking);
    }

    #[test]
    fn test_finish_returns_to_rest() {
        let state = state();
        granted(state.admit("a").unwrap());
        state.transition(BroadcastPhase::Failed).unwrap();
        state.finish();

        assert!(state.guard().is_at_rest());
        assert_eq!(state.phase(), BroadcastPhase::Idle);
        assert_eq!(state.request_stop(), StopKind::Idle);
        granted(state.admit("b").unwrap());
    }
}
