//! Adapter lifecycle: health state and in-flight operation tracking.
//!
//! Health reads are lock-free through `ArcSwap`; transitions are also
//! published on a `watch` channel so tasks can wait for them. Running
//! operations are counted with RAII guards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use tokio::sync::watch;

/// Adapter health state.
///
/// State machine: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Initializing; not yet serving.
    Starting,
    /// Accepting operations.
    Ready,
    /// No new operations accepted; accepted ones are finishing.
    Draining,
    /// Every accepted operation has reported, or the drain gave up.
    Stopped,
}

impl HealthState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }

    fn is_shutting_down(self) -> bool {
        matches!(self, Self::Draining | Self::Stopped)
    }
}

/// Coordinates graceful shutdown between the HTTP surface and the worker pool.
///
/// 1. Health probes read `health_state()`
/// 2. The worker pool holds an `InFlightGuard` for every running operation
/// 3. `trigger_shutdown()` moves to Draining and wakes `signalled()` waiters
/// 4. `set_stopped()` ends the drain and wakes `stopped()` waiters, which
///    closes the event streams
#[derive(Debug)]
pub struct ShutdownController {
    state_tx: watch::Sender<HealthState>,
    in_flight: Arc<AtomicU64>,
    health_state: ArcSwap<HealthState>,
}

impl ShutdownController {
    /// Creates a controller in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        let (state_tx, _rx) = watch::channel(HealthState::Starting);
        Self {
            state_tx,
            in_flight: Arc::new(AtomicU64::new(0)),
            health_state: ArcSwap::from_pointee(HealthState::Starting),
        }
    }

    fn transition(&self, state: HealthState) {
        self.health_state.store(Arc::new(state));
        self.state_tx.send_replace(state);
    }

    pub fn set_ready(&self) {
        self.transition(HealthState::Ready);
    }

    /// Moves to `Draining`; readiness probes start failing.
    pub fn trigger_shutdown(&self) {
        self.transition(HealthState::Draining);
    }

    /// Moves to `Stopped`.
    pub fn set_stopped(&self) {
        self.transition(HealthState::Stopped);
    }

    /// Receiver observing every health transition.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<HealthState> {
        self.state_tx.subscribe()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn signalled(&self) {
        let mut rx = self.state_receiver();
        // The sender lives in `self`, so `wait_for` cannot observe a closed channel.
        let _ = rx.wait_for(|state| state.is_shutting_down()).await;
    }

    /// Resolves once the adapter has stopped.
    pub async fn stopped(&self) {
        let mut rx = self.state_receiver();
        let _ = rx.wait_for(|state| *state == HealthState::Stopped).await;
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.health_state.load()
    }

    /// Counts one running operation until the guard is dropped.
    #[must_use]
    pub fn in_flight_guard(&self) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter on drop, including during unwinding.
#[derive(Debug)]
pub struct InFlightGuard {
    in_flight: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn lifecycle_transitions() {
        let controller = ShutdownController::new();
        assert_eq!(controller.health_state(), HealthState::Starting);

        controller.set_ready();
        assert_eq!(controller.health_state(), HealthState::Ready);

        controller.trigger_shutdown();
        assert_eq!(controller.health_state(), HealthState::Draining);

        controller.set_stopped();
        assert_eq!(controller.health_state(), HealthState::Stopped);
        assert_eq!(*controller.state_receiver().borrow(), HealthState::Stopped);
    }

    #[test]
    fn health_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&HealthState::Draining).unwrap(),
            "\"draining\""
        );
        assert_eq!(HealthState::Ready.as_str(), "ready");
    }

    #[test]
    fn in_flight_guard_counts_running_operations() {
        let controller = ShutdownController::new();

        let first = controller.in_flight_guard();
        let second = controller.in_flight_guard();
        assert_eq!(controller.in_flight_count(), 2);

        drop(first);
        assert_eq!(controller.in_flight_count(), 1);
        drop(second);
        assert_eq!(controller.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn signalled_resolves_after_trigger() {
        let controller = Arc::new(ShutdownController::new());
        let waiter = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.signalled().await })
        };

        controller.set_ready();
        controller.trigger_shutdown();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn stopped_waits_past_draining() {
        let controller = Arc::new(ShutdownController::new());
        let waiter = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.stopped().await })
        };

        controller.trigger_shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        controller.set_stopped();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn signalled_returns_immediately_when_already_stopped() {
        let controller = ShutdownController::new();
        controller.set_stopped();
        controller.signalled().await;
        controller.stopped().await;
    }
}
