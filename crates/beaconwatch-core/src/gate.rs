//! Single-shot adapter readiness gate.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::adapter::{AdapterError, AdapterState, RadioAdapter};

/// Waits for the adapter to become ready before a scan command is issued.
///
/// The wait is single-shot: an adapter that is already powered on resolves
/// immediately; otherwise exactly one state transition is observed, and
/// any transition to a non-ready state fails with that state's name. Only
/// one wait may be in flight at a time - a second call while one is
/// pending is rejected rather than registering a duplicate observer.
#[derive(Debug, Default)]
pub struct AdapterGate {
    in_flight: AtomicBool,
}

impl AdapterGate {
    /// Creates an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once the adapter is powered on.
    ///
    /// # Errors
    ///
    /// [`AdapterError::NotReady`] when the observed transition lands in a
    /// non-ready state, [`AdapterError::ReadinessWaitInFlight`] when a
    /// previous wait has not completed yet.
    pub async fn await_ready<A>(&self, adapter: &A) -> Result<(), AdapterError>
    where
        A: RadioAdapter + ?Sized,
    {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(AdapterError::ReadinessWaitInFlight);
        }

        let outcome = Self::wait(adapter).await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn wait<A>(adapter: &A) -> Result<(), AdapterError>
    where
        A: RadioAdapter + ?Sized,
    {
        if adapter.state().await == AdapterState::PoweredOn {
            return Ok(());
        }
        match adapter.next_state_change().await {
            AdapterState::PoweredOn => Ok(()),
            other => Err(AdapterError::NotReady(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::adapter::mock::MockAdapter;

    #[tokio::test]
    async fn test_ready_adapter_resolves_immediately() {
        let adapter = MockAdapter::new();
        let gate = AdapterGate::new();
        assert!(gate.await_ready(&adapter).await.is_ok());
    }

    #[tokio::test]
    async fn test_waits_for_power_on_transition() {
        let adapter = MockAdapter::with_state(AdapterState::PoweredOff);
        let gate = AdapterGate::new();

        let switcher = adapter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            switcher.set_state(AdapterState::PoweredOn);
        });

        assert!(gate.await_ready(&adapter).await.is_ok());
    }

    #[tokio::test]
    async fn test_non_ready_transition_fails_with_state_name() {
        let adapter = MockAdapter::with_state(AdapterState::PoweredOff);
        let gate = AdapterGate::new();

        let switcher = adapter.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            switcher.set_state(AdapterState::Unauthorized);
        });

        let err = gate.await_ready(&adapter).await.unwrap_err();
        assert!(matches!(
            err,
            AdapterError::NotReady(AdapterState::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_wait_is_rejected() {
        let adapter = MockAdapter::with_state(AdapterState::PoweredOff);
        let gate = Arc::new(AdapterGate::new());

        let first_gate = Arc::clone(&gate);
        let first_adapter = adapter.clone();
        let first = tokio::spawn(async move { first_gate.await_ready(&first_adapter).await });
        tokio::task::yield_now().await;

        let err = gate.await_ready(&adapter).await.unwrap_err();
        assert!(matches!(err, AdapterError::ReadinessWaitInFlight));

        // The outstanding wait still completes normally.
        adapter.set_state(AdapterState::PoweredOn);
        assert!(first.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_gate_rearms_after_completion() {
        let adapter = MockAdapter::new();
        let gate = AdapterGate::new();
        assert!(gate.await_ready(&adapter).await.is_ok());
        assert!(gate.await_ready(&adapter).await.is_ok());
    }
}
