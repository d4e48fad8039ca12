//! A scripted radio adapter for tests and hardware-free development.
//!
//! `MockAdapter` is cheaply cloneable; clones share state, so a test can
//! hand one clone to the scanner and keep another to flip the power
//! state, inject advertisements, or make the next scan-start fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use super::{
    AdapterError, AdapterState, RadioAdapter, RawAdvertisement, ADVERTISEMENT_CHANNEL_CAPACITY,
};

/// In-memory [`RadioAdapter`] driven by the test instead of a radio.
#[derive(Clone)]
pub struct MockAdapter {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<AdapterState>,
    scanning: AtomicBool,
    fail_scan_start: Mutex<Option<String>>,
    subscriber: Mutex<Option<mpsc::Sender<RawAdvertisement>>>,
}

impl MockAdapter {
    /// A powered-on adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(AdapterState::PoweredOn)
    }

    /// An adapter starting in the given power state.
    #[must_use]
    pub fn with_state(state: AdapterState) -> Self {
        let (state_tx, _) = watch::channel(state);
        Self {
            inner: Arc::new(Inner {
                state: state_tx,
                scanning: AtomicBool::new(false),
                fail_scan_start: Mutex::new(None),
                subscriber: Mutex::new(None),
            }),
        }
    }

    /// Transitions the power state, waking any pending state observer.
    pub fn set_state(&self, state: AdapterState) {
        self.inner.state.send_replace(state);
    }

    /// Makes the next `start_scanning` call fail with the given message.
    pub fn fail_next_scan_start(&self, message: impl Into<String>) {
        *self
            .inner
            .fail_scan_start
            .lock()
            .expect("mock lock poisoned") = Some(message.into());
    }

    /// Injects an advertisement into the current subscription.
    ///
    /// Returns `false` when no live subscriber exists (never subscribed,
    /// or the receiver was dropped).
    pub async fn emit(&self, advertisement: RawAdvertisement) -> bool {
        let sender = self
            .inner
            .subscriber
            .lock()
            .expect("mock lock poisoned")
            .clone();
        match sender {
            Some(tx) => tx.send(advertisement).await.is_ok(),
            None => false,
        }
    }

    /// Whether a subscription channel is currently attached and open.
    #[must_use]
    pub fn has_subscriber(&self) -> bool {
        self.inner
            .subscriber
            .lock()
            .expect("mock lock poisoned")
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RadioAdapter for MockAdapter {
    async fn state(&self) -> AdapterState {
        *self.inner.state.borrow()
    }

    async fn next_state_change(&self) -> AdapterState {
        let mut rx = self.inner.state.subscribe();
        if rx.changed().await.is_ok() {
            *rx.borrow()
        } else {
            AdapterState::Unknown
        }
    }

    async fn start_scanning(&self) -> Result<(), AdapterError> {
        let failure = self
            .inner
            .fail_scan_start
            .lock()
            .expect("mock lock poisoned")
            .take();
        if let Some(message) = failure {
            return Err(AdapterError::ScanStart(message));
        }
        self.inner.scanning.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_scanning(&self) {
        self.inner.scanning.store(false, Ordering::SeqCst);
    }

    async fn is_scanning(&self) -> bool {
        self.inner.scanning.load(Ordering::SeqCst)
    }

    async fn subscribe(&self) -> mpsc::Receiver<RawAdvertisement> {
        let (tx, rx) = mpsc::channel(ADVERTISEMENT_CHANNEL_CAPACITY);
        *self
            .inner
            .subscriber
            .lock()
            .expect("mock lock poisoned") = Some(tx);
        rx
    }
}
