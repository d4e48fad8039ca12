//! Scan session orchestration.
//!
//! [`BeaconScanner`] ties the pieces together: it gates on adapter
//! readiness, issues the scan-start command, and runs a session task that
//! owns the dedup registry and multiplexes the advertisement stream, the
//! sweep timer and shutdown on a single `select!` loop. Advertisements
//! are therefore processed strictly in arrival order, and the registry
//! needs no locking - nothing outside the session task can reach it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tracing::{debug, trace, warn};
use utoipa::ToSchema;

use crate::adapter::{AdapterError, RadioAdapter, RawAdvertisement};
use crate::decoder::{AdvertisementDecoder, StandardDecoder};
use crate::gate::AdapterGate;
use crate::registry::BeaconRegistry;
use crate::types::BeaconRecord;

/// Consumer callback invoked once per dispatched beacon sighting.
pub type BeaconHandler = Arc<dyn Fn(BeaconRecord) + Send + Sync>;

type SharedHandler = Arc<RwLock<Option<BeaconHandler>>>;

/// Lifecycle state of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// No session; `start` may be called.
    Idle,
    /// `start` is waiting for the adapter to become ready.
    AwaitingAdapter,
    /// A session is active and processing advertisements.
    Scanning,
    /// The last `start` failed; a new `start` is required.
    Failed,
}

/// Errors surfaced by [`BeaconScanner::start`].
///
/// These are the only errors the engine propagates; everything that can
/// go wrong per-event (undecodable payloads, duplicate keys) is normal
/// control flow.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The adapter gate or the scan-start command failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// A session is already active; call `stop` first.
    #[error("a scan session is already active")]
    AlreadyScanning,
}

/// Orchestrates the scan lifecycle against one radio adapter.
///
/// ```no_run
/// # use std::time::Duration;
/// # use beaconwatch_core::adapter::RadioAdapter;
/// # use beaconwatch_core::scanner::{BeaconScanner, ScanError};
/// # async fn example<A: RadioAdapter>(mut scanner: BeaconScanner<A>) -> Result<(), ScanError> {
/// scanner.set_handler(|beacon| println!("{} {}", beacon.kind, beacon.id));
/// scanner.start(Duration::from_secs(10)).await?;
/// // ... later
/// scanner.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct BeaconScanner<A: RadioAdapter> {
    adapter: Arc<A>,
    decoder: Arc<dyn AdvertisementDecoder>,
    gate: AdapterGate,
    handler: SharedHandler,
    state: ScanState,
    session: Option<Session>,
}

struct Session {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    grace_period: Option<Duration>,
}

impl<A: RadioAdapter> BeaconScanner<A> {
    /// Creates a scanner using the [`StandardDecoder`].
    pub fn new(adapter: A) -> Self {
        Self::with_decoder(adapter, Arc::new(StandardDecoder::new()))
    }

    /// Creates a scanner with a custom advertisement decoder.
    pub fn with_decoder(adapter: A, decoder: Arc<dyn AdvertisementDecoder>) -> Self {
        Self {
            adapter: Arc::new(adapter),
            decoder,
            gate: AdapterGate::new(),
            handler: Arc::new(RwLock::new(None)),
            state: ScanState::Idle,
            session: None,
        }
    }

    /// Registers the consumer callback.
    ///
    /// May be called before or after `start`; a consumer attached
    /// mid-session receives subsequent dispatches. Sightings dispatched
    /// while no consumer is attached are dropped, not queued.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(BeaconRecord) + Send + Sync + 'static,
    {
        *self
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    /// Removes the consumer callback.
    pub fn clear_handler(&self) {
        *self
            .handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// The active session's grace period; `None` when idle or when the
    /// session runs with deduplication disabled.
    #[must_use]
    pub fn grace_period(&self) -> Option<Duration> {
        self.session.as_ref().and_then(|s| s.grace_period)
    }

    /// Starts a scan session.
    ///
    /// A positive `grace_period` enables deduplication: each beacon key
    /// is delivered once, then suppressed until the periodic sweep
    /// (running at half the grace period) evicts it. A zero grace period
    /// disables deduplication and every decoded sighting is delivered.
    ///
    /// # Errors
    ///
    /// [`ScanError::AlreadyScanning`] when a session is active;
    /// [`ScanError::Adapter`] when the adapter settles in a non-ready
    /// state or rejects the scan-start command. A failed start leaves no
    /// subscription, no registry and no timer behind.
    pub async fn start(&mut self, grace_period: Duration) -> Result<(), ScanError> {
        if self.session.is_some() {
            return Err(ScanError::AlreadyScanning);
        }

        self.state = ScanState::AwaitingAdapter;
        if let Err(e) = self.gate.await_ready(self.adapter.as_ref()).await {
            self.state = ScanState::Failed;
            return Err(e.into());
        }
        if let Err(e) = self.adapter.start_scanning().await {
            self.state = ScanState::Failed;
            return Err(e.into());
        }

        let events = self.adapter.subscribe().await;
        let dedup_grace = (grace_period > Duration::ZERO).then_some(grace_period);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_session(SessionTask {
            events,
            shutdown: shutdown_rx,
            grace_period: dedup_grace,
            decoder: Arc::clone(&self.decoder),
            handler: Arc::clone(&self.handler),
        }));

        self.session = Some(Session {
            shutdown: shutdown_tx,
            task,
            grace_period: dedup_grace,
        });
        self.state = ScanState::Scanning;
        debug!(
            grace_period_ms = grace_period.as_millis() as u64,
            dedup = dedup_grace.is_some(),
            "scan session started"
        );
        Ok(())
    }

    /// Stops the current session.
    ///
    /// Detaches the event subscription, destroys the registry, cancels
    /// the sweep timer (a no-op when none was armed) and stops the
    /// adapter if it reports scanning. Idempotent: calling this while
    /// idle does nothing and succeeds.
    pub async fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            // The session task owns the subscription and the registry;
            // joining it guarantees both are gone before the adapter is
            // touched, so no in-flight event can race the teardown.
            let _ = session.shutdown.send(());
            let _ = session.task.await;
            debug!("scan session stopped");
        }
        if self.adapter.is_scanning().await {
            self.adapter.stop_scanning().await;
        }
        self.state = ScanState::Idle;
    }
}

struct SessionTask {
    events: mpsc::Receiver<RawAdvertisement>,
    shutdown: oneshot::Receiver<()>,
    grace_period: Option<Duration>,
    decoder: Arc<dyn AdvertisementDecoder>,
    handler: SharedHandler,
}

async fn run_session(mut task: SessionTask) {
    let mut registry = BeaconRegistry::new();
    let mut sweep = task.grace_period.map(|grace| {
        let tick = (grace / 2).max(Duration::from_millis(1));
        tokio::time::interval_at(Instant::now() + tick, tick)
    });

    loop {
        tokio::select! {
            biased;

            _ = &mut task.shutdown => break,

            _ = next_tick(&mut sweep) => {
                if let Some(grace) = task.grace_period {
                    let evicted = registry.evict_stale(grace, Instant::now());
                    if evicted > 0 {
                        trace!(evicted, tracked = registry.len(), "swept stale beacons");
                    }
                }
            }

            advertisement = task.events.recv() => match advertisement {
                Some(advertisement) => {
                    handle_advertisement(&task, &mut registry, advertisement);
                }
                None => {
                    debug!("advertisement stream closed, ending scan session loop");
                    break;
                }
            },
        }
    }
}

/// Resolves on the next sweep tick; pends forever when no timer is armed
/// (deduplication disabled).
async fn next_tick(sweep: &mut Option<Interval>) -> Instant {
    match sweep {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}

fn handle_advertisement(
    task: &SessionTask,
    registry: &mut BeaconRegistry,
    advertisement: RawAdvertisement,
) {
    let Some(decoded) = task.decoder.decode(&advertisement) else {
        // Non-beacon traffic is expected steady state, not an error.
        return;
    };

    let record = BeaconRecord {
        id: decoded.id,
        kind: decoded.kind,
        address: advertisement.address,
        local_name: advertisement.local_name,
        rssi: advertisement.rssi,
        last_seen: Utc::now(),
        payload: decoded.payload,
    };

    if task.grace_period.is_none() {
        dispatch(&task.handler, record);
    } else if registry.track_if_novel(&record, Instant::now()) {
        dispatch(&task.handler, record);
    } else {
        trace!(key = record.dedup_key(), "suppressed duplicate sighting");
    }
}

/// Invokes the consumer, if one is attached, isolating its faults: a
/// panicking consumer loses that sighting but cannot corrupt the
/// registry or the session loop.
fn dispatch(handler: &SharedHandler, record: BeaconRecord) {
    let callback = handler
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let Some(callback) = callback else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| callback(record))).is_err() {
        warn!("beacon consumer panicked; sighting dropped, session state unaffected");
    }
}
