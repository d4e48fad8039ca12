//! Application state shared across handlers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use beaconwatch_core::config::Config;
use beaconwatch_core::scanner::BeaconScanner;
use beaconwatch_core::types::BeaconRecord;
use tokio::sync::Mutex;

/// The radio backend the server is compiled against: BlueZ in normal
/// builds, the scripted mock in tests and mock-only builds.
#[cfg(all(feature = "bluetooth", not(test)))]
pub type RadioBackend = beaconwatch_core::adapter::bluez::BluerAdapter;
/// The radio backend the server is compiled against.
#[cfg(any(not(feature = "bluetooth"), test))]
pub type RadioBackend = beaconwatch_core::adapter::mock::MockAdapter;

/// Sightings retained for `GET /api/beacons`.
const SIGHTING_LOG_CAPACITY: usize = 256;

/// Bounded in-memory log of dispatched beacon sightings.
///
/// Fed by the scanner's consumer callback; the oldest entries are shed
/// once the capacity is reached.
#[derive(Clone)]
pub struct SightingLog {
    inner: Arc<StdMutex<VecDeque<BeaconRecord>>>,
    capacity: usize,
}

impl SightingLog {
    /// Creates an empty log with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(StdMutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Appends a sighting, dropping the oldest entry when full.
    pub fn record(&self, record: BeaconRecord) {
        let mut log = self.inner.lock().expect("sighting log lock poisoned");
        if log.len() == self.capacity {
            log.pop_front();
        }
        log.push_back(record);
    }

    /// Returns the logged sightings, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BeaconRecord> {
        self.inner
            .lock()
            .expect("sighting log lock poisoned")
            .iter()
            .rev()
            .cloned()
            .collect()
    }

    /// Empties the log, returning how many entries were dropped.
    pub fn clear(&self) -> usize {
        let mut log = self.inner.lock().expect("sighting log lock poisoned");
        let dropped = log.len();
        log.clear();
        dropped
    }

    /// Number of logged sightings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("sighting log lock poisoned").len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared application state.
pub struct AppState {
    /// Configuration loaded at boot.
    pub config: Config,

    /// The scan engine. Locked only for lifecycle calls; dispatch runs
    /// inside the engine's own session task.
    pub scanner: Mutex<BeaconScanner<RadioBackend>>,

    /// Sightings delivered by the scanner's consumer callback.
    pub sightings: SightingLog,
}

/// Handlers receive the state behind an `Arc`.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Builds state around an already-constructed radio backend.
    pub fn with_backend(backend: RadioBackend, config: Config) -> SharedState {
        let sightings = SightingLog::new(SIGHTING_LOG_CAPACITY);
        let scanner = BeaconScanner::new(backend);
        let log = sightings.clone();
        scanner.set_handler(move |record| log.record(record));
        Arc::new(Self {
            config,
            scanner: Mutex::new(scanner),
            sightings,
        })
    }

    /// Builds state with the default radio backend for this build.
    ///
    /// # Errors
    ///
    /// Returns an error when the Bluetooth adapter cannot be opened.
    #[cfg(all(feature = "bluetooth", not(test)))]
    pub async fn new(config: Config) -> anyhow::Result<SharedState> {
        let backend = match config.adapter.name.as_deref() {
            Some(name) => RadioBackend::with_name(name).await?,
            None => RadioBackend::new().await?,
        };
        Ok(Self::with_backend(backend, config))
    }

    /// Builds state with the default radio backend for this build.
    ///
    /// # Errors
    ///
    /// Never fails for the mock backend.
    #[cfg(any(not(feature = "bluetooth"), test))]
    pub async fn new(config: Config) -> anyhow::Result<SharedState> {
        Ok(Self::with_backend(RadioBackend::new(), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beaconwatch_core::types::{BeaconKind, BeaconPayload, EddystoneEidFrame};
    use chrono::Utc;

    fn record(id: &str) -> BeaconRecord {
        BeaconRecord {
            id: id.to_string(),
            kind: BeaconKind::EddystoneEid,
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            local_name: None,
            rssi: None,
            last_seen: Utc::now(),
            payload: BeaconPayload::EddystoneEid(EddystoneEidFrame {
                ephemeral_id: id.to_string(),
                tx_power: -20,
            }),
        }
    }

    #[test]
    fn test_sighting_log_orders_newest_first() {
        let log = SightingLog::new(8);
        log.record(record("first"));
        log.record(record("second"));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "second");
        assert_eq!(snapshot[1].id, "first");
    }

    #[test]
    fn test_sighting_log_sheds_oldest_at_capacity() {
        let log = SightingLog::new(2);
        log.record(record("a"));
        log.record(record("b"));
        log.record(record("c"));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "c");
        assert_eq!(snapshot[1].id, "b");
    }

    #[test]
    fn test_sighting_log_clear_reports_dropped_count() {
        let log = SightingLog::new(8);
        log.record(record("a"));
        log.record(record("b"));
        assert_eq!(log.clear(), 2);
        assert!(log.is_empty());
        assert_eq!(log.clear(), 0);
    }
}
