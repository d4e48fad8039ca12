//! Tracked-beacon table with grace-period aging.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::types::BeaconRecord;

/// In-memory table of beacons dispatched within the current grace window.
///
/// Keys are [`BeaconRecord::dedup_key`] values. An entry is created when a
/// record is dispatched and is never refreshed by later sightings: it ages
/// from its dispatch instant until the periodic sweep evicts it, at which
/// point the next sighting counts as novel again. The table is owned
/// exclusively by the scan session; it is cleared wholesale on stop.
#[derive(Debug, Default)]
pub struct BeaconRegistry {
    entries: HashMap<String, TrackedBeacon>,
}

#[derive(Debug)]
struct TrackedBeacon {
    record: BeaconRecord,
    seen_at: Instant,
}

impl BeaconRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks the record under its dedup key if the key is not present.
    ///
    /// Returns `true` when the record was inserted (the sighting is novel
    /// and must be dispatched) and `false` when the key is already
    /// tracked. An existing entry is left untouched so it keeps aging
    /// from its original dispatch instant.
    pub fn track_if_novel(&mut self, record: &BeaconRecord, seen_at: Instant) -> bool {
        let key = record.dedup_key();
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(
            key.to_string(),
            TrackedBeacon {
                record: record.clone(),
                seen_at,
            },
        );
        true
    }

    /// Removes every entry older than the grace period.
    ///
    /// An entry whose age is exactly the grace period survives until the
    /// next sweep; ticks always land late on real timers, so the strict
    /// comparison only matters under a paused test clock.
    ///
    /// Returns the number of evicted entries.
    pub fn evict_stale(&mut self, grace_period: std::time::Duration, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, tracked| now.saturating_duration_since(tracked.seen_at) <= grace_period);
        before - self.entries.len()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no beacon is currently tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the given dedup key is currently tracked.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The record dispatched for the given key, while it is tracked.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BeaconRecord> {
        self.entries.get(key).map(|tracked| &tracked.record)
    }
}
