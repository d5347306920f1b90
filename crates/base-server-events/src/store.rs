//! The event store: best-effort append, newest-first query.
//!
//! Logging an API call must never take down the request that produced it,
//! so neither operation here returns an error. Failures are logged through
//! `tracing` and counted in [`StoreStats`]; that is the only place they
//! surface.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::event::{ApiEvent, NewEvent};
use crate::key::UnitKey;
use crate::storage::{FsStorage, MemoryStorage, UnitStorage};

/// Number of events returned when the caller does not say.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// How many fresh keys an append tries before giving up on a collision.
const MAX_KEY_ATTEMPTS: u32 = 3;

/// Counters for failures the store absorbed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Appends that could not be persisted.
    pub failed_appends: u64,
    /// Distinct units that queries skipped because they could not be read
    /// or decoded. A unit is counted once however often it is met.
    pub skipped_units: u64,
}

/// Append-only event log over a [`UnitStorage`] backend.
pub struct EventStore {
    storage: Arc<dyn UnitStorage>,
    sequence: AtomicU64,
    failed_appends: AtomicU64,
    skipped_units: Mutex<BTreeSet<UnitKey>>,
}

impl EventStore {
    /// Create a store over any backend.
    pub fn new(storage: Arc<dyn UnitStorage>) -> Self {
        Self {
            storage,
            sequence: AtomicU64::new(0),
            failed_appends: AtomicU64::new(0),
            skipped_units: Mutex::new(BTreeSet::new()),
        }
    }

    /// Create a store writing one JSON file per event into `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsStorage::new(dir)))
    }

    /// Create a store that keeps events in memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Record a handled API call.
    ///
    /// Stamps the event with the current time and writes it as a new
    /// unit. Fire-and-forget: any failure is logged, counted, and dropped.
    pub fn append(&self, event: NewEvent) {
        let route = event.route.clone();
        match self.try_append(event) {
            Ok(key) => debug!(%key, route, "event appended"),
            Err(e) => {
                self.failed_appends.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, route, "failed to persist API event");
            }
        }
    }

    /// Return up to `limit` events, newest first.
    ///
    /// Takes the `limit` newest units by key and decodes each; units that
    /// cannot be read or decoded are skipped, so the result can be shorter
    /// than `limit` even when more units exist. Never fails: an absent or
    /// unreadable storage area yields an empty list.
    pub fn query_recent(&self, limit: usize) -> Vec<ApiEvent> {
        if limit == 0 {
            return Vec::new();
        }

        let mut keys = match self.storage.list_units() {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "failed to list event units");
                return Vec::new();
            }
        };
        keys.sort_unstable_by(|a, b| b.cmp(a));
        keys.truncate(limit);

        let mut events = Vec::with_capacity(keys.len());
        for key in &keys {
            match self.read_event(key) {
                Ok(event) => events.push(event),
                Err(e) => {
                    self.note_skipped(key);
                    debug!(%key, error = %e, "skipping unreadable event unit");
                }
            }
        }
        events
    }

    /// Snapshot of the absorbed-failure counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            failed_appends: self.failed_appends.load(Ordering::Relaxed),
            skipped_units: self
                .skipped_units
                .lock()
                .map_or(0, |skipped| u64::try_from(skipped.len()).unwrap_or(u64::MAX)),
        }
    }

    fn note_skipped(&self, key: &UnitKey) {
        let first_time = self
            .skipped_units
            .lock()
            .is_ok_and(|mut skipped| skipped.insert(key.clone()));
        if first_time {
            warn!(%key, "event unit cannot be decoded and will be skipped");
        }
    }

    fn try_append(&self, event: NewEvent) -> Result<UnitKey, StorageError> {
        let record = event.stamp(Utc::now());
        let contents = serde_json::to_vec(&record)?;

        let mut last_err = None;
        for _ in 0..MAX_KEY_ATTEMPTS {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            let key = UnitKey::for_instant(record.timestamp, sequence);
            match self.storage.write_unit(&key, &contents) {
                Ok(()) => return Ok(key),
                Err(e @ StorageError::AlreadyExists(_)) => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| StorageError::AlreadyExists(record.route)))
    }

    fn read_event(&self, key: &UnitKey) -> Result<ApiEvent, StorageError> {
        let bytes = self.storage.read_unit(key)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
