//! Per-key failure window records.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Failed-attempt state for one client key within the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Failed attempts counted in the current window
    pub failures: u32,
    /// When the current window started (first failure)
    pub window_start: Instant,
}

impl AttemptRecord {
    /// Whether this record's window has lapsed as of `now`.
    pub fn lapsed(&self, window: Duration, now: Instant) -> bool {
        now.duration_since(self.window_start) > window
    }

    /// Time remaining until the window expires, clamped to zero.
    pub fn remaining(&self, window: Duration, now: Instant) -> Duration {
        (self.window_start + window).saturating_duration_since(now)
    }
}

/// A concurrent mapping from client key to failure window record.
///
/// The store exclusively owns all records. It is sharded per key, so
/// operations on unrelated keys never contend on a shared lock.
#[derive(Debug, Default)]
pub struct AttemptStore {
    records: DashMap<String, AttemptRecord>,
}

impl AttemptStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Get a copy of the record for a key, if one exists.
    ///
    /// Reads never mutate: a lapsed record is returned as-is and left in
    /// place until the next failure replaces it or a success removes it.
    pub fn get(&self, key: &str) -> Option<AttemptRecord> {
        self.records.get(key).map(|r| *r)
    }

    /// Record one failure for a key as a single atomic read-modify-write.
    ///
    /// A missing or lapsed record is replaced with a fresh window at count 1;
    /// otherwise the count increments in place. Returns the record after the
    /// update. Concurrent failures for the same key serialize on the entry,
    /// so no increment is lost and only one of two racing resets wins.
    pub fn record_failure(&self, key: &str, window: Duration) -> AttemptRecord {
        let now = Instant::now();
        let mut entry = self
            .records
            .entry(key.to_string())
            .and_modify(|rec| {
                if rec.lapsed(window, now) {
                    rec.failures = 1;
                    rec.window_start = now;
                } else {
                    rec.failures += 1;
                }
            })
            .or_insert(AttemptRecord {
                failures: 1,
                window_start: now,
            });
        *entry.value_mut()
    }

    /// Remove the record for a key entirely. Absence is not an error.
    pub fn clear(&self, key: &str) {
        self.records.remove(key);
    }

    /// Drop all records whose window has lapsed.
    ///
    /// Purely housekeeping: lapsed records already read as "no history", so
    /// callers run this periodically only to bound memory.
    pub fn prune(&self, window: Duration) {
        let now = Instant::now();
        self.records.retain(|_, rec| !rec.lapsed(window, now));
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
