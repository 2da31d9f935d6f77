use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point in the portfolio value history.
///
/// Wire format is camelCase with unix-second timestamps, shared by the
/// local cache and the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Instant this value was observed
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,

    /// Total portfolio value at that instant
    pub value: f64,

    /// True only for the single synthetic market-open seed point
    #[serde(default)]
    pub is_static: bool,

    /// True for the display-only "current value" point. Transient
    /// snapshots are recomputed on every render and never persisted.
    #[serde(default)]
    pub is_transient: bool,
}

impl Snapshot {
    /// A regular persisted observation.
    pub fn observed(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            is_static: false,
            is_transient: false,
        }
    }

    /// The synthetic previous-close baseline at market open.
    pub fn seed(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            is_static: true,
            is_transient: false,
        }
    }

    /// A display-only current-value point.
    pub fn transient(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            is_static: false,
            is_transient: true,
        }
    }
}

/// Time filter for history views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFilter {
    /// Snapshots from the current calendar day in the session's zone
    Today,
    Last5Days,
    LastMonth,
    All,
}

/// Timestamp-ordered series of persisted snapshots.
///
/// Only non-transient snapshots may be stored here; ordering is
/// re-established on every mutation so readers can rely on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistorySeries {
    snapshots: Vec<Snapshot>,
}

impl HistorySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from raw snapshots, dropping transients and
    /// restoring timestamp order. Used when adopting external data.
    pub fn from_snapshots(mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.retain(|s| !s.is_transient);
        snapshots.sort_by_key(|s| s.timestamp);
        Self { snapshots }
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn first(&self) -> Option<&Snapshot> {
        self.snapshots.first()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }

    pub fn as_slice(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Insert at the sorted position (binary search, O(log n) lookup).
    /// Transient snapshots are refused outright.
    pub fn insert_ordered(&mut self, snapshot: Snapshot) {
        debug_assert!(!snapshot.is_transient);
        if snapshot.is_transient {
            return;
        }
        let pos = self
            .snapshots
            .binary_search_by_key(&snapshot.timestamp, |s| s.timestamp)
            .unwrap_or_else(|pos| pos);
        self.snapshots.insert(pos, snapshot);
    }

    /// True if any snapshot lies strictly within `window` of `at`.
    pub fn has_neighbor_within(&self, at: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.snapshots
            .iter()
            .any(|s| (s.timestamp - at).abs() < window)
    }

    /// Evict the oldest non-static snapshots until `len() <= cap`.
    /// The static seed is the chart baseline and is always retained.
    /// Returns how many snapshots were evicted.
    pub fn evict_to_cap(&mut self, cap: usize) -> usize {
        let mut evicted = 0;
        while self.snapshots.len() > cap {
            let idx = match self.snapshots.iter().position(|s| !s.is_static) {
                Some(idx) => idx,
                None => break,
            };
            self.snapshots.remove(idx);
            evicted += 1;
        }
        evicted
    }

    /// Retain only snapshots matching the predicate.
    pub fn retain<F: FnMut(&Snapshot) -> bool>(&mut self, f: F) {
        self.snapshots.retain(f);
    }
}

impl<'a> IntoIterator for &'a HistorySeries {
    type Item = &'a Snapshot;
    type IntoIter = std::slice::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}
