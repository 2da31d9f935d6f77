use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{debug, info, warn};

use crate::models::config::{HistoryConfig, SessionConfig};
use crate::models::snapshot::{HistoryFilter, HistorySeries, Snapshot};
use crate::services::market_clock;
use crate::storage::traits::{KeyValueStore, RemoteHistoryStore};
use crate::storage::HISTORY_KEY;

/// Which source the reconciliation adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileSource {
    /// Remote store had data; local cache overwritten to match
    Remote,
    /// Remote absent or unreachable; local cache used
    Local,
    /// Both empty; a fresh series was seeded at market open
    Seeded,
}

/// Outcome of one snapshot write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendResult {
    /// A persisted snapshot already sits within the dedupe window —
    /// same observation, nothing written
    Discarded,
    /// Appended; `evicted` oldest entries fell off the retention cap
    Appended { evicted: usize },
}

/// Append-only, deduplicated portfolio value history.
///
/// Owns the in-memory series plus both physical copies: the local
/// key-value cache (written synchronously) and the remote store
/// (best-effort — a failed remote save is logged and never rolls back
/// the local append).
pub struct HistoryLedger {
    series: HistorySeries,
    local: Box<dyn KeyValueStore>,
    remote: Box<dyn RemoteHistoryStore>,
    config: HistoryConfig,
}

impl HistoryLedger {
    pub fn new(
        local: Box<dyn KeyValueStore>,
        remote: Box<dyn RemoteHistoryStore>,
        config: HistoryConfig,
    ) -> Self {
        Self {
            series: HistorySeries::new(),
            local,
            remote,
            config,
        }
    }

    /// The current persisted series, ordered by timestamp.
    pub fn series(&self) -> &HistorySeries {
        &self.series
    }

    /// Merge the two physical copies into one authoritative series.
    ///
    /// Remote wins when present and non-empty (local is overwritten to
    /// match). A failed or empty remote degrades to the local cache;
    /// malformed local content is cleared and treated as empty. When
    /// both are empty the series is seeded with a single static
    /// snapshot: the previous-close portfolio value, stamped at the
    /// most recent session open. Never fatal.
    pub async fn reconcile(
        &mut self,
        session: &SessionConfig,
        seed_value: f64,
        now: DateTime<Utc>,
    ) -> ReconcileSource {
        match self.remote.load().await {
            Ok(Some(series)) if !series.is_empty() => {
                debug!(len = series.len(), "adopting remote history");
                self.series = series;
                self.persist_local();
                return ReconcileSource::Remote;
            }
            Ok(_) => debug!("remote history empty, falling back to local"),
            Err(e) => warn!("remote history unavailable, using local only: {e}"),
        }

        if let Some(series) = self.load_local() {
            if !series.is_empty() {
                self.series = series;
                return ReconcileSource::Local;
            }
        }

        let open = market_clock::last_session_open(session, now);
        info!(value = seed_value, "seeding fresh history at session open");
        self.series = HistorySeries::from_snapshots(vec![Snapshot::seed(open, seed_value)]);
        self.persist_local();
        self.persist_remote().await;
        ReconcileSource::Seeded
    }

    /// Record one value observation.
    ///
    /// Discards (without error) when any persisted snapshot lies within
    /// the write dedupe window of `at`. Otherwise inserts in timestamp
    /// order, trims to the retention cap, writes the local cache
    /// synchronously, then tries the remote store.
    pub async fn append_snapshot(&mut self, value: f64, at: DateTime<Utc>) -> AppendResult {
        if self
            .series
            .has_neighbor_within(at, self.config.write_dedupe_window)
        {
            debug!(%at, "snapshot within dedupe window, discarded");
            return AppendResult::Discarded;
        }

        self.series.insert_ordered(Snapshot::observed(at, value));
        let evicted = self.series.evict_to_cap(self.config.retention_cap);

        self.persist_local();
        self.persist_remote().await;
        AppendResult::Appended { evicted }
    }

    /// Idempotent cleanup: bucket timestamps into cleanup-window slots,
    /// keep the chronologically first snapshot of each bucket, and write
    /// the cleaned series back to both stores.
    pub async fn deduplicate(&mut self) {
        let width = self.config.cleanup_dedupe_window.num_seconds().max(1);
        let mut last_bucket: Option<i64> = None;
        let before = self.series.len();

        // Series is timestamp-ordered, so one forward pass suffices and
        // re-running on the output changes nothing.
        self.series.retain(|s| {
            let bucket = s.timestamp.timestamp().div_euclid(width);
            if last_bucket == Some(bucket) {
                false
            } else {
                last_bucket = Some(bucket);
                true
            }
        });

        if self.series.len() != before {
            debug!(removed = before - self.series.len(), "history deduplicated");
        }
        self.persist_local();
        self.persist_remote().await;
    }

    /// Time-filtered chronological view, with one transient
    /// current-value point appended when it differs from the last real
    /// point by more than the display threshold. The transient point is
    /// for rendering only and never reaches `append_snapshot`.
    ///
    /// `Today` means the current calendar day in the session's reference
    /// zone, so an evening render still shows the afternoon's points.
    pub fn view_filtered(
        &self,
        session: &SessionConfig,
        filter: HistoryFilter,
        now: DateTime<Utc>,
        current_value: f64,
    ) -> Vec<Snapshot> {
        let cutoff = match filter {
            HistoryFilter::Today => {
                let local_date = now.with_timezone(&session.utc_offset).date_naive();
                Some(market_clock::at_local(session, local_date, NaiveTime::MIN))
            }
            HistoryFilter::Last5Days => Some(now - Duration::days(5)),
            HistoryFilter::LastMonth => Some(now - Duration::days(30)),
            HistoryFilter::All => None,
        };

        let mut view: Vec<Snapshot> = self
            .series
            .iter()
            .filter(|s| cutoff.map_or(true, |c| s.timestamp >= c))
            .cloned()
            .collect();

        let differs = view
            .last()
            .map(|last| (current_value - last.value).abs() > self.config.transient_threshold)
            .unwrap_or(true);
        if differs {
            view.push(Snapshot::transient(now, current_value));
        }
        view
    }

    // ── Physical copies ─────────────────────────────────────────────

    /// Read the local cache; corrupt content is cleared and reported as
    /// absent so the read path never crashes.
    fn load_local(&mut self) -> Option<HistorySeries> {
        let raw = match self.local.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("local history unreadable, treating as empty: {e}");
                let _ = self.local.remove(HISTORY_KEY);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Snapshot>>(&raw) {
            Ok(snapshots) => Some(HistorySeries::from_snapshots(snapshots)),
            Err(e) => {
                warn!("local history corrupt, clearing: {e}");
                let _ = self.local.remove(HISTORY_KEY);
                None
            }
        }
    }

    fn persist_local(&mut self) {
        match serde_json::to_string(self.series.as_slice()) {
            Ok(raw) => {
                if let Err(e) = self.local.set(HISTORY_KEY, &raw) {
                    warn!("failed to write local history cache: {e}");
                }
            }
            Err(e) => warn!("failed to serialize history: {e}"),
        }
    }

    async fn persist_remote(&self) {
        if let Err(e) = self.remote.save(&self.series).await {
            warn!("remote history save failed, continuing local-only: {e}");
        }
    }
}
