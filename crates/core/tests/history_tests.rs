// ═══════════════════════════════════════════════════════════════════
// HistoryLedger Tests — reconcile, append, dedupe, filtered views
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use paper_etf_core::errors::CoreError;
use paper_etf_core::models::config::{HistoryConfig, SessionConfig};
use paper_etf_core::models::snapshot::{HistoryFilter, HistorySeries, Snapshot};
use paper_etf_core::services::history_service::{AppendResult, HistoryLedger, ReconcileSource};
use paper_etf_core::storage::traits::{KeyValueStore, RemoteHistoryStore};
use paper_etf_core::storage::HISTORY_KEY;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

/// A weekday morning inside the default session (Wed 2024-01-10 15:00 UTC
/// = 10:00 US Eastern standard).
fn session_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).single().unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Shared test doubles
// ═══════════════════════════════════════════════════════════════════

/// Key-value store with externally inspectable contents.
#[derive(Clone, Default)]
struct SharedLocal {
    entries: Arc<Mutex<std::collections::HashMap<String, String>>>,
}

impl SharedLocal {
    fn with_history(raw: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap()
            .insert(HISTORY_KEY.to_string(), raw.to_string());
        store
    }

    fn raw_history(&self) -> Option<String> {
        self.entries.lock().unwrap().get(HISTORY_KEY).cloned()
    }
}

impl KeyValueStore for SharedLocal {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
struct RemoteState {
    series: Option<HistorySeries>,
    fail_load: bool,
    fail_save: bool,
    save_count: usize,
}

/// Remote store double with switchable failure modes.
#[derive(Clone, Default)]
struct MockRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl MockRemote {
    fn unreachable() -> Self {
        let remote = Self::default();
        {
            let mut s = remote.state.lock().unwrap();
            s.fail_load = true;
            s.fail_save = true;
        }
        remote
    }

    fn with_series(series: HistorySeries) -> Self {
        let remote = Self::default();
        remote.state.lock().unwrap().series = Some(series);
        remote
    }

    fn saved_series(&self) -> Option<HistorySeries> {
        self.state.lock().unwrap().series.clone()
    }

    fn save_count(&self) -> usize {
        self.state.lock().unwrap().save_count
    }
}

#[async_trait]
impl RemoteHistoryStore for MockRemote {
    async fn load(&self) -> Result<Option<HistorySeries>, CoreError> {
        let s = self.state.lock().unwrap();
        if s.fail_load {
            return Err(CoreError::RemoteUnavailable("mock remote down".into()));
        }
        Ok(s.series.clone())
    }

    async fn save(&self, series: &HistorySeries) -> Result<(), CoreError> {
        let mut s = self.state.lock().unwrap();
        if s.fail_save {
            return Err(CoreError::RemoteUnavailable("mock remote down".into()));
        }
        s.series = Some(series.clone());
        s.save_count += 1;
        Ok(())
    }
}

fn ledger(local: SharedLocal, remote: MockRemote) -> HistoryLedger {
    HistoryLedger::new(Box::new(local), Box::new(remote), HistoryConfig::default())
}

fn ledger_with(
    local: SharedLocal,
    remote: MockRemote,
    config: HistoryConfig,
) -> HistoryLedger {
    HistoryLedger::new(Box::new(local), Box::new(remote), config)
}

// ═══════════════════════════════════════════════════════════════════
// reconcile
// ═══════════════════════════════════════════════════════════════════

mod reconcile {
    use super::*;

    #[tokio::test]
    async fn remote_wins_and_overwrites_local() {
        let remote_series = HistorySeries::from_snapshots(vec![
            Snapshot::seed(at(1_000), 10_000.0),
            Snapshot::observed(at(2_000), 10_100.0),
        ]);
        let local = SharedLocal::with_history(r#"[{"timestamp":9000,"value":1.0}]"#);
        let remote = MockRemote::with_series(remote_series.clone());
        let mut ledger = super::ledger(local.clone(), remote);

        let source = ledger
            .reconcile(&SessionConfig::default(), 10_000.0, session_now())
            .await;

        assert_eq!(source, ReconcileSource::Remote);
        assert_eq!(ledger.series(), &remote_series);
        // Local cache rewritten to match the adopted remote copy
        let raw = local.raw_history().unwrap();
        let cached: Vec<Snapshot> = serde_json::from_str(&raw).unwrap();
        assert_eq!(HistorySeries::from_snapshots(cached), remote_series);
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_local() {
        let local = SharedLocal::with_history(
            r#"[{"timestamp":1000,"value":10000.0,"isStatic":true},{"timestamp":2000,"value":10050.0}]"#,
        );
        let mut ledger = super::ledger(local, MockRemote::unreachable());

        let source = ledger
            .reconcile(&SessionConfig::default(), 10_000.0, session_now())
            .await;

        assert_eq!(source, ReconcileSource::Local);
        assert_eq!(ledger.series().len(), 2);
    }

    #[tokio::test]
    async fn empty_remote_falls_back_to_local() {
        let local = SharedLocal::with_history(r#"[{"timestamp":2000,"value":10050.0}]"#);
        let mut ledger = super::ledger(local, MockRemote::default());

        let source = ledger
            .reconcile(&SessionConfig::default(), 10_000.0, session_now())
            .await;
        assert_eq!(source, ReconcileSource::Local);
    }

    #[tokio::test]
    async fn both_empty_seeds_at_session_open() {
        let now = session_now();
        let remote = MockRemote::default();
        let mut ledger = super::ledger(SharedLocal::default(), remote.clone());

        let source = ledger
            .reconcile(&SessionConfig::default(), 10_000.0, now)
            .await;

        assert_eq!(source, ReconcileSource::Seeded);
        assert_eq!(ledger.series().len(), 1);
        let seed = ledger.series().first().unwrap();
        assert!(seed.is_static);
        assert_eq!(seed.value, 10_000.0);
        // Wed 2024-01-10 09:30 US Eastern = 14:30 UTC
        assert_eq!(
            seed.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).single().unwrap()
        );
        // Seed pushed to the remote copy too
        assert_eq!(remote.saved_series().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_local_is_cleared_and_seeded() {
        let local = SharedLocal::with_history("{not json!");
        let remote = MockRemote::default();
        let mut ledger = super::ledger(local.clone(), remote);

        let source = ledger
            .reconcile(&SessionConfig::default(), 9_500.0, session_now())
            .await;

        assert_eq!(source, ReconcileSource::Seeded);
        // The corrupt blob was replaced by the freshly seeded series
        let raw = local.raw_history().unwrap();
        let cached: Vec<Snapshot> = serde_json::from_str(&raw).unwrap();
        assert_eq!(cached.len(), 1);
        assert!(cached[0].is_static);
    }

    #[tokio::test]
    async fn weekend_seed_lands_on_friday_open() {
        // Saturday 2024-01-13 12:00 UTC
        let now = Utc.with_ymd_and_hms(2024, 1, 13, 12, 0, 0).single().unwrap();
        let mut ledger = super::ledger(SharedLocal::default(), MockRemote::default());

        ledger
            .reconcile(&SessionConfig::default(), 10_000.0, now)
            .await;

        let seed = ledger.series().first().unwrap();
        // Friday 2024-01-12 09:30 US Eastern = 14:30 UTC
        assert_eq!(
            seed.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 12, 14, 30, 0).single().unwrap()
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
// append_snapshot
// ═══════════════════════════════════════════════════════════════════

mod append {
    use super::*;

    #[tokio::test]
    async fn appends_and_persists_both_copies() {
        let local = SharedLocal::default();
        let remote = MockRemote::default();
        let mut ledger = super::ledger(local.clone(), remote.clone());

        let result = ledger.append_snapshot(10_050.0, at(10_000)).await;

        assert_eq!(result, AppendResult::Appended { evicted: 0 });
        assert_eq!(ledger.series().len(), 1);
        assert!(local.raw_history().is_some());
        assert_eq!(remote.save_count(), 1);
    }

    #[tokio::test]
    async fn second_write_within_window_is_discarded() {
        let mut ledger = super::ledger(SharedLocal::default(), MockRemote::default());

        let first = ledger.append_snapshot(10_050.0, at(10_000)).await;
        let second = ledger.append_snapshot(10_051.0, at(10_020)).await;

        assert_eq!(first, AppendResult::Appended { evicted: 0 });
        assert_eq!(second, AppendResult::Discarded);
        assert_eq!(ledger.series().len(), 1);
        assert_eq!(ledger.series().first().unwrap().value, 10_050.0);
    }

    #[tokio::test]
    async fn writes_outside_window_both_persist() {
        let mut ledger = super::ledger(SharedLocal::default(), MockRemote::default());

        ledger.append_snapshot(1.0, at(10_000)).await;
        let result = ledger.append_snapshot(2.0, at(10_030)).await;

        assert_eq!(result, AppendResult::Appended { evicted: 0 });
        assert_eq!(ledger.series().len(), 2);
    }

    #[tokio::test]
    async fn remote_failure_does_not_roll_back_local_append() {
        let local = SharedLocal::default();
        let mut ledger = super::ledger(local.clone(), MockRemote::unreachable());

        let result = ledger.append_snapshot(10_050.0, at(10_000)).await;

        assert_eq!(result, AppendResult::Appended { evicted: 0 });
        assert_eq!(ledger.series().len(), 1);
        let cached: Vec<Snapshot> =
            serde_json::from_str(&local.raw_history().unwrap()).unwrap();
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn retention_cap_evicts_oldest_but_keeps_seed() {
        let config = HistoryConfig {
            retention_cap: 3,
            ..HistoryConfig::default()
        };
        let mut ledger =
            super::ledger_with(SharedLocal::default(), MockRemote::default(), config);

        // Seed via reconcile on empty stores, then fill past the cap.
        ledger
            .reconcile(&SessionConfig::default(), 10_000.0, session_now())
            .await;
        let base = session_now();
        for i in 0..4 {
            ledger
                .append_snapshot(10_000.0 + i as f64, base + chrono::Duration::minutes(i * 5))
                .await;
        }

        assert_eq!(ledger.series().len(), 3);
        assert!(ledger.series().first().unwrap().is_static);
    }
}

// ═══════════════════════════════════════════════════════════════════
// deduplicate
// ═══════════════════════════════════════════════════════════════════

mod deduplicate {
    use super::*;

    #[tokio::test]
    async fn keeps_first_snapshot_per_bucket() {
        // Snapshots at t=100s and t=115s share a 60-second bucket:
        // cleanup retains only the first.
        let local = SharedLocal::with_history(
            r#"[{"timestamp":100,"value":1.0},{"timestamp":115,"value":2.0}]"#,
        );
        let mut ledger = super::ledger(local, MockRemote::unreachable());
        ledger
            .reconcile(&SessionConfig::default(), 0.0, session_now())
            .await;
        assert_eq!(ledger.series().len(), 2);

        ledger.deduplicate().await;

        assert_eq!(ledger.series().len(), 1);
        assert_eq!(ledger.series().first().unwrap().timestamp, at(100));
        assert_eq!(ledger.series().first().unwrap().value, 1.0);
    }

    #[tokio::test]
    async fn is_idempotent() {
        let local = SharedLocal::with_history(
            r#"[{"timestamp":100,"value":1.0},{"timestamp":115,"value":2.0},
                {"timestamp":190,"value":3.0},{"timestamp":200,"value":4.0},
                {"timestamp":400,"value":5.0}]"#,
        );
        let mut ledger = super::ledger(local, MockRemote::unreachable());
        ledger
            .reconcile(&SessionConfig::default(), 0.0, session_now())
            .await;

        ledger.deduplicate().await;
        let once = ledger.series().clone();
        ledger.deduplicate().await;

        assert_eq!(ledger.series(), &once);
    }

    #[tokio::test]
    async fn writes_cleaned_series_to_both_stores() {
        let local = SharedLocal::with_history(
            r#"[{"timestamp":100,"value":1.0},{"timestamp":115,"value":2.0}]"#,
        );
        let remote = MockRemote::default();
        let mut ledger = super::ledger(local.clone(), remote.clone());
        ledger
            .reconcile(&SessionConfig::default(), 0.0, session_now())
            .await;

        ledger.deduplicate().await;

        let cached: Vec<Snapshot> =
            serde_json::from_str(&local.raw_history().unwrap()).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(remote.saved_series().unwrap().len(), 1);
    }
}

// ═══════════════════════════════════════════════════════════════════
// view_filtered
// ═══════════════════════════════════════════════════════════════════

mod view_filtered {
    use super::*;

    async fn ledger_with_series(snapshots: &str) -> HistoryLedger {
        let local = SharedLocal::with_history(snapshots);
        let mut ledger = super::ledger(local, MockRemote::unreachable());
        ledger
            .reconcile(&SessionConfig::default(), 0.0, session_now())
            .await;
        ledger
    }

    #[tokio::test]
    async fn appends_transient_current_point_when_value_moved() {
        let ledger = ledger_with_series(r#"[{"timestamp":1000,"value":10000.0}]"#).await;

        let view = ledger.view_filtered(&SessionConfig::default(), HistoryFilter::All, at(2_000), 10_010.0);

        assert_eq!(view.len(), 2);
        let current = view.last().unwrap();
        assert!(current.is_transient);
        assert_eq!(current.value, 10_010.0);
        assert_eq!(current.timestamp, at(2_000));
        // The transient point never lands in the persisted series
        assert_eq!(ledger.series().len(), 1);
    }

    #[tokio::test]
    async fn skips_transient_point_within_one_cent() {
        let ledger = ledger_with_series(r#"[{"timestamp":1000,"value":10000.0}]"#).await;

        let view = ledger.view_filtered(&SessionConfig::default(), HistoryFilter::All, at(2_000), 10_000.005);

        assert_eq!(view.len(), 1);
        assert!(!view[0].is_transient);
    }

    #[tokio::test]
    async fn filters_are_chronological_and_time_bounded() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).single().unwrap();
        let day = 86_400;
        let base = now.timestamp();
        let raw = format!(
            r#"[{{"timestamp":{},"value":1.0}},{{"timestamp":{},"value":2.0}},{{"timestamp":{},"value":3.0}}]"#,
            base - 40 * day, // ~6 weeks ago
            base - 3 * day,  // 3 days ago
            base - 3_600,    // an hour ago
        );
        let ledger = ledger_with_series(&raw).await;

        let all = ledger.view_filtered(&SessionConfig::default(), HistoryFilter::All, now, 3.0);
        assert_eq!(all.len(), 3);
        let times: Vec<i64> = all.iter().map(|s| s.timestamp.timestamp()).collect();
        let mut sorted = times.clone();
        sorted.sort_unstable();
        assert_eq!(times, sorted);

        let month = ledger.view_filtered(&SessionConfig::default(), HistoryFilter::LastMonth, now, 3.0);
        assert_eq!(month.len(), 2);

        let five_days = ledger.view_filtered(&SessionConfig::default(), HistoryFilter::Last5Days, now, 3.0);
        assert_eq!(five_days.len(), 2);

        let today = ledger.view_filtered(&SessionConfig::default(), HistoryFilter::Today, now, 3.0);
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].value, 3.0);
    }

    #[tokio::test]
    async fn today_is_the_reference_zone_day_not_utc() {
        // 2024-01-10 20:00 UTC, rendered at 02:00 UTC the next day —
        // still the same Eastern calendar day (15:00 and 21:00 local)
        let ledger = ledger_with_series(r#"[{"timestamp":1704916800,"value":1.0}]"#).await;
        let evening = Utc.with_ymd_and_hms(2024, 1, 11, 2, 0, 0).single().unwrap();

        let view =
            ledger.view_filtered(&SessionConfig::default(), HistoryFilter::Today, evening, 1.0);

        assert_eq!(view.len(), 1);
        assert!(!view[0].is_transient);
    }

    #[tokio::test]
    async fn empty_view_still_gets_current_point() {
        let mut ledger = super::ledger(SharedLocal::default(), MockRemote::unreachable());
        ledger
            .reconcile(&SessionConfig::default(), 10_000.0, session_now())
            .await;

        // Seed is from the last session open; Today on a later weekend day
        // filters it out, leaving only the transient current point.
        let saturday = Utc.with_ymd_and_hms(2024, 1, 13, 12, 0, 0).single().unwrap();
        let view = ledger.view_filtered(&SessionConfig::default(), HistoryFilter::Today, saturday, 10_123.0);

        assert_eq!(view.len(), 1);
        assert!(view[0].is_transient);
    }
}
