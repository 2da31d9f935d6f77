use chrono::{Duration, FixedOffset, NaiveTime};

/// One basket member: ticker plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketEntry {
    pub ticker: String,
    pub name: String,
}

impl BasketEntry {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            name: name.into(),
        }
    }
}

/// Trading-session bounds in a fixed reference time zone, plus the
/// valuation snapshot cadence.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed UTC offset of the reference market (no DST handling)
    pub utc_offset: FixedOffset,

    /// Session open wall-clock time in the reference zone
    pub open: NaiveTime,

    /// Session close wall-clock time in the reference zone
    pub close: NaiveTime,

    /// Spacing between scheduled valuation snapshots
    pub snapshot_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // US Eastern standard time
            utc_offset: FixedOffset::west_opt(5 * 3600).expect("valid offset"),
            open: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
            close: NaiveTime::from_hms_opt(16, 0, 0).expect("valid time"),
            snapshot_interval: Duration::minutes(5),
        }
    }
}

/// Retention and dedupe tuning for the value-history series.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Minimum separation between two persisted snapshots at write time
    pub write_dedupe_window: Duration,

    /// Bucket width for the read-time cleanup pass
    pub cleanup_dedupe_window: Duration,

    /// Maximum persisted series length (oldest non-seed evicted beyond it)
    pub retention_cap: usize,

    /// Minimum value delta before a transient "current" point is shown
    pub transient_threshold: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            write_dedupe_window: Duration::seconds(30),
            cleanup_dedupe_window: Duration::seconds(60),
            retention_cap: 500,
            transient_threshold: 0.01,
        }
    }
}

/// Full session configuration: fixed basket, investment amount, session
/// window, history tuning, and gateway cache ages. All constants — there
/// is no runtime flag surface.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub basket: Vec<BasketEntry>,
    pub initial_investment: f64,
    pub session: SessionConfig,
    pub history: HistoryConfig,

    /// Maximum age of a cached quote before revalidation
    pub quote_ttl: Duration,

    /// Maximum age of cached news before revalidation
    pub news_ttl: Duration,

    /// Upper bound on any single provider call
    pub request_timeout: std::time::Duration,

    /// How many merged articles the news feed keeps
    pub news_limit: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            basket: default_basket(),
            initial_investment: 10_000.0,
            session: SessionConfig::default(),
            history: HistoryConfig::default(),
            quote_ttl: Duration::minutes(5),
            news_ttl: Duration::hours(1),
            request_timeout: std::time::Duration::from_secs(10),
            news_limit: 7,
        }
    }
}

/// The default 16-stock basket.
pub fn default_basket() -> Vec<BasketEntry> {
    [
        ("GOOGL", "Alphabet (Google)"),
        ("AMZN", "Amazon"),
        ("AMGN", "Amgen"),
        ("BA", "Boeing"),
        ("CAT", "Caterpillar"),
        ("JNJ", "Johnson & Johnson"),
        ("NEE", "NextEra Energy"),
        ("NKE", "Nike, Inc."),
        ("NOC", "Northrop Grumman"),
        ("RMD", "ResMed"),
        ("RIVN", "Rivian"),
        ("RTX", "RTX"),
        ("SWK", "Stanley Black & Decker"),
        ("SYK", "Stryker"),
        ("TGT", "Target"),
        ("VZ", "Verizon"),
    ]
    .into_iter()
    .map(|(t, n)| BasketEntry::new(t, n))
    .collect()
}
