use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::snapshot::HistorySeries;

/// Key-value string store used as the local history cache.
///
/// Mirrors a browser localStorage surface: strings in, strings out,
/// one fixed key. Implementations must not fail the read path on
/// malformed content — that is the caller's concern.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&mut self, key: &str) -> Result<(), CoreError>;
}

/// Remote durable copy of the history series.
///
/// Unavailability is an expected condition — callers degrade to
/// local-only operation and must never surface it to the user.
#[async_trait]
pub trait RemoteHistoryStore: Send + Sync {
    /// Load the remote series. `Ok(None)` means the store has no data,
    /// which is different from the store being unreachable.
    async fn load(&self) -> Result<Option<HistorySeries>, CoreError>;

    /// Replace the remote series with `series`.
    async fn save(&self, series: &HistorySeries) -> Result<(), CoreError>;
}
