use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::traits::RemoteHistoryStore;
use crate::errors::CoreError;
use crate::models::snapshot::{HistorySeries, Snapshot};

/// Wire format version for history uploads.
const UPLOAD_VERSION: u32 = 1;

/// HTTP-backed remote history store.
///
/// - `GET {base}/portfolio-history` → `{ portfolioHistory: [...] }`
/// - `POST {base}/portfolio-update` with the full series, a timestamp
///   and a format version → `{ success: bool }`
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    #[serde(default)]
    portfolio_history: Vec<Snapshot>,
}

impl HistoryResponse {
    /// An empty (or absent) history array means "no data yet", which is
    /// distinct from the store being unreachable.
    fn into_series(self) -> Option<HistorySeries> {
        if self.portfolio_history.is_empty() {
            None
        } else {
            Some(HistorySeries::from_snapshots(self.portfolio_history))
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    portfolio_history: &'a [Snapshot],
    #[serde(with = "chrono::serde::ts_seconds")]
    timestamp: chrono::DateTime<Utc>,
    version: u32,
}

#[derive(Deserialize)]
struct UpdateResponse {
    #[serde(default)]
    success: bool,
}

#[async_trait]
impl RemoteHistoryStore for HttpRemoteStore {
    async fn load(&self) -> Result<Option<HistorySeries>, CoreError> {
        let url = format!("{}/portfolio-history", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::RemoteUnavailable(CoreError::from(e).to_string()))?;

        if !resp.status().is_success() {
            return Err(CoreError::RemoteUnavailable(format!(
                "history load answered {}",
                resp.status()
            )));
        }

        let body: HistoryResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::RemoteUnavailable(format!("unparsable history: {e}")))?;

        Ok(body.into_series())
    }

    async fn save(&self, series: &HistorySeries) -> Result<(), CoreError> {
        let url = format!("{}/portfolio-update", self.base_url);
        let request = UpdateRequest {
            portfolio_history: series.as_slice(),
            timestamp: Utc::now(),
            version: UPLOAD_VERSION,
        };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::RemoteUnavailable(CoreError::from(e).to_string()))?;

        if !resp.status().is_success() {
            return Err(CoreError::RemoteUnavailable(format!(
                "history save answered {}",
                resp.status()
            )));
        }

        let body: UpdateResponse = resp
            .json()
            .await
            .map_err(|e| CoreError::RemoteUnavailable(format!("unparsable save reply: {e}")))?;

        if !body.success {
            return Err(CoreError::RemoteUnavailable(
                "history save reported failure".into(),
            ));
        }
        Ok(())
    }
}
