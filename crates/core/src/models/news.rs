use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single news article as returned by the market-data proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub headline: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub url: String,

    /// Publication instant (unix seconds on the wire)
    #[serde(with = "chrono::serde::ts_seconds")]
    pub published_at: DateTime<Utc>,
}
