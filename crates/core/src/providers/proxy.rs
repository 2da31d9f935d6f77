use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::holding::Quote;
use crate::models::news::NewsArticle;

/// HTTP provider talking to the quote/news caching proxy.
///
/// - `GET {base}/quote/{ticker}` → `{ price, changeFromPrevClose }`
/// - `GET {base}/news/{ticker}` → array of articles (empty on error)
///
/// The proxy never propagates upstream transport errors; it answers with
/// a zeroed payload carrying an `error` marker instead. That payload must
/// be treated as "no data for this ticker", never as a real zero price.
pub struct ProxyProvider {
    client: Client,
    base_url: String,
}

impl ProxyProvider {
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

// ── Proxy response types ────────────────────────────────────────────

#[derive(Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    price: f64,

    #[serde(rename = "changeFromPrevClose", default)]
    change_from_prev_close: f64,

    /// Error marker set by the proxy when the upstream call failed
    #[serde(default)]
    error: Option<String>,
}

impl QuoteResponse {
    /// Map the proxy payload to a usable quote. The error marker and
    /// the exact 0/0 fallback both mean "no data for this ticker".
    fn into_quote(self, ticker: &str) -> Result<Quote, CoreError> {
        if let Some(marker) = self.error {
            return Err(CoreError::DataUnavailable(format!(
                "{ticker}: proxy reported '{marker}'"
            )));
        }
        if self.price == 0.0 && self.change_from_prev_close == 0.0 {
            return Err(CoreError::DataUnavailable(format!(
                "{ticker}: proxy returned an empty quote"
            )));
        }
        Ok(Quote::new(self.price, self.change_from_prev_close))
    }
}

#[async_trait]
impl MarketDataProvider for ProxyProvider {
    fn name(&self) -> &str {
        "Proxy"
    }

    async fn quote(&self, ticker: &str) -> Result<Quote, CoreError> {
        let upper = ticker.to_uppercase();
        let url = format!("{}/quote/{upper}", self.base_url);

        let resp: QuoteResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Proxy".into(),
                message: format!("Failed to parse quote for {upper}: {e}"),
            })?;

        resp.into_quote(&upper)
    }

    async fn news(&self, ticker: &str) -> Result<Vec<NewsArticle>, CoreError> {
        let upper = ticker.to_uppercase();
        let url = format!("{}/news/{upper}", self.base_url);

        let articles: Vec<NewsArticle> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Proxy".into(),
                message: format!("Failed to parse news for {upper}: {e}"),
            })?;

        // The proxy answers errors with an empty array; articles without a
        // headline are upstream noise and dropped here.
        Ok(articles.into_iter().filter(|a| !a.headline.is_empty()).collect())
    }
}
