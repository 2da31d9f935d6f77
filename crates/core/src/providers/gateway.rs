use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use std::collections::HashMap;
use tracing::debug;

use super::traits::MarketDataProvider;
use crate::errors::CoreError;
use crate::models::config::TrackerConfig;
use crate::models::holding::Quote;
use crate::models::news::NewsArticle;

struct CachedQuote {
    fetched_at: DateTime<Utc>,
    quote: Quote,
}

struct CachedNews {
    fetched_at: DateTime<Utc>,
    articles: Vec<NewsArticle>,
}

/// Bounded-age cache plus batch fan-out in front of the market-data
/// provider.
///
/// Cache strategy: quotes are good for 5 minutes, news for an hour
/// (both configurable); entries are keyed per ticker and revalidated on
/// expiry. The ticker universe is small and fixed, so the cache never
/// needs eviction.
///
/// Batch calls issue all uncached sub-requests concurrently and join.
/// Any sub-request failure (or timeout) fails the whole batch — partial
/// quote sets are never returned, the caller decides the fallback.
pub struct QuoteGateway {
    provider: Box<dyn MarketDataProvider>,
    quote_ttl: Duration,
    news_ttl: Duration,
    timeout: std::time::Duration,
    quotes: HashMap<String, CachedQuote>,
    news: HashMap<String, CachedNews>,
}

impl QuoteGateway {
    pub fn new(provider: Box<dyn MarketDataProvider>, config: &TrackerConfig) -> Self {
        Self {
            provider,
            quote_ttl: config.quote_ttl,
            news_ttl: config.news_ttl,
            timeout: config.request_timeout,
            quotes: HashMap::new(),
            news: HashMap::new(),
        }
    }

    /// Fetch current quotes for every ticker, as one all-or-nothing batch.
    pub async fn fetch_quotes(
        &mut self,
        tickers: &[String],
    ) -> Result<HashMap<String, Quote>, CoreError> {
        let now = Utc::now();
        let mut result = HashMap::new();
        let mut missing = Vec::new();

        for ticker in tickers {
            let upper = ticker.to_uppercase();
            match self.quotes.get(&upper) {
                Some(entry) if now - entry.fetched_at < self.quote_ttl => {
                    result.insert(upper, entry.quote);
                }
                _ => missing.push(upper),
            }
        }

        if !missing.is_empty() {
            debug!(count = missing.len(), "fetching quotes from provider");
            let timeout = self.timeout;
            let provider = &self.provider;
            let fetches = missing.iter().map(|ticker| async move {
                match tokio::time::timeout(timeout, provider.quote(ticker)).await {
                    Ok(Ok(quote)) => Ok((ticker.clone(), quote)),
                    Ok(Err(e)) => Err(as_unavailable(ticker, e)),
                    Err(_) => Err(CoreError::DataUnavailable(format!(
                        "{ticker}: quote request timed out"
                    ))),
                }
            });

            for (ticker, quote) in try_join_all(fetches).await? {
                self.quotes.insert(
                    ticker.clone(),
                    CachedQuote {
                        fetched_at: now,
                        quote,
                    },
                );
                result.insert(ticker, quote);
            }
        }

        Ok(result)
    }

    /// Fetch recent news for every ticker, concurrently, and merge the
    /// results in input order. Same all-or-nothing join as quotes.
    pub async fn fetch_news(
        &mut self,
        tickers: &[String],
    ) -> Result<Vec<NewsArticle>, CoreError> {
        let now = Utc::now();
        let mut merged = Vec::new();
        let mut missing = Vec::new();

        for ticker in tickers {
            let upper = ticker.to_uppercase();
            match self.news.get(&upper) {
                Some(entry) if now - entry.fetched_at < self.news_ttl => {
                    merged.extend(entry.articles.iter().cloned());
                }
                _ => missing.push(upper),
            }
        }

        if !missing.is_empty() {
            debug!(count = missing.len(), "fetching news from provider");
            let timeout = self.timeout;
            let provider = &self.provider;
            let fetches = missing.iter().map(|ticker| async move {
                match tokio::time::timeout(timeout, provider.news(ticker)).await {
                    Ok(Ok(articles)) => Ok((ticker.clone(), articles)),
                    Ok(Err(e)) => Err(as_unavailable(ticker, e)),
                    Err(_) => Err(CoreError::DataUnavailable(format!(
                        "{ticker}: news request timed out"
                    ))),
                }
            });

            for (ticker, articles) in try_join_all(fetches).await? {
                merged.extend(articles.iter().cloned());
                self.news.insert(
                    ticker,
                    CachedNews {
                        fetched_at: now,
                        articles,
                    },
                );
            }
        }

        Ok(merged)
    }

    /// Number of tickers with a cached quote (any age).
    pub fn cached_quote_count(&self) -> usize {
        self.quotes.len()
    }

    /// Drop all cached entries, forcing the next batch to hit the provider.
    pub fn clear_cache(&mut self) {
        self.quotes.clear();
        self.news.clear();
    }
}

fn as_unavailable(ticker: &str, e: CoreError) -> CoreError {
    match e {
        CoreError::DataUnavailable(_) => e,
        other => CoreError::DataUnavailable(format!("{ticker}: {other}")),
    }
}
