use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::holding::Quote;
use crate::models::news::NewsArticle;

/// Trait abstraction over the market-data source.
///
/// Production code talks to the caching proxy over HTTP; tests swap in
/// an in-memory implementation. The gateway layer above this trait adds
/// batching, timeouts, and the bounded-age cache.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Current price and day change for one ticker.
    async fn quote(&self, ticker: &str) -> Result<Quote, CoreError>;

    /// Recent articles for one ticker. An empty list is a valid answer.
    async fn news(&self, ticker: &str) -> Result<Vec<NewsArticle>, CoreError>;
}
