pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::warn;

use errors::CoreError;
use models::config::TrackerConfig;
use models::news::NewsArticle;
use models::portfolio::{Portfolio, TradeExecution, TradeSide};
use models::snapshot::{HistoryFilter, HistorySeries};
use models::valuation::ValuationResult;
use models::view::DashboardView;
use providers::gateway::QuoteGateway;
use providers::traits::MarketDataProvider;
use services::history_service::{AppendResult, HistoryLedger, ReconcileSource};
use services::market_clock;
use services::portfolio_service::PortfolioService;
use services::view_service::ViewService;
use storage::traits::{KeyValueStore, RemoteHistoryStore};

/// Main entry point for the Paper ETF core library.
///
/// One instance is one paper-trading session: it owns the portfolio,
/// the quote gateway, and the value-history ledger, and every operation
/// goes through it — there is no ambient global state.
#[must_use]
pub struct PaperEtf {
    config: TrackerConfig,
    portfolio: Portfolio,
    gateway: QuoteGateway,
    ledger: HistoryLedger,
    portfolio_service: PortfolioService,
    view_service: ViewService,
}

impl std::fmt::Debug for PaperEtf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaperEtf")
            .field("holdings", &self.portfolio.holdings.len())
            .field("cash", &self.portfolio.cash)
            .field("history_len", &self.ledger.series().len())
            .finish()
    }
}

impl PaperEtf {
    /// Wire up a session from its collaborators. The portfolio stays
    /// empty until [`bootstrap`](Self::bootstrap) runs.
    pub fn new(
        config: TrackerConfig,
        provider: Box<dyn MarketDataProvider>,
        local: Box<dyn KeyValueStore>,
        remote: Box<dyn RemoteHistoryStore>,
    ) -> Self {
        let gateway = QuoteGateway::new(provider, &config);
        let ledger = HistoryLedger::new(local, remote, config.history.clone());
        Self {
            config,
            portfolio: Portfolio::default(),
            gateway,
            ledger,
            portfolio_service: PortfolioService::new(),
            view_service: ViewService::new(),
        }
    }

    // ── Session lifecycle ───────────────────────────────────────────

    /// Fetch the opening quote batch, build the equal-weight portfolio,
    /// and reconcile the value history from its two sources.
    ///
    /// Fails with `DataUnavailable` when the quote batch cannot be
    /// fetched at all, or `InsufficientData` when no ticker yields a
    /// usable previous close. History reconciliation itself never fails.
    pub async fn bootstrap(&mut self, now: DateTime<Utc>) -> Result<ReconcileSource, CoreError> {
        let tickers: Vec<String> = self
            .config
            .basket
            .iter()
            .map(|e| e.ticker.clone())
            .collect();
        let quotes = self.gateway.fetch_quotes(&tickers).await?;

        self.portfolio = self.portfolio_service.initialize(
            &self.config.basket,
            &quotes,
            self.config.initial_investment,
        )?;

        let valuation = self.portfolio_service.value(&self.portfolio);
        let source = self
            .ledger
            .reconcile(&self.config.session, valuation.value_at_prev_close, now)
            .await;
        Ok(source)
    }

    /// Refresh quotes and recompute the valuation.
    ///
    /// When the quote batch fails, last-known prices are kept and the
    /// valuation still proceeds — stale data beats no dashboard.
    pub async fn refresh(&mut self) -> ValuationResult {
        let tickers = self.portfolio.tickers();
        let quotes = match self.gateway.fetch_quotes(&tickers).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!("quote refresh failed, revaluing with last-known prices: {e}");
                Default::default()
            }
        };
        self.portfolio_service.revalue(&mut self.portfolio, &quotes)
    }

    // ── Trading ─────────────────────────────────────────────────────

    /// Execute a simulated trade against current prices.
    ///
    /// Share input is validated here at the boundary; rejected trades
    /// leave the portfolio untouched.
    pub fn trade(
        &mut self,
        ticker: &str,
        shares: f64,
        side: TradeSide,
    ) -> Result<TradeExecution, CoreError> {
        if !shares.is_finite() || shares <= 0.0 {
            return Err(CoreError::InvalidTradeInput(format!(
                "share count must be a positive number, got {shares}"
            )));
        }
        self.portfolio_service
            .execute_trade(&mut self.portfolio, ticker, shares, side)
    }

    // ── Value history ───────────────────────────────────────────────

    /// Append a value snapshot for `at`, subject to dedupe and the
    /// retention cap.
    pub async fn record_snapshot(&mut self, at: DateTime<Utc>) -> AppendResult {
        let valuation = self.portfolio_service.value(&self.portfolio);
        self.ledger.append_snapshot(valuation.total_value, at).await
    }

    /// Run the idempotent history cleanup pass.
    pub async fn deduplicate_history(&mut self) {
        self.ledger.deduplicate().await;
    }

    /// The persisted history series.
    #[must_use]
    pub fn history(&self) -> &HistorySeries {
        self.ledger.series()
    }

    // ── Views ───────────────────────────────────────────────────────

    /// Full dashboard view-model for the given history filter.
    #[must_use]
    pub fn dashboard(&self, filter: HistoryFilter, now: DateTime<Utc>) -> DashboardView {
        let valuation = self.portfolio_service.value(&self.portfolio);
        let history_view =
            self.ledger
                .view_filtered(&self.config.session, filter, now, valuation.total_value);
        self.view_service
            .build_dashboard(&self.portfolio, &valuation, &history_view)
    }

    /// Current valuation without fetching anything.
    #[must_use]
    pub fn valuation(&self) -> ValuationResult {
        self.portfolio_service.value(&self.portfolio)
    }

    /// Merged news feed for the basket: deduplicated by headline,
    /// newest first, capped at the configured limit.
    pub async fn latest_news(&mut self) -> Result<Vec<NewsArticle>, CoreError> {
        let tickers = self.portfolio.tickers();
        let mut articles = self.gateway.fetch_news(&tickers).await?;

        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        let mut seen = HashSet::new();
        articles.retain(|a| seen.insert(a.headline.clone()));
        articles.truncate(self.config.news_limit);
        Ok(articles)
    }

    // ── Clock & config ──────────────────────────────────────────────

    /// When the next scheduled valuation snapshot should fire.
    #[must_use]
    pub fn next_snapshot_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        market_clock::next_snapshot_instant(&self.config.session, now)
    }

    /// True while the reference market session is open.
    #[must_use]
    pub fn is_within_session(&self, now: DateTime<Utc>) -> bool {
        market_clock::is_within_session(&self.config.session, now)
    }

    #[must_use]
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
