use std::collections::HashMap;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::config::BasketEntry;
use crate::models::holding::{Holding, Quote};
use crate::models::portfolio::{Portfolio, TradeExecution, TradeSide};
use crate::models::valuation::{HoldingValuation, ValuationResult};

/// Allocation, revaluation, and trade execution.
///
/// Pure business logic — no I/O, no clocks. Valuation is always derived
/// fresh from current holding state instead of being incrementally
/// maintained, so cached totals can never drift from the holdings; the
/// basket is small (≤16 entries), so recomputing is cheap.
pub struct PortfolioService;

impl PortfolioService {
    pub fn new() -> Self {
        Self
    }

    /// Build the session portfolio from an equal-weight allocation
    /// against previous-close prices.
    ///
    /// A ticker whose previous close (`price − day change`) is zero or
    /// undefined cannot be allocated and is quietly dropped. Each of the
    /// N surviving tickers gets `total_investment / N` notional; the
    /// entire investment is deployed, so cash starts at 0.
    pub fn initialize(
        &self,
        basket: &[BasketEntry],
        quotes: &HashMap<String, Quote>,
        total_investment: f64,
    ) -> Result<Portfolio, CoreError> {
        let mut allocatable: Vec<(&BasketEntry, Quote, f64)> = Vec::new();
        for entry in basket {
            let Some(quote) = quotes.get(&entry.ticker) else {
                debug!(ticker = %entry.ticker, "no quote at init, dropping from basket");
                continue;
            };
            match quote.previous_close() {
                Some(prev_close) => allocatable.push((entry, *quote, prev_close)),
                None => {
                    debug!(ticker = %entry.ticker, "no usable previous close, dropping from basket");
                }
            }
        }

        if allocatable.is_empty() {
            return Err(CoreError::InsufficientData);
        }

        let notional = total_investment / allocatable.len() as f64;
        let holdings = allocatable
            .into_iter()
            .map(|(entry, quote, prev_close)| {
                Holding::new(&entry.ticker, &entry.name, notional / prev_close, quote)
            })
            .collect();

        Ok(Portfolio {
            holdings,
            cash: 0.0,
            initial_investment: total_investment,
        })
    }

    /// Apply fresh quotes and compute the full valuation.
    ///
    /// Tickers absent from `quotes` keep their prior price and day
    /// change — stale but present, never an error.
    pub fn revalue(
        &self,
        portfolio: &mut Portfolio,
        quotes: &HashMap<String, Quote>,
    ) -> ValuationResult {
        for holding in &mut portfolio.holdings {
            if let Some(quote) = quotes.get(&holding.ticker) {
                holding.apply_quote(*quote);
            }
        }
        self.value(portfolio)
    }

    /// Compute the valuation from current state without touching quotes.
    pub fn value(&self, portfolio: &Portfolio) -> ValuationResult {
        let value_at_prev_close: f64 = portfolio
            .holdings
            .iter()
            .map(|h| h.share_count * (h.current_price - h.day_change_per_share))
            .sum();
        let total_day_change: f64 = portfolio
            .holdings
            .iter()
            .map(|h| h.share_count * h.day_change_per_share)
            .sum();
        let total_value = value_at_prev_close + total_day_change + portfolio.cash;

        let holdings = portfolio
            .holdings
            .iter()
            .map(|h| {
                let market_value = h.market_value();
                let weight = if total_value != 0.0 {
                    market_value / total_value
                } else {
                    0.0
                };
                let prev_close = h.current_price - h.day_change_per_share;
                // Zero previous close mid-session: guard to 0, keep the row.
                let day_change_percent = if prev_close != 0.0 && prev_close.is_finite() {
                    h.day_change_per_share / prev_close
                } else {
                    0.0
                };
                HoldingValuation {
                    ticker: h.ticker.clone(),
                    share_count: h.share_count,
                    current_price: h.current_price,
                    day_change_per_share: h.day_change_per_share,
                    market_value,
                    weight,
                    day_change_percent,
                    day_change_value: h.share_count * h.day_change_per_share,
                }
            })
            .collect();

        ValuationResult {
            value_at_prev_close,
            total_day_change,
            total_value,
            cash: portfolio.cash,
            holdings,
        }
    }

    /// Execute a buy or sell against current prices.
    ///
    /// Validation happens before any mutation, so a rejected trade
    /// leaves the portfolio exactly as it was. No partial fills.
    pub fn execute_trade(
        &self,
        portfolio: &mut Portfolio,
        ticker: &str,
        shares: f64,
        side: TradeSide,
    ) -> Result<TradeExecution, CoreError> {
        let upper = ticker.to_uppercase();
        let holding = portfolio
            .holding(&upper)
            .ok_or_else(|| CoreError::UnknownTicker(upper.clone()))?;

        let price = holding.current_price;
        let trade_value = shares * price;

        match side {
            TradeSide::Buy => {
                if portfolio.cash < trade_value {
                    return Err(CoreError::InsufficientCash {
                        required: trade_value,
                        available: portfolio.cash,
                    });
                }
            }
            TradeSide::Sell => {
                if shares > holding.share_count {
                    return Err(CoreError::InsufficientShares {
                        ticker: upper,
                        requested: shares,
                        held: holding.share_count,
                    });
                }
            }
        }

        // Validated: apply cash and share updates together.
        let holding = portfolio
            .holding_mut(&upper)
            .ok_or_else(|| CoreError::UnknownTicker(upper.clone()))?;
        match side {
            TradeSide::Buy => {
                holding.share_count += shares;
                portfolio.cash -= trade_value;
            }
            TradeSide::Sell => {
                holding.share_count -= shares;
                portfolio.cash += trade_value;
            }
        }

        Ok(TradeExecution {
            ticker: upper,
            side,
            shares,
            price,
            trade_value,
            cash_after: portfolio.cash,
        })
    }
}

impl Default for PortfolioService {
    fn default() -> Self {
        Self::new()
    }
}
