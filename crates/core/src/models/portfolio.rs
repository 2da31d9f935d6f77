use serde::{Deserialize, Serialize};

use super::holding::Holding;

/// Direction of a simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "Buy"),
            TradeSide::Sell => write!(f, "Sell"),
        }
    }
}

/// Receipt for an accepted trade. Rejected trades never produce one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeExecution {
    pub ticker: String,
    pub side: TradeSide,
    pub shares: f64,
    pub price: f64,
    /// `shares × price`, the exact amount cash moved by
    pub trade_value: f64,
    pub cash_after: f64,
}

/// In-memory portfolio state for one session: the fixed basket of
/// holdings plus uninvested cash.
///
/// Holdings keep their basket order so table rows stay stable across
/// refreshes. Nothing here is persisted — only the derived value history
/// is (see the history service).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Portfolio {
    /// One entry per tracked ticker, in basket order
    pub holdings: Vec<Holding>,

    /// Uninvested cash; only changes by the signed value of accepted trades
    pub cash: f64,

    /// The total amount originally deployed, for gain/loss reporting
    pub initial_investment: f64,
}

impl Portfolio {
    /// Find a holding by ticker (case-insensitive).
    pub fn holding(&self, ticker: &str) -> Option<&Holding> {
        let upper = ticker.to_uppercase();
        self.holdings.iter().find(|h| h.ticker == upper)
    }

    pub fn holding_mut(&mut self, ticker: &str) -> Option<&mut Holding> {
        let upper = ticker.to_uppercase();
        self.holdings.iter_mut().find(|h| h.ticker == upper)
    }

    /// All tracked tickers in basket order.
    pub fn tickers(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }

    /// Total economic value right now: cash + Σ(shares × price).
    /// Computable at any instant without reference to history.
    pub fn total_value(&self) -> f64 {
        self.cash + self.holdings.iter().map(Holding::market_value).sum::<f64>()
    }
}
