use serde::{Deserialize, Serialize};

/// Valuation of the whole portfolio at one instant, derived fresh from
/// holding state on every revaluation (never incrementally maintained).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Σ shares × (price − day change): the basket at yesterday's close
    pub value_at_prev_close: f64,

    /// Σ shares × day change per share
    pub total_day_change: f64,

    /// value_at_prev_close + total_day_change + cash
    pub total_value: f64,

    /// Uninvested cash at valuation time
    pub cash: f64,

    /// Per-holding figures, in basket order
    pub holdings: Vec<HoldingValuation>,
}

/// Derived figures for one holding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub ticker: String,
    pub share_count: f64,
    pub current_price: f64,
    pub day_change_per_share: f64,

    /// shares × price
    pub market_value: f64,

    /// Fraction of total portfolio value (0 when the total is 0)
    pub weight: f64,

    /// Day change per share relative to previous close, as a fraction
    /// (0 when the previous close is 0)
    pub day_change_percent: f64,

    /// shares × day change per share
    pub day_change_value: f64,
}
