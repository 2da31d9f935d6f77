use serde::{Deserialize, Serialize};

/// A live quote for one ticker: current price and the day's change
/// against the previous close, both per share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Latest traded price
    pub price: f64,

    /// Signed change vs the previous session's close
    pub day_change: f64,
}

impl Quote {
    pub fn new(price: f64, day_change: f64) -> Self {
        Self { price, day_change }
    }

    /// Previous close derived as `price - day_change`.
    /// Returns `None` when the result is zero or not finite — such a
    /// quote cannot seed an allocation or a day-change percentage.
    pub fn previous_close(&self) -> Option<f64> {
        let prev = self.price - self.day_change;
        if prev.is_finite() && prev != 0.0 {
            Some(prev)
        } else {
            None
        }
    }
}

/// One tracked equity position. Created once at startup from the
/// equal-weight allocation; mutated only by trades and quote refreshes.
/// The basket is fixed for the session, so holdings are never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol, uppercased (e.g., "GOOGL")
    pub ticker: String,

    /// Human-readable company name (e.g., "Alphabet (Google)")
    pub display_name: String,

    /// Fractional share count, never negative
    pub share_count: f64,

    /// Latest known price per share
    pub current_price: f64,

    /// Signed day change per share vs previous close
    pub day_change_per_share: f64,
}

impl Holding {
    pub fn new(
        ticker: impl Into<String>,
        display_name: impl Into<String>,
        share_count: f64,
        quote: Quote,
    ) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            display_name: display_name.into(),
            share_count,
            current_price: quote.price,
            day_change_per_share: quote.day_change,
        }
    }

    /// Market value of this position at the current price.
    pub fn market_value(&self) -> f64 {
        self.share_count * self.current_price
    }

    /// Apply a fresh quote to this holding.
    pub fn apply_quote(&mut self, quote: Quote) {
        self.current_price = quote.price;
        self.day_change_per_share = quote.day_change;
    }
}
