use serde::{Deserialize, Serialize};

/// Everything a dashboard needs to render, fully computed.
///
/// The core produces the numbers — the frontend only formats and draws.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    /// One row per holding, in stable basket order
    pub rows: Vec<HoldingRow>,
    pub summary: SummaryFigures,
    pub chart: Vec<ChartPoint>,
}

/// One table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingRow {
    pub ticker: String,
    pub display_name: String,
    pub share_count: f64,
    pub current_price: f64,
    pub market_value: f64,
    /// Percentage of total portfolio value
    pub weight_percent: f64,
    /// Day change for the whole position, in dollars
    pub day_change_value: f64,
    /// Day change per share vs previous close, in percent
    pub day_change_percent: f64,
}

/// The summary cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryFigures {
    pub total_value: f64,
    pub cash: f64,
    pub day_change: f64,
    /// Total value minus the initial investment
    pub total_gain_loss: f64,
}

/// One chart point: label plus value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    /// Marks the display-only current-value point
    pub is_transient: bool,
}
