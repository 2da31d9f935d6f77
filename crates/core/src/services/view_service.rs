use crate::models::portfolio::Portfolio;
use crate::models::snapshot::Snapshot;
use crate::models::valuation::ValuationResult;
use crate::models::view::{ChartPoint, DashboardView, HoldingRow, SummaryFigures};

/// Maps portfolio and history state into render-ready view models.
///
/// Pure, side-effect-free. Rows keep basket order so the table never
/// reshuffles between refreshes.
pub struct ViewService;

impl ViewService {
    pub fn new() -> Self {
        Self
    }

    pub fn build_dashboard(
        &self,
        portfolio: &Portfolio,
        valuation: &ValuationResult,
        history_view: &[Snapshot],
    ) -> DashboardView {
        let rows = valuation
            .holdings
            .iter()
            .map(|hv| {
                let display_name = portfolio
                    .holding(&hv.ticker)
                    .map(|h| h.display_name.clone())
                    .unwrap_or_else(|| hv.ticker.clone());
                HoldingRow {
                    ticker: hv.ticker.clone(),
                    display_name,
                    share_count: hv.share_count,
                    current_price: hv.current_price,
                    market_value: hv.market_value,
                    weight_percent: hv.weight * 100.0,
                    day_change_value: hv.day_change_value,
                    day_change_percent: hv.day_change_percent * 100.0,
                }
            })
            .collect();

        let summary = SummaryFigures {
            total_value: valuation.total_value,
            cash: valuation.cash,
            day_change: valuation.total_day_change,
            total_gain_loss: valuation.total_value - portfolio.initial_investment,
        };

        let chart = history_view.iter().map(Self::chart_point).collect();

        DashboardView {
            rows,
            summary,
            chart,
        }
    }

    fn chart_point(snapshot: &Snapshot) -> ChartPoint {
        let label = if snapshot.is_static {
            "Start".to_string()
        } else {
            snapshot.timestamp.format("%Y-%m-%d %H:%M").to_string()
        };
        ChartPoint {
            label,
            value: snapshot.value,
            is_transient: snapshot.is_transient,
        }
    }
}

impl Default for ViewService {
    fn default() -> Self {
        Self::new()
    }
}
