//! Summary statistics models

use serde::Serialize;

/// Derived statistics for one price series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsReport {
    pub average_volume: f64,
    /// Annualized standard deviation of daily close-to-close returns
    pub volatility: f64,
    pub current_price: f64,
    pub price_change_pct: f64,
}
