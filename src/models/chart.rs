//! Chart generation models

use chrono::NaiveDate;

use super::bar::PriceBar;

/// A single data point on a price chart
#[derive(Debug, Clone, Copy)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl From<&PriceBar> for PricePoint {
    fn from(bar: &PriceBar) -> Self {
        Self {
            date: bar.date,
            price: bar.close,
        }
    }
}
