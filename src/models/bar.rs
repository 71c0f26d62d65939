//! Daily price bars and the validated series built from them

use chrono::NaiveDate;
use serde::Serialize;

use crate::utils::errors::MetricsError;

/// One trading day of price and volume data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    fn prices(&self) -> [(&'static str, f64); 4] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ]
    }
}

/// Bars for a single symbol, oldest first.
///
/// Only constructed through [`PriceSeries::new`], so every value in circulation
/// is non-empty, strictly ascending by date and free of negative or non-finite prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate and wrap a list of bars
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, MetricsError> {
        if bars.is_empty() {
            return Err(MetricsError::InsufficientData { found: 0 });
        }

        for (i, bar) in bars.iter().enumerate() {
            for (field, value) in bar.prices() {
                if !value.is_finite() || value < 0.0 {
                    return Err(MetricsError::MalformedSeries(format!(
                        "bar {} ({}) has invalid {} price {}",
                        i, bar.date, field, value
                    )));
                }
            }

            if i > 0 {
                let prev = &bars[i - 1];
                if bar.date == prev.date {
                    return Err(MetricsError::MalformedSeries(format!(
                        "duplicate date {} at bar {}",
                        bar.date, i
                    )));
                }
                if bar.date < prev.date {
                    return Err(MetricsError::MalformedSeries(format!(
                        "bar {} ({}) is earlier than bar {} ({})",
                        i, bar.date, i - 1, prev.date
                    )));
                }
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn first(&self) -> &PriceBar {
        &self.bars[0]
    }

    pub fn last(&self) -> &PriceBar {
        &self.bars[self.bars.len() - 1]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn bar(day: u32, close: f64, volume: u64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn test_accepts_ascending_bars() {
        let series = PriceSeries::new("MSFT", vec![bar(2, 100.0, 10), bar(3, 101.0, 20)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "MSFT");
        assert_eq!(series.first().close, 100.0);
        assert_eq!(series.last().close, 101.0);
    }

    #[test]
    fn test_rejects_empty() {
        let err = PriceSeries::new("MSFT", vec![]).unwrap_err();
        assert!(matches!(err, MetricsError::InsufficientData { found: 0 }));
    }

    #[test]
    fn test_rejects_out_of_order_dates() {
        let err = PriceSeries::new("MSFT", vec![bar(3, 100.0, 10), bar(2, 101.0, 20)]).unwrap_err();
        assert!(matches!(err, MetricsError::MalformedSeries(_)));
    }

    #[test]
    fn test_rejects_duplicate_dates() {
        let err = PriceSeries::new("MSFT", vec![bar(2, 100.0, 10), bar(2, 101.0, 20)]).unwrap_err();
        match err {
            MetricsError::MalformedSeries(msg) => assert!(msg.contains("duplicate")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_negative_and_nan_prices() {
        let mut negative = bar(2, 100.0, 10);
        negative.low = -1.0;
        assert!(matches!(
            PriceSeries::new("MSFT", vec![negative]),
            Err(MetricsError::MalformedSeries(_))
        ));

        let nan = bar(2, f64::NAN, 10);
        assert!(matches!(
            PriceSeries::new("MSFT", vec![nan]),
            Err(MetricsError::MalformedSeries(_))
        ));
    }

    #[test]
    fn test_zero_close_is_allowed_by_constructor() {
        let series = PriceSeries::new("MSFT", vec![bar(2, 0.0, 10), bar(3, 1.0, 10)]);
        assert!(series.is_ok());
    }
}
