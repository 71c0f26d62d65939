use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::PriceBar;
use crate::utils::errors::ApiError;

/// Top-level body of the v8 chart endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartErrorBody {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub currency: Option<String>,
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    pub gmtoffset: i64,
    pub exchange_timezone_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseColumn>,
}

/// Column-oriented OHLCV values; entries are null on days without trading data
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteColumns {
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<i64>>,
}

/// Dividend and split adjusted closes, parallel to the quote columns
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdjCloseColumn {
    pub adjclose: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Unwrap the first result, turning the embedded error object into an [`ApiError`]
    pub fn into_result(self, symbol: &str) -> Result<ChartResult, ApiError> {
        if let Some(err) = self.chart.error {
            let description = err
                .description
                .or(err.code)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ApiError::NotFound(format!("{}: {}", symbol, description)));
        }

        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| ApiError::NotFound(format!("{}: no chart data returned", symbol)))
    }
}

impl ChartResult {
    /// Convert the columns to bars in exchange-local dates.
    ///
    /// Prices are scaled by `adjclose / close` when the adjusted column is
    /// present, so `close` is the adjusted close. Rows with any missing quote
    /// field are skipped. Negative volumes are rejected.
    pub fn to_bars(&self) -> Result<Vec<PriceBar>, ApiError> {
        let quote = match self.indicators.quote.first() {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };

        let mut bars = Vec::with_capacity(self.timestamp.len());
        for (i, &ts) in self.timestamp.iter().enumerate() {
            let row = (
                column(&quote.open, i),
                column(&quote.high, i),
                column(&quote.low, i),
                column(&quote.close, i),
                column(&quote.volume, i),
            );
            let (open, high, low, close, volume) = match row {
                (Some(o), Some(h), Some(l), Some(c), Some(v)) => (o, h, l, c, v),
                _ => continue,
            };

            let volume = u64::try_from(volume).map_err(|_| {
                ApiError::Deserialization(format!("negative volume {} at row {}", volume, i))
            })?;

            let factor = self.adjustment_factor(i, close);
            bars.push(PriceBar {
                date: self.local_date(ts)?,
                open: open * factor,
                high: high * factor,
                low: low * factor,
                close: close * factor,
                volume,
            });
        }

        Ok(bars)
    }

    // 1.0 when there is no usable adjusted close for the row
    fn adjustment_factor(&self, i: usize, close: f64) -> f64 {
        let adjusted = self
            .indicators
            .adjclose
            .first()
            .and_then(|col| column(&col.adjclose, i));
        match adjusted {
            Some(adj) if close > 0.0 && adj.is_finite() => adj / close,
            _ => 1.0,
        }
    }

    fn local_date(&self, ts: i64) -> Result<NaiveDate, ApiError> {
        DateTime::<Utc>::from_timestamp(ts + self.meta.gmtoffset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ApiError::Deserialization(format!("timestamp {} is out of range", ts)))
    }
}

fn column<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}
