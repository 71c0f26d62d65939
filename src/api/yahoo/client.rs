use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, info};

use super::models::ChartResponse;
use crate::api::{error_from_response, MarketDataProvider};
use crate::config::{normalize_symbol, AnalysisConfig};
use crate::models::{LookbackPeriod, PriceSeries};
use crate::utils::errors::{ApiError, AppError};

/// Yahoo Finance chart API client for daily price history
pub struct YahooClient {
    http_client: HttpClient,
    base_url: String,
}

impl YahooClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://query1.finance.yahoo.com";

    // The endpoint rejects requests without a browser-like agent
    const USER_AGENT: &'static str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    /// Create a client against `base_url` (the public endpoint is [`Self::DEFAULT_BASE_URL`])
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Request(format!("Client error: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ApiError> {
        Self::with_base_url(
            config.market_data_base_url.clone(),
            Duration::from_secs(config.market_data_timeout_secs),
        )
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }

    /// GET /v8/finance/chart/{symbol}?range={period}&interval=1d
    pub async fn get_chart(&self, symbol: &str, period: LookbackPeriod) -> Result<ChartResponse, ApiError> {
        let url = self.chart_url(symbol);
        debug!("Requesting {} (range={})", url, period);

        let response = self
            .http_client
            .get(&url)
            .query(&[("range", period.as_range()), ("interval", "1d")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json::<ChartResponse>().await?)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_series(&self, symbol: &str, period: LookbackPeriod) -> Result<PriceSeries, AppError> {
        let symbol = normalize_symbol(symbol)?;

        let result = self.get_chart(&symbol, period).await?.into_result(&symbol)?;
        let bars = result.to_bars()?;
        info!(
            "Fetched {} daily bars for {} ({}) over {}",
            bars.len(),
            symbol,
            result.meta.currency.as_deref().unwrap_or("unknown currency"),
            period
        );

        if let Some(latest) = bars.last() {
            debug!("Latest bar for {}: {}", symbol, serde_json::to_string(latest).unwrap_or_default());
        }

        Ok(PriceSeries::new(symbol, bars)?)
    }
}
