use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::api::MarketDataProvider;
use crate::config::AnalysisConfig;
use crate::models::{LookbackPeriod, MetricsReport};
use crate::services::chart_service::{chart_path, render_price_chart};
use crate::services::metrics_service::compute_metrics;
use crate::utils::errors::AppError;

/// Result of one fetch, compute and plot run
#[derive(Debug, Clone)]
pub struct StockAnalysis {
    pub symbol: String,
    pub series_len: usize,
    pub metrics: MetricsReport,
    pub chart_path: PathBuf,
}

/// Fetch `symbol` over `period`, compute its metrics and save the price chart
/// under `config.output_dir`
pub async fn analyze_stock(
    provider: &dyn MarketDataProvider,
    config: &AnalysisConfig,
    symbol: &str,
    period: LookbackPeriod,
) -> Result<StockAnalysis, AppError> {
    let series = provider.fetch_series(symbol, period).await?;

    if series.len() < 30 {
        warn!(
            "Only {} bars for {} over {}; volatility will be noisy",
            series.len(),
            series.symbol(),
            period
        );
    }

    let metrics = compute_metrics(&series)?;
    info!(
        "{}: price {:.2}, change {:.2}%, volatility {:.4}",
        series.symbol(),
        metrics.current_price,
        metrics.price_change_pct,
        metrics.volatility
    );

    debug!(
        "Metrics for {}: {}",
        series.symbol(),
        serde_json::to_string(&metrics).unwrap_or_default()
    );

    let path = render_price_chart(
        &series,
        &chart_path(&config.output_dir),
        config.chart_width,
        config.chart_height,
    )?;
    info!("Saved chart to {}", path.display());

    Ok(StockAnalysis {
        symbol: series.symbol().to_string(),
        series_len: series.len(),
        metrics,
        chart_path: path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bar::tests::bar;
    use crate::models::PriceSeries;
    use crate::utils::errors::{ApiError, MetricsError};
    use async_trait::async_trait;

    struct FixedProvider {
        closes: Vec<f64>,
    }

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn fetch_series(&self, symbol: &str, _period: LookbackPeriod) -> Result<PriceSeries, AppError> {
            let bars = self
                .closes
                .iter()
                .enumerate()
                .map(|(i, close)| bar(i as u32 + 1, *close, 1_000))
                .collect();
            Ok(PriceSeries::new(symbol.to_string(), bars)?)
        }
    }

    struct DownProvider;

    #[async_trait]
    impl MarketDataProvider for DownProvider {
        async fn fetch_series(&self, _symbol: &str, _period: LookbackPeriod) -> Result<PriceSeries, AppError> {
            Err(ApiError::ServerError(503, "unavailable".to_string()).into())
        }
    }

    #[tokio::test]
    async fn test_successful_run_writes_chart() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig {
            output_dir: dir.path().join("charts"),
            chart_width: 400,
            chart_height: 300,
            ..AnalysisConfig::default()
        };
        let provider = FixedProvider { closes: vec![100.0, 104.0, 101.5] };

        let analysis = analyze_stock(&provider, &config, "MSFT", LookbackPeriod::OneMonth)
            .await
            .unwrap();

        assert_eq!(analysis.symbol, "MSFT");
        assert_eq!(analysis.series_len, 3);
        assert_eq!(analysis.chart_path, dir.path().join("charts").join("stock_analysis.png"));
        assert!(analysis.chart_path.is_file());

        let series = provider.fetch_series("MSFT", LookbackPeriod::OneMonth).await.unwrap();
        assert_eq!(analysis.metrics, compute_metrics(&series).unwrap());
    }

    #[tokio::test]
    async fn test_single_bar_is_insufficient() {
        let provider = FixedProvider { closes: vec![100.0] };
        let err = analyze_stock(&provider, &AnalysisConfig::default(), "MSFT", LookbackPeriod::OneYear)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Metrics(MetricsError::InsufficientData { found: 1 })));
    }

    #[tokio::test]
    async fn test_zero_price_stops_before_chart() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig {
            output_dir: dir.path().join("charts"),
            ..AnalysisConfig::default()
        };
        let provider = FixedProvider { closes: vec![10.0, 0.0, 5.0] };
        let err = analyze_stock(&provider, &config, "MSFT", LookbackPeriod::OneYear)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Metrics(MetricsError::DivisionByZero { index: 1 })));
        assert!(!dir.path().join("charts").exists());
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let err = analyze_stock(&DownProvider, &AnalysisConfig::default(), "MSFT", LookbackPeriod::FiveDays)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::ServerError(503, _))));
    }
}
