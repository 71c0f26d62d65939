use crate::models::{MetricsReport, PriceSeries};
use crate::utils::errors::MetricsError;

/// Annualization factor for daily returns
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// File name the chart is saved under, referenced from the report text
pub const CHART_FILE_NAME: &str = "stock_analysis.png";

/// Compute average volume, annualized volatility, current price and price change.
///
/// Volatility is the sample standard deviation (n - 1) of daily close-to-close
/// returns scaled by sqrt(252). A two-bar series has a single return and its
/// volatility is reported as 0.
///
/// Close ratios too extreme for `f64` (a return or result that overflows to
/// infinity or NaN) are rejected as [`MetricsError::MalformedSeries`].
pub fn compute_metrics(series: &PriceSeries) -> Result<MetricsReport, MetricsError> {
    let bars = series.bars();
    if bars.len() < 2 {
        return Err(MetricsError::InsufficientData { found: bars.len() });
    }

    let total_volume: u128 = bars.iter().map(|b| b.volume as u128).sum();
    let average_volume = total_volume as f64 / bars.len() as f64;

    let returns = daily_returns(series)?;
    let volatility = sample_std_dev(&returns) * TRADING_DAYS_PER_YEAR.sqrt();

    let first_close = series.first().close;
    let current_price = series.last().close;
    if first_close == 0.0 {
        return Err(MetricsError::DivisionByZero { index: 0 });
    }
    let price_change_pct = (current_price - first_close) / first_close * 100.0;
    if !volatility.is_finite() || !price_change_pct.is_finite() {
        return Err(MetricsError::MalformedSeries(format!(
            "metrics overflow f64 (volatility {}, price change {}%)",
            volatility, price_change_pct
        )));
    }

    Ok(MetricsReport {
        average_volume,
        volatility,
        current_price,
        price_change_pct,
    })
}

/// Fractional close-to-close returns, one per bar after the first
pub fn daily_returns(series: &PriceSeries) -> Result<Vec<f64>, MetricsError> {
    series
        .bars()
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let prev = pair[0].close;
            if prev == 0.0 {
                return Err(MetricsError::DivisionByZero { index: i });
            }
            let ret = (pair[1].close - prev) / prev;
            if !ret.is_finite() {
                return Err(MetricsError::MalformedSeries(format!(
                    "return at bar {} is not finite ({} -> {})",
                    i + 1,
                    prev,
                    pair[1].close
                )));
            }
            Ok(ret)
        })
        .collect()
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Render the opening message handed to the analyst panel
pub fn format_report(report: &MetricsReport, symbol: &str) -> String {
    format!(
        "Here is the analysis for {symbol}:\n\
         Current Price: ${current_price:.2}\n\
         Price Change: {price_change:.2}%\n\
         Average Volume: {average_volume:.0}\n\
         Volatility: {volatility:.2}\n\
         \n\
         Please analyze this data and provide:\n\
         1. Analysis of the stock performance\n\
         2. Review of the generated visualization (saved as '{chart}')\n\
         3. Investment recommendations based on these metrics",
        symbol = symbol,
        current_price = report.current_price,
        price_change = report.price_change_pct,
        average_volume = report.average_volume,
        volatility = report.volatility,
        chart = CHART_FILE_NAME,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bar::tests::bar;
    use crate::models::PriceBar;

    fn series(points: &[(f64, u64)]) -> PriceSeries {
        let bars: Vec<PriceBar> = points
            .iter()
            .enumerate()
            .map(|(i, &(close, volume))| bar(i as u32 + 1, close, volume))
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn test_two_bar_scenario() {
        let report = compute_metrics(&series(&[(100.0, 1000), (110.0, 2000)])).unwrap();
        assert!((report.price_change_pct - 10.0).abs() < 1e-9);
        assert_eq!(report.average_volume, 1500.0);
        assert_eq!(report.current_price, 110.0);
        assert_eq!(report.volatility, 0.0);

        let returns = daily_returns(&series(&[(100.0, 1000), (110.0, 2000)])).unwrap();
        assert_eq!(returns.len(), 1);
        assert!((returns[0] - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_single_bar_is_insufficient() {
        let err = compute_metrics(&series(&[(100.0, 1000)])).unwrap_err();
        assert_eq!(err, MetricsError::InsufficientData { found: 1 });
    }

    #[test]
    fn test_zero_first_close() {
        let err = compute_metrics(&series(&[(0.0, 1000), (10.0, 1000)])).unwrap_err();
        assert_eq!(err, MetricsError::DivisionByZero { index: 0 });
    }

    #[test]
    fn test_zero_close_mid_series() {
        let err = compute_metrics(&series(&[(10.0, 1), (0.0, 1), (5.0, 1)])).unwrap_err();
        assert_eq!(err, MetricsError::DivisionByZero { index: 1 });
    }

    #[test]
    fn test_extreme_close_ratio_is_malformed() {
        let err = compute_metrics(&series(&[(5e-324, 1), (1.0, 1), (2.0, 1)])).unwrap_err();
        assert!(matches!(err, MetricsError::MalformedSeries(_)));

        // both returns are finite but the squared deviations overflow
        let err = compute_metrics(&series(&[(1e-160, 1), (1e-5, 1), (5e-6, 1)])).unwrap_err();
        assert!(matches!(err, MetricsError::MalformedSeries(_)));
    }

    #[test]
    fn test_volatility_matches_hand_computation() {
        // returns: +10%, -10%
        let report = compute_metrics(&series(&[(100.0, 1), (110.0, 1), (99.0, 1)])).unwrap();
        let mean: f64 = (0.1 + -0.1) / 2.0;
        let var = ((0.1 - mean).powi(2) + (-0.1 - mean).powi(2)) / 1.0;
        let expected = var.sqrt() * 252f64.sqrt();
        assert!((report.volatility - expected).abs() < 1e-9);
        assert!((report.price_change_pct - -1.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_change_sign() {
        let flat = compute_metrics(&series(&[(50.0, 1), (60.0, 1), (50.0, 1)])).unwrap();
        assert_eq!(flat.price_change_pct, 0.0);

        let up = compute_metrics(&series(&[(50.0, 1), (40.0, 1), (55.0, 1)])).unwrap();
        assert!(up.price_change_pct > 0.0);

        let down = compute_metrics(&series(&[(50.0, 1), (60.0, 1), (45.0, 1)])).unwrap();
        assert!(down.price_change_pct < 0.0);
    }

    #[test]
    fn test_constant_volume_average_is_exact() {
        let v = 123_456_789u64;
        let points: Vec<(f64, u64)> = (0..20).map(|i| (100.0 + i as f64, v)).collect();
        let report = compute_metrics(&series(&points)).unwrap();
        assert_eq!(report.average_volume, v as f64);
    }

    #[test]
    fn test_large_volumes_do_not_overflow() {
        let report = compute_metrics(&series(&[(1.0, u64::MAX), (2.0, u64::MAX)])).unwrap();
        assert_eq!(report.average_volume, u64::MAX as f64);
    }

    #[test]
    fn test_current_price_and_finiteness() {
        for len in 2..30usize {
            let points: Vec<(f64, u64)> = (0..len)
                .map(|i| (10.0 + ((i * 7) % 5) as f64 * 0.37, (i as u64 + 1) * 100))
                .collect();
            let s = series(&points);
            let report = compute_metrics(&s).unwrap();
            assert_eq!(report.current_price, s.last().close);
            assert!(report.average_volume.is_finite());
            assert!(report.volatility.is_finite() && report.volatility >= 0.0);
            assert!(report.price_change_pct.is_finite());
        }
    }

    #[test]
    fn test_repeated_calls_are_bit_identical() {
        let s = series(&[(101.3, 7), (99.8, 9), (104.1, 3), (103.9, 11)]);
        let a = compute_metrics(&s).unwrap();
        let b = compute_metrics(&s).unwrap();
        assert_eq!(a.volatility.to_bits(), b.volatility.to_bits());
        assert_eq!(a.average_volume.to_bits(), b.average_volume.to_bits());
        assert_eq!(a.price_change_pct.to_bits(), b.price_change_pct.to_bits());
        assert_eq!(a.current_price.to_bits(), b.current_price.to_bits());
    }

    #[test]
    fn test_format_report() {
        let report = MetricsReport {
            average_volume: 21_345_678.6,
            volatility: 0.23456,
            current_price: 415.129,
            price_change_pct: -3.456,
        };
        let text = format_report(&report, "MSFT");
        assert!(text.starts_with("Here is the analysis for MSFT:\n"));
        assert!(text.contains("Current Price: $415.13\n"));
        assert!(text.contains("Price Change: -3.46%\n"));
        assert!(text.contains("Average Volume: 21345679\n"));
        assert!(text.contains("Volatility: 0.23\n"));
        assert!(text.contains("(saved as 'stock_analysis.png')"));
        assert!(text.ends_with("3. Investment recommendations based on these metrics"));
    }
}
