use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plotters::prelude::*;

use crate::models::{PricePoint, PriceSeries};
use crate::utils::errors::ChartError;

use crate::services::metrics_service::CHART_FILE_NAME;

/// Default canvas size in pixels (a 12x6 inch figure at 100 dpi)
pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 600;

/// Where the chart for an analysis run is written
pub fn chart_path(output_dir: &Path) -> PathBuf {
    output_dir.join(CHART_FILE_NAME)
}

/// Y axis bounds with 10% padding around the observed price range
fn price_bounds(points: &[PricePoint]) -> (f64, f64) {
    let min_price = points
        .iter()
        .map(|p| p.price)
        .fold(f64::INFINITY, f64::min);
    let max_price = points
        .iter()
        .map(|p| p.price)
        .fold(f64::NEG_INFINITY, f64::max);

    let price_range = (max_price - min_price).max(1e-8);
    let padding = price_range * 0.1;
    ((min_price - padding).max(0.0), max_price + padding)
}

/// Draw close price over time for the series and save it as a PNG at `path`
pub fn render_price_chart(
    series: &PriceSeries,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<PathBuf, ChartError> {
    let points: Vec<PricePoint> = series.bars().iter().map(PricePoint::from).collect();

    if points.len() < 2 {
        return Err(ChartError::NotEnoughData { found: points.len() });
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let (y_min, y_max) = price_bounds(&points);
    let x_min = points[0].date;
    let x_max = points[points.len() - 1].date;

    {
        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| ChartError::Render(format!("Failed to fill canvas: {}", e)))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} Stock Price Over Time", series.symbol()),
                ("sans-serif", 30.0).into_font(),
            )
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(|e| ChartError::Render(format!("Failed to build chart: {}", e)))?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Price")
            .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m-%d").to_string())
            .draw()
            .map_err(|e| ChartError::Render(format!("Failed to draw mesh: {}", e)))?;

        chart
            .draw_series(LineSeries::new(
                points.iter().map(|p| (p.date, p.price)),
                &BLUE,
            ))
            .map_err(|e| ChartError::Render(format!("Failed to draw line: {}", e)))?;

        root.present()
            .map_err(|e| ChartError::Render(format!("Failed to write chart: {}", e)))?;
    }

    tracing::debug!("Chart for {} written to {}", series.symbol(), path.display());
    Ok(path.to_path_buf())
}
