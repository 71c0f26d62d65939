use tracing::{error, info, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod api;
mod config;
mod models;
mod services;
mod utils;

use api::{OpenAiClient, YahooClient};
use config::AppConfig;
use models::LookbackPeriod;
use services::{analyze_stock, format_report, format_transcript, ChatService, StockAnalysis};
use utils::errors::AppError;
use utils::Table;

const DEFAULT_LOG_FILTER: &str = "stock_agents=info,reqwest=warn,hyper=warn";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting stock-agents v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("analysis", run_id = %run_id);
    if let Err(e) = run(config).instrument(span).await {
        error!("Run {} failed: {}", run_id, e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    let mut args = std::env::args().skip(1);
    let symbol = args.next().unwrap_or_else(|| config.analysis.symbol.clone());
    let period = match args.next() {
        Some(raw) => raw.parse::<LookbackPeriod>()?,
        None => config.analysis.period,
    };

    let provider = YahooClient::from_config(&config.analysis)?;
    let analysis = analyze_stock(&provider, &config.analysis, &symbol, period).await?;
    println!("{}", metrics_table(&analysis, period).render());

    let report = format_report(&analysis.metrics, &analysis.symbol);
    let backend = OpenAiClient::new(&config.llm, config.api_key()?.to_string())?;
    let chat = ChatService::new(backend, config.chat.panel(), config.chat.max_round);

    info!("Starting analyst panel for {}", analysis.symbol);
    let transcript = chat.run(&report).await?;
    println!("{}", format_transcript(&transcript));

    Ok(())
}

fn metrics_table(analysis: &StockAnalysis, period: LookbackPeriod) -> Table {
    let metrics = &analysis.metrics;
    let mut table = Table::new(vec!["Metric", "Value"]);
    table.add_row(vec!["Symbol".to_string(), analysis.symbol.clone()]);
    table.add_row(vec!["Period".to_string(), format!("{} ({} bars)", period, analysis.series_len)]);
    table.add_row(vec!["Current Price".to_string(), format!("${:.2}", metrics.current_price)]);
    table.add_row(vec!["Price Change".to_string(), format!("{:.2}%", metrics.price_change_pct)]);
    table.add_row(vec!["Average Volume".to_string(), format!("{:.0}", metrics.average_volume)]);
    table.add_row(vec!["Volatility".to_string(), format!("{:.2}", metrics.volatility)]);
    table.add_row(vec!["Chart".to_string(), analysis.chart_path.display().to_string()]);
    table
}
