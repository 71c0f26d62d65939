use std::path::PathBuf;

use thiserror::Error;

use crate::models::LookbackPeriod;

/// Failures computing statistics over a price series
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("Insufficient data: need at least 2 bars, found {found}")]
    InsufficientData { found: usize },
    #[error("Division by zero: close price of bar {index} is zero")]
    DivisionByZero { index: usize },
    #[error("Malformed series: {0}")]
    MalformedSeries(String),
}

/// Errors returned by the HTTP collaborators (market data and chat)
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Rate Limited. Retry after {retry_after_secs} s")]
    RateLimited { retry_after_secs: u64 },
    #[error("Server Error ({0}): {1}")]
    ServerError(u16, String),
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    #[error("Request Error: {0}")]
    Request(String),
    #[error("Deserialization Error: {0}")]
    Deserialization(String),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Not enough price data to generate chart (found {found}, minimum 2 required)")]
    NotEnoughData { found: usize },
    #[error("Failed to prepare chart output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to render chart: {0}")]
    Render(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("No LLM API key configured (set OPENAI_API_KEY or api_key in the config file)")]
    MissingApiKey,
    #[error("Unknown lookback period '{0}'. Supported: {}", LookbackPeriod::SUPPORTED)]
    InvalidPeriod(String),
    #[error("Invalid symbol '{0}'")]
    InvalidSymbol(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error for one analysis request
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Shorten an HTTP error body for logs and error messages.
///
/// Keeps the `message` field of a JSON error body when there is one, otherwise
/// the first 200 characters of the raw text.
pub fn extract_clean_error(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let message = json
            .get("message")
            .or_else(|| json.pointer("/error/message"))
            .or_else(|| json.pointer("/chart/error/description"))
            .and_then(|v| v.as_str());
        if let Some(message) = message {
            return message.trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.chars().count() > 200 {
        let head: String = trimmed.chars().take(200).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}
