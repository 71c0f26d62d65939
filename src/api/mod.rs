//! Clients for the external services the analysis depends on
//!
//! Market data comes through [`MarketDataProvider`] and chat completions through
//! [`ChatBackend`], so the services can run against scripted fakes in tests.

pub mod openai;
pub mod yahoo;

use async_trait::async_trait;
use tracing::warn;

use crate::models::{LookbackPeriod, PriceSeries};
use crate::utils::errors::{extract_clean_error, ApiError, AppError};

pub use openai::OpenAiClient;
pub use yahoo::YahooClient;

/// Source of daily price history
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch daily bars for `symbol` covering `period`, oldest first
    async fn fetch_series(&self, symbol: &str, period: LookbackPeriod) -> Result<PriceSeries, AppError>;
}

/// Role of a message sent to a chat completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A language model that answers a conversation
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Return the next assistant message for `history` under `system_message`
    async fn complete(&self, system_message: &str, history: &[(ChatRole, String)]) -> Result<String, ApiError>;
}

/// Map a non-success HTTP response to an [`ApiError`]
pub(crate) async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let status_code = status.as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());
    let body_text = response.text().await.unwrap_or_default();

    error_from_parts(status_code, retry_after, &body_text)
}

fn error_from_parts(status_code: u16, retry_after: Option<u64>, body_text: &str) -> ApiError {
    let message = extract_clean_error(body_text);

    match status_code {
        400 => ApiError::BadRequest(message),
        401 => ApiError::Unauthorized(message),
        403 => ApiError::Forbidden(message),
        404 => ApiError::NotFound(message),
        429 => {
            let retry_after_secs = retry_after.unwrap_or(1);
            warn!("Rate limited, retry after {} s", retry_after_secs);
            ApiError::RateLimited { retry_after_secs }
        }
        500..=599 => {
            warn!("Server error {}: {}", status_code, message);
            ApiError::ServerError(status_code, message)
        }
        _ => ApiError::HttpError(status_code, message),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Deserialization(format!("Failed to parse response: {}", e))
        } else {
            ApiError::Request(format!("Request failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(error_from_parts(400, None, "bad"), ApiError::BadRequest(m) if m == "bad"));
        assert!(matches!(error_from_parts(401, None, ""), ApiError::Unauthorized(_)));
        assert!(matches!(error_from_parts(403, None, ""), ApiError::Forbidden(_)));
        assert!(matches!(error_from_parts(404, None, ""), ApiError::NotFound(_)));
        assert!(matches!(error_from_parts(503, None, "down"), ApiError::ServerError(503, _)));
        assert!(matches!(error_from_parts(418, None, "teapot"), ApiError::HttpError(418, _)));
    }

    #[test]
    fn test_rate_limit_retry_after() {
        assert!(matches!(
            error_from_parts(429, Some(7), ""),
            ApiError::RateLimited { retry_after_secs: 7 }
        ));
        assert!(matches!(
            error_from_parts(429, None, ""),
            ApiError::RateLimited { retry_after_secs: 1 }
        ));
    }

    #[test]
    fn test_json_error_body_is_cleaned() {
        let body = r#"{"error":{"message":"model not found"}}"#;
        match error_from_parts(404, None, body) {
            ApiError::NotFound(msg) => assert_eq!(msg, "model not found"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
