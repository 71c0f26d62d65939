use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use tracing::debug;

use super::models::{ChatCompletionRequest, ChatCompletionResponse, RequestMessage};
use crate::api::{error_from_response, ChatBackend, ChatRole};
use crate::config::LlmConfig;
use crate::utils::errors::ApiError;
use crate::utils::ratelimit::RateLimiter;

/// Client for an OpenAI-compatible chat completions endpoint
pub struct OpenAiClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    limiter: RateLimiter,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Request(format!("Client error: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            limiter: RateLimiter::per_minute(config.requests_per_minute),
        })
    }

    /// Create default headers with authorization
    fn create_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| ApiError::Request(format!("Failed to create auth header: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn build_request(&self, system_message: &str, history: &[(ChatRole, String)]) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(RequestMessage {
            role: ChatRole::System.as_str(),
            content: system_message.to_string(),
        });
        messages.extend(history.iter().map(|(role, content)| RequestMessage {
            role: role.as_str(),
            content: content.clone(),
        }));

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        }
    }

    /// POST /chat/completions
    pub async fn create_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let headers = self.create_headers()?;

        self.limiter.acquire().await;

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json::<ChatCompletionResponse>().await?)
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, system_message: &str, history: &[(ChatRole, String)]) -> Result<String, ApiError> {
        let request = self.build_request(system_message, history);
        let response = self.create_completion(&request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Completion used {} prompt and {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Deserialization("Completion contained no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        let config = LlmConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..LlmConfig::default()
        };
        OpenAiClient::new(&config, "sk-test".to_string()).unwrap()
    }

    #[test]
    fn test_build_request_prepends_system_message() {
        let client = client();
        let history = vec![
            (ChatRole::User, "report".to_string()),
            (ChatRole::Assistant, "reply".to_string()),
        ];
        let request = client.build_request("You are terse.", &history);

        assert_eq!(request.model, "gpt-3.5-turbo");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[0].content, "You are terse.");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[2].role, "assistant");
    }

    #[test]
    fn test_headers_carry_bearer_token() {
        let headers = client().create_headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer sk-test");
        assert_eq!(client().base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_invalid_key_characters() {
        let client = OpenAiClient::new(&LlmConfig::default(), "bad\nkey".to_string()).unwrap();
        assert!(matches!(client.create_headers(), Err(ApiError::Request(_))));
    }
}
