//! HTTP client for OpenAI-compatible chat completion endpoints

use crate::config::PlannerConfig;
use crate::ItineraryError;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

/// Shown when the provider fails without an error message of its own.
pub const GENERIC_FAILURE: &str = "Failed to generate itinerary";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Client for a chat completion provider (OpenRouter by default)
pub struct CompletionClient {
    http_client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl CompletionClient {
    /// Create a client; fails when no API key is configured.
    pub fn new(config: &PlannerConfig) -> Result<Self, ItineraryError> {
        debug!("Creating new completion client");
        let api_key = config.require_api_key()?.to_string();

        let mut builder = Client::builder().user_agent(concat!("rust-itinerary/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()?;

        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        debug!(endpoint = %endpoint, model = %config.model, "Completion client created successfully");

        Ok(Self {
            http_client,
            endpoint,
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single user message and return the decoded response body.
    #[instrument(level = "info", skip(self, prompt), fields(model = %self.model))]
    pub async fn complete(&self, prompt: &str, user: Option<&str>) -> Result<Value, ItineraryError> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            user,
        };

        info!(endpoint = %self.endpoint, prompt_length = prompt.len(), "Sending completion request");
        let start_time = Instant::now();
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            body_length = text.len(),
            "Completion request completed"
        );

        let data: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = data
                .as_ref()
                .and_then(|d| d.pointer("/error/message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            error!(status = %status, message = %message, "Completion request failed");
            return Err(ItineraryError::ApiError(message));
        }

        data.ok_or_else(|| {
            error!("Completion response body is not JSON");
            ItineraryError::ExtractionError("response body is not JSON".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_api_key() {
        let result = CompletionClient::new(&PlannerConfig::default());
        assert!(matches!(result, Err(ItineraryError::ConfigError(_))));
    }

    #[test]
    fn test_client_creation() {
        let config = PlannerConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://localhost:9999/api/v1/".to_string(),
            ..PlannerConfig::default()
        };
        let client = CompletionClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9999/api/v1/chat/completions");
        assert_eq!(client.model(), "deepseek/deepseek-r1-zero:free");
    }

    #[test]
    fn test_request_body_shape() {
        let body = CompletionRequest {
            model: "m",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            user: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]}));
    }
}
