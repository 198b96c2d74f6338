//! Claude API client
//!
//! Messages API integration for the model gateway. Each call is one
//! logically independent generation; the full context is re-supplied
//! every time. Uses a long-lived reqwest::Client for connection pooling.

use serde::{Deserialize, Serialize};
use tracing::{error, info};
use reqwest::Client;
use std::time::Duration;
use async_trait::async_trait;

use super::TextGenerator;
use crate::error::AnalysisError;
use crate::Result;

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Per-call bound; there is no pipeline-wide timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_TOKENS: u32 = 4096;

/// Reusable Claude client (connection-pooled)
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            model,
            base_url: CLAUDE_API_URL.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AnalysisError::Upstream(
                "CLAUDE_API_KEY not configured".to_string(),
            ));
        }

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        info!(model = %self.model, "Calling Claude API");

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Claude API request failed: {}", e);
                AnalysisError::Upstream(format!("Claude API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Prefer the service-reported message when the body parses
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            error!(status = %status, "Claude API error response: {}", message);
            return Err(AnalysisError::Upstream(format!(
                "Claude API error {}: {}",
                status.as_u16(),
                message
            )));
        }

        let payload: MessagesResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Claude response: {}", e);
            AnalysisError::Upstream(format!("Claude response parse error: {}", e))
        })?;

        let text = payload
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| AnalysisError::Upstream("Empty response from Claude".to_string()))?;

        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-6".to_string(),
            max_tokens: MAX_TOKENS,
            system: "You are a financial decision analyst".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "Should I quit my job?".to_string(),
            }],
        };

        let json = serde_json::to_string(&request);
        assert!(json.is_ok());
        let json = json.unwrap();
        assert!(json.contains("Should I quit my job?"));
        assert!(json.contains("max_tokens"));
    }

    #[test]
    fn test_error_body_parsing() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens required"}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "max_tokens required");
    }

    #[tokio::test]
    async fn test_empty_api_key_fails_fast() {
        let client = ClaudeClient::new(String::new(), "claude-sonnet-4-6".to_string());
        let error = client.generate("system", "user").await.unwrap_err();
        assert!(error.to_string().contains("CLAUDE_API_KEY"));
    }
}
