//! Ollama - Local Ollama API provider
//!
//! Sends single-prompt, non-streaming chat requests to a local Ollama server.

use crate::error::{Error, Result};
use crate::provider::LlmProvider;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Default Ollama model
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Default Ollama API URL
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Strip paths and raw bodies from server errors before surfacing them
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("/home") || lower.contains("/root") || lower.contains("/var") {
        return "An internal error occurred. Please check your Ollama installation.".to_string();
    }

    if lower.contains("model") && (lower.contains("not found") || lower.contains("pull")) {
        return "Model not available. Please pull the model first with: ollama pull <model>"
            .to_string();
    }

    if error.len() < 100 {
        return error.to_string();
    }

    "An error occurred. Please try again.".to_string()
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Ollama provider configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL (default: http://localhost:11434)
    pub base_url: String,
    /// Model used for every prompt
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl OllamaConfig {
    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

/// Ollama local provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
        }
    }

    async fn send_request(&self, request: OllamaChatRequest) -> Result<OllamaChatResponse> {
        let url = self.config.chat_url();

        debug!("Sending request to Ollama: {}", request.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::Network(format!(
                        "Failed to connect to Ollama at {}. Is Ollama running?",
                        self.config.base_url
                    ))
                } else if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimit);
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<OllamaError>(&body) {
                return Err(Error::Api(sanitize_api_error(&error.error)));
            }
            return Err(Error::Api(sanitize_api_error(&format!("HTTP {status}"))));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn get_response(&self, prompt: &str) -> Result<String> {
        let request = self.build_request(prompt);
        let response = self.send_request(request).await?;
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = OllamaConfig::default()
            .with_base_url("http://gpu-box:11434/")
            .with_model("qwen2.5")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.chat_url(), "http://gpu-box:11434/api/chat");
        assert_eq!(config.model, "qwen2.5");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_request_shape() {
        let provider = OllamaProvider::new(OllamaConfig::default()).unwrap();
        let request = provider.build_request("hello");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_sanitize_api_error() {
        assert_eq!(sanitize_api_error("bad input"), "bad input");
        assert!(sanitize_api_error("open /root/.ollama/models failed").contains("internal error"));
        assert!(sanitize_api_error("model 'x' not found, try pull").contains("ollama pull"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() {
        let config = OllamaConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let provider = OllamaProvider::new(config).unwrap();

        let err = provider.get_response("ping").await.unwrap_err();
        assert!(err.is_transient());
    }
}
