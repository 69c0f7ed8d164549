//! Mock LLM Provider for testing
//!
//! Returns queued responses first, then a fixed default answer.

use crate::error::{Error, Result};
use crate::provider::LlmProvider;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock LLM provider that returns queued responses or a default one.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    default_response: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider with an empty queue and no default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            default_response: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock that answers every prompt with `response`.
    #[must_use]
    pub fn with_default(response: impl Into<String>) -> Self {
        let mut provider = Self::new();
        provider.default_response = Some(response.into());
        provider
    }

    /// Delay every answer, to exercise cancellation.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a successful response to the queue.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(response.into()));
    }

    /// Add a failure to the queue.
    pub fn push_error(&self, error: Error) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(error));
    }

    /// Number of times `get_response` reached this provider.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_response(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match queued {
            Some(result) => result,
            None => self
                .default_response
                .clone()
                .ok_or_else(|| Error::NotConfigured("mock provider has no queued response".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_then_default() {
        let mock = MockProvider::with_default("fallback");
        mock.push_response("first");

        assert_eq!(mock.get_response("a").await.unwrap(), "first");
        assert_eq!(mock.get_response("b").await.unwrap(), "fallback");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.prompts(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_empty_mock_errors() {
        let mock = MockProvider::new();
        let err = tokio_test::block_on(mock.get_response("a")).unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }
}
