//! LLM Provider trait definition
//!
//! This module defines the core trait that all LLM providers must implement.

use crate::error::Result;
use std::sync::Arc;

/// Trait for LLM providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get a text response for a single prompt
    async fn get_response(&self, prompt: &str) -> Result<String>;
}

/// Shared provider handle
pub type SharedProvider = Arc<dyn LlmProvider>;
