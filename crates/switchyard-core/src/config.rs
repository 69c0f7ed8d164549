//! Configuration types
//!
//! Every field has a default, so an empty document is a valid configuration.

use crate::error::{Error, Result};
use crate::router::RouterConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchyardConfig {
    /// Routing and retry
    pub router: RouterConfig,
    /// Provider response cache
    pub cache: CacheConfig,
    /// Agent runtime settings
    pub agents: AgentsConfig,
    /// LLM provider selection
    pub llm: LlmConfig,
}

impl SwitchyardConfig {
    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(Error::Configuration("cache.ttl_secs must be positive".to_string()));
        }
        if self.router.retry.backoff_multiplier < 1.0 {
            return Err(Error::Configuration(
                "router.retry.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.agents.execute_timeout_secs == Some(0) {
            return Err(Error::Configuration(
                "agents.execute_timeout_secs must be positive when set".to_string(),
            ));
        }
        if self.llm.provider == ProviderKind::Ollama && self.llm.base_url.trim().is_empty() {
            return Err(Error::Configuration(
                "llm.base_url is required for the ollama provider".to_string(),
            ));
        }
        Ok(())
    }
}

/// Provider response cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

impl CacheConfig {
    /// Entry lifetime
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Agent runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Upper bound for one `execute`, unbounded when absent
    pub execute_timeout_secs: Option<u64>,
    /// Root directory the file editor is confined to
    pub workspace_root: PathBuf,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            execute_timeout_secs: Some(120),
            workspace_root: PathBuf::from("."),
        }
    }
}

impl AgentsConfig {
    /// Execute timeout as a duration
    #[must_use]
    pub fn execute_timeout(&self) -> Option<Duration> {
        self.execute_timeout_secs.map(Duration::from_secs)
    }
}

/// Which provider backs LLM tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Scripted offline provider
    #[default]
    Mock,
    /// Local Ollama server
    Ollama,
}

/// LLM provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider kind
    pub provider: ProviderKind,
    /// Provider base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            base_url: "http://localhost:11434".to_string(),
            model: switchyard_llm::ollama::DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}
