//! Host construction from configuration

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use switchyard_core::{ProviderKind, Switchyard, SwitchyardBuilder, SwitchyardConfig};
use switchyard_llm::{LlmProvider, MockProvider, OllamaConfig, OllamaProvider, SharedProvider};
use switchyard_tools::{LocalFileSystem, SharedFileSystem};
use tracing::info;

/// Canned answer of the offline provider
pub const MOCK_RESPONSE: &str = "mock provider: configure llm.provider = \"ollama\" for real answers";

/// Provider selected by `llm.provider`
pub fn provider(config: &SwitchyardConfig) -> Result<SharedProvider> {
    let provider: SharedProvider = match config.llm.provider {
        ProviderKind::Mock => Arc::new(MockProvider::with_default(MOCK_RESPONSE)),
        ProviderKind::Ollama => {
            let ollama = OllamaConfig::default()
                .with_base_url(&config.llm.base_url)
                .with_model(&config.llm.model)
                .with_timeout(Duration::from_secs(config.llm.timeout_secs));
            Arc::new(OllamaProvider::new(ollama).context("Failed to create Ollama provider")?)
        }
    };
    info!(provider = provider.name(), "LLM provider selected");
    Ok(provider)
}

/// Build the host with the default agent set
pub fn build(config: SwitchyardConfig) -> Result<Switchyard> {
    let provider = provider(&config)?;
    let fs: SharedFileSystem = Arc::new(LocalFileSystem::new(config.agents.workspace_root.clone()));

    SwitchyardBuilder::from_config(config, provider, fs)
        .build()
        .context("Failed to build host")
}
