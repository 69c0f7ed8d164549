//! Switchyard LLM - provider abstraction and response caching
//!
//! This crate provides the downstream model integration for Switchyard:
//! - Provider: the `LlmProvider` trait (`get_response(prompt) -> text`)
//! - Cache: `CachedProvider`, a TTL memoizing decorator over any provider
//! - Ollama: local Ollama provider
//! - Mock: scripted provider for tests and offline runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod mock;
pub mod ollama;
pub mod provider;

pub use cache::{CachedProvider, DEFAULT_CACHE_TTL, PURGE_INTERVAL};
pub use error::{Error, Result};
pub use mock::MockProvider;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use provider::{LlmProvider, SharedProvider};
