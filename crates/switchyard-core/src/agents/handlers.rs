//! Handler registry - task key to handler dispatch
//!
//! Every task an agent supports is a [`TaskHandler`] registered under its
//! normalized task key at construction time.

use crate::error::{Error, Result};
use crate::message::{task_key, AgentRequest};
use crate::pipeline::WorkflowContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Task metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Normalized task key
    pub name: String,
    /// Human-readable description
    pub description: String,
}

impl TaskDefinition {
    /// Create a definition; the name is normalized to a task key
    #[must_use]
    pub fn new(name: &str, description: impl Into<String>) -> Self {
        Self {
            name: task_key(name),
            description: description.into(),
        }
    }
}

/// Everything a handler can see while running
#[derive(Debug, Clone, Copy)]
pub struct HandlerInput<'a> {
    /// The request being executed
    pub request: &'a AgentRequest,
    /// State written by the pipeline
    pub context: &'a WorkflowContext,
    /// Cancellation for the whole request
    pub cancel: &'a CancellationToken,
}

impl<'a> HandlerInput<'a> {
    /// A string field from the request context, if present and non-blank
    #[must_use]
    pub fn optional_str(&self, key: &str) -> Option<&'a str> {
        self.request
            .context_str(key)
            .filter(|value| !value.trim().is_empty())
    }

    /// A required string field from the request context
    pub fn require_str(&self, key: &str) -> Result<&'a str> {
        self.optional_str(key).ok_or_else(|| {
            Error::Validation(format!(
                "task '{}' requires context field '{key}'",
                self.request.task_name()
            ))
        })
    }

    /// Fail with [`Error::Cancelled`] if the request was cancelled
    pub fn ensure_not_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// A single task an agent can perform
#[async_trait::async_trait]
pub trait TaskHandler: Send + Sync {
    /// Task metadata
    fn definition(&self) -> &TaskDefinition;

    /// Prepare the handler; called once from `Agent::initialize`
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Release resources; called once from `Agent::shutdown`
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    /// Run the task
    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value>;
}

/// Registry for an agent's task handlers
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its task key
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        let key = handler.definition().name.clone();
        debug!(task = %key, "Registering task handler");
        self.handlers.insert(key, handler);
    }

    /// Register a handler, builder style
    #[must_use]
    pub fn with(mut self, handler: impl TaskHandler + 'static) -> Self {
        self.register(Arc::new(handler));
        self
    }

    /// Get a handler by task key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(key).cloned()
    }

    /// Check if a task key is registered
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Task keys in sorted order
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// All task definitions in key order
    #[must_use]
    pub fn list_definitions(&self) -> Vec<&TaskDefinition> {
        self.handlers.values().map(|h| h.definition()).collect()
    }

    /// Iterate over handlers in key order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TaskHandler>> {
        self.handlers.values()
    }

    /// Number of handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
