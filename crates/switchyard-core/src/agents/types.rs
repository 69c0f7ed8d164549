use crate::status::StatusTracker;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Span;

/// Static description of an agent, fixed at registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Unique agent name, also its status id
    pub name: String,
    /// Agent family (e.g. "design", "analysis")
    pub agent_type: String,
    /// Languages the agent understands
    #[serde(default)]
    pub supported_languages: Vec<String>,
    /// Task keys the agent can execute
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Context types the agent is routed for
    #[serde(default)]
    pub context_types: Vec<String>,
}

impl AgentInfo {
    /// Create a new agent description
    #[must_use]
    pub fn new(name: impl Into<String>, agent_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent_type: agent_type.into(),
            supported_languages: Vec::new(),
            capabilities: Vec::new(),
            context_types: Vec::new(),
        }
    }

    /// Add a supported language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.supported_languages.push(language.into());
        self
    }

    /// Add a capability
    #[must_use]
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Add a context type
    #[must_use]
    pub fn with_context_type(mut self, context_type: impl Into<String>) -> Self {
        self.context_types.push(context_type.into());
        self
    }
}

/// Runtime collaborators injected into every agent
#[derive(Debug, Clone)]
pub struct AgentServices {
    /// Shared status registry
    pub status: StatusTracker,
    /// Span agent operations are recorded under
    pub span: Span,
    /// Upper bound for a single `execute`
    pub execute_timeout: Option<Duration>,
    executions: Arc<AtomicU64>,
}

impl AgentServices {
    /// Create services around a status tracker
    #[must_use]
    pub fn new(status: StatusTracker) -> Self {
        Self {
            status,
            span: Span::none(),
            execute_timeout: None,
            executions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set the span
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Set the execute timeout
    #[must_use]
    pub fn with_execute_timeout(mut self, timeout: Duration) -> Self {
        self.execute_timeout = Some(timeout);
        self
    }

    /// Number of `execute` calls so far
    #[must_use]
    pub fn execution_count(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    pub(crate) fn record_execution(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }
}
