//! Error types for switchyard-core
//!
//! This module provides the core error type, the [`ErrorKind`] taxonomy
//! carried on failed responses, and user-friendly error formatting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failure, carried on every failed `AgentResponse`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The request was malformed
    Validation,
    /// No agent is registered for the context type
    NotFound,
    /// The agent has no handler for the task
    UnsupportedTask,
    /// A retry may succeed (timeouts, connection failures, rate limits)
    Transient,
    /// The failure will repeat on retry
    Fatal,
    /// A downstream provider rejected the call
    Provider,
    /// The operation was cancelled
    Cancelled,
}

impl ErrorKind {
    /// Whether the router may retry a response of this kind
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::UnsupportedTask => "unsupported_task",
            Self::Transient => "transient",
            Self::Fatal => "fatal",
            Self::Provider => "provider",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Request failed validation
    #[error("validation error: {0}")]
    Validation(String),

    /// No agent registered for a context type
    #[error("no agent registered for context type: {0}")]
    NotFound(String),

    /// Agent has no handler for the task
    #[error("agent '{agent}' does not support task '{task}'")]
    UnsupportedTask {
        /// Agent name
        agent: String,
        /// Task name as requested
        task: String,
    },

    /// Retryable failure
    #[error("transient error: {0}")]
    Transient(String),

    /// Non-retryable failure
    #[error("fatal error: {0}")]
    Fatal(String),

    /// Operation cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// Several sub-operations failed
    #[error("{0}")]
    Aggregate(AggregateError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// LLM provider error
    #[error("llm error: {0}")]
    Llm(#[from] switchyard_llm::Error),

    /// Tool error
    #[error("tool error: {0}")]
    Tool(#[from] switchyard_tools::Error),

    /// Malformed JSON input or output
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Classify the error for a failed response
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::Serialization(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::UnsupportedTask { .. } => ErrorKind::UnsupportedTask,
            Error::Transient(_) => ErrorKind::Transient,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Fatal(_) | Error::Aggregate(_) | Error::Configuration(_) => ErrorKind::Fatal,
            Error::Llm(switchyard_llm::Error::Cancelled) => ErrorKind::Cancelled,
            Error::Llm(e) if e.is_transient() => ErrorKind::Transient,
            Error::Llm(_) => ErrorKind::Provider,
            Error::Tool(switchyard_tools::Error::UnsupportedLanguage(_)) => {
                ErrorKind::UnsupportedTask
            }
            Error::Tool(_) => ErrorKind::Fatal,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure of a fan-out operation, labelled by the sub-operation that produced it
#[derive(Debug, Default)]
pub struct AggregateError {
    failures: Vec<(String, Error)>,
}

impl AggregateError {
    /// Create an empty aggregate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn push(&mut self, source: impl Into<String>, error: Error) {
        self.failures.push((source.into(), error));
    }

    /// Recorded failures in the order they were pushed
    #[must_use]
    pub fn failures(&self) -> &[(String, Error)] {
        &self.failures
    }

    /// Number of failures
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Check if nothing failed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// `Ok(())` when empty, otherwise the aggregate as an [`Error`]
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Aggregate(self))
        }
    }
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failure(s): ", self.failures.len())?;
        for (i, (source, error)) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{source}: {error}")?;
        }
        Ok(())
    }
}

/// Trait for user-friendly error messages
///
/// Provides human-readable error messages and suggestions for fixing.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => format!("📋 Invalid request: {msg}"),
            Error::NotFound(context_type) => {
                format!("🔎 No agent handles context type '{context_type}'.")
            }
            Error::UnsupportedTask { agent, task } => {
                format!("🧩 Agent '{agent}' cannot perform '{task}'.")
            }
            Error::Transient(msg) => format!("⏳ Temporary failure: {msg}"),
            Error::Fatal(msg) => format!("❌ Failed: {msg}"),
            Error::Cancelled => "✋ The operation was cancelled.".to_string(),
            Error::Aggregate(agg) => format!("❌ {agg}"),
            Error::Configuration(msg) => format!("⚙️ Configuration error: {msg}"),
            Error::Llm(e) => format!("🤖 LLM error: {e}"),
            Error::Tool(e) => format!("🔧 Tool error: {e}"),
            Error::Serialization(e) => format!("📋 Malformed JSON: {e}"),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::NotFound(_) => {
                Some("💡 Run `switchyard contexts` to list registered context types.".to_string())
            }
            Error::UnsupportedTask { .. } => Some(
                "💡 Run `switchyard agents <context-type>` to see which agents can help."
                    .to_string(),
            ),
            Error::Transient(_) => Some("💡 Retry with `--retries`.".to_string()),
            Error::Configuration(_) => Some(
                "💡 Check config/default.toml or the SWITCHYARD_* environment variables."
                    .to_string(),
            ),
            Error::Llm(e) if e.is_transient() => {
                Some("💡 Check that the LLM provider is running and reachable.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();
    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }
    output.push('\n');
    output
}
