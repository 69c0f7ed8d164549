//! Message envelope - requests, responses and agent-to-agent messages

use crate::error::{Error, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Normalize a task name into its dispatch key.
///
/// Lowercases and keeps only alphanumeric characters, so
/// `"Pattern Recommendation"` and `"pattern_recommendation"` both map to
/// `patternrecommendation`.
#[must_use]
pub fn task_key(task_name: &str) -> String {
    task_name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A routed task request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    request_id: String,
    context_type: String,
    task_name: String,
    context: Value,
    user_id: String,
}

impl AgentRequest {
    /// Create a request with a fresh id, an empty context and no user
    #[must_use]
    pub fn new(context_type: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            context_type: context_type.into(),
            task_name: task_name.into(),
            context: Value::Object(serde_json::Map::new()),
            user_id: String::new(),
        }
    }

    /// Set the request id
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Set the task context
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Set the user id
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Request id (a UUID when well-formed)
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Context type used for routing
    #[must_use]
    pub fn context_type(&self) -> &str {
        &self.context_type
    }

    /// Task name as supplied by the caller
    #[must_use]
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    /// Normalized dispatch key for the task
    #[must_use]
    pub fn task_key(&self) -> String {
        task_key(&self.task_name)
    }

    /// Task context
    #[must_use]
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Look up a string field in the context
    #[must_use]
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    /// Requesting user
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// The outcome of one agent handling one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Id of the request this answers
    pub request_id: String,
    /// Agent (or component) that produced the response
    pub agent_name: String,
    /// Task name as requested
    pub task_name: String,
    /// Task result; `null` on failure
    pub result: Value,
    /// Whether the task succeeded
    pub is_success: bool,
    /// Failure message, present iff `!is_success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Failure classification, present iff `!is_success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl AgentResponse {
    /// Successful response
    #[must_use]
    pub fn success(request: &AgentRequest, agent_name: impl Into<String>, result: Value) -> Self {
        Self {
            request_id: request.request_id().to_string(),
            agent_name: agent_name.into(),
            task_name: request.task_name().to_string(),
            result,
            is_success: true,
            error_message: None,
            error_kind: None,
        }
    }

    /// Failed response with an explicit kind
    #[must_use]
    pub fn failure(
        request: &AgentRequest,
        agent_name: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            request_id: request.request_id().to_string(),
            agent_name: agent_name.into(),
            task_name: request.task_name().to_string(),
            result: Value::Null,
            is_success: false,
            error_message: Some(message.into()),
            error_kind: Some(kind),
        }
    }

    /// Failed response classified from an error
    #[must_use]
    pub fn from_error(request: &AgentRequest, agent_name: impl Into<String>, error: &Error) -> Self {
        Self::failure(request, agent_name, error.kind(), error.to_string())
    }

    /// Successful answer to a [`TaskMessage`]
    #[must_use]
    pub fn reply(message: &TaskMessage, agent_name: impl Into<String>, result: Value) -> Self {
        Self {
            request_id: message.message_id.to_string(),
            agent_name: agent_name.into(),
            task_name: "message".to_string(),
            result,
            is_success: true,
            error_message: None,
            error_kind: None,
        }
    }

    /// Whether a retry may change the outcome
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.error_kind.is_some_and(|k| k.is_retryable())
    }
}

/// Agent-to-agent notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    /// Unique message id
    pub message_id: Uuid,
    /// Sending agent or component
    pub sender: String,
    /// Message body
    pub payload: Value,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl TaskMessage {
    /// Create a message stamped now
    #[must_use]
    pub fn new(sender: impl Into<String>, payload: Value) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            sender: sender.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}
