use crate::utils::RetryConfig;
use serde::{Deserialize, Serialize};

/// How a request routed to several agents is dispatched.
///
/// A retry always re-dispatches the whole request. Under `AggregateAll` a
/// merged failure whose failures are all transient is retried, so agents
/// that already succeeded run again; their side effects must tolerate that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Run every agent and merge all responses
    #[default]
    AggregateAll,
    /// Stop after the first failed response
    ShortCircuit,
}

impl DispatchPolicy {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AggregateAll => "aggregate_all",
            Self::ShortCircuit => "short_circuit",
        }
    }
}

impl std::fmt::Display for DispatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Router settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Multi-agent dispatch policy
    pub dispatch_policy: DispatchPolicy,
    /// Backoff used by `route_with_retry`; `max_retries` is its default retry count
    pub retry: RetryConfig,
}
