//! Switchyard Core - agent orchestration
//!
//! This crate provides the orchestration core of Switchyard, including:
//! - Message: request, response and agent-to-agent message envelopes
//! - Agents: the agent lifecycle and the built-in agent variants
//! - Pipeline: ordered validation and enrichment steps
//! - Router: context type to agent dispatch with bounded retry
//! - Status: concurrent per-agent lifecycle tracking
//! - Boundary: transport wire shapes
//! - Host: the `Switchyard` facade tying it all together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod boundary;
pub mod config;
pub mod error;
pub mod host;
pub mod message;
pub mod pipeline;
pub mod router;
pub mod status;
pub mod utils;

pub use agents::{
    Agent, AgentInfo, AgentServices, CodeAnalyzerAgent, DesignAgent, FileEditorAgent,
    HandlerRegistry, IntentRouterAgent, SharedAgent, TaskHandler,
};
pub use boundary::{ErrorBody, StatusClass, TransportRequest, TransportResponse, TransportStatus};
pub use config::{AgentsConfig, CacheConfig, LlmConfig, ProviderKind, SwitchyardConfig};
pub use error::{
    format_error_for_cli, AggregateError, Error, ErrorKind, Result, UserFriendlyError,
};
pub use host::{Switchyard, SwitchyardBuilder, PIPELINE_NAME};
pub use message::{AgentRequest, AgentResponse, TaskMessage};
pub use pipeline::{Pipeline, PipelineReport, StepOutput, WorkflowContext, WorkflowStep};
pub use router::{ContextRouter, DispatchPolicy, RouterConfig};
pub use status::{AgentStatus, StatusGuard, StatusTracker};
pub use utils::{RetryConfig, RetryError};
