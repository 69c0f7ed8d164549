//! Router - context type to agent dispatch
//!
//! The router keeps an ordered many-to-many mapping from context types to
//! agents:
//! - one agent: the request is dispatched directly
//! - several agents: dispatched sequentially in registration order under
//!   the configured [`DispatchPolicy`], then merged
//! - none: a `NotFound` failure

mod merge;
mod policy;


pub use merge::merge_responses;
pub use policy::{DispatchPolicy, RouterConfig};

use crate::agents::SharedAgent;
use crate::error::{Error, Result};
use crate::message::{AgentRequest, AgentResponse};
use crate::pipeline::WorkflowContext;
use crate::status::{AgentStatus, StatusTracker};
use crate::utils::{retry_with_backoff, RetryConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument, Span};

/// Name used on responses the router produces itself
pub const ROUTER_NAME: &str = "router";

/// Routes requests to registered agents
pub struct ContextRouter {
    registrations: Vec<(String, String)>,
    agents: HashMap<String, SharedAgent>,
    order: Vec<String>,
    config: RouterConfig,
    status: StatusTracker,
    span: Span,
}

impl ContextRouter {
    /// Create an empty router sharing `status`
    #[must_use]
    pub fn new(status: StatusTracker) -> Self {
        Self {
            registrations: Vec::new(),
            agents: HashMap::new(),
            order: Vec::new(),
            config: RouterConfig::default(),
            status,
            span: Span::none(),
        }
    }

    /// Set the router configuration
    #[must_use]
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the multi-agent dispatch policy
    #[must_use]
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.config.dispatch_policy = policy;
        self
    }

    /// Set the backoff used between retries
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the span dispatches are recorded under
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Register an agent for every context type in its [`AgentInfo`](crate::agents::AgentInfo)
    pub fn register(&mut self, agent: SharedAgent) -> Result<()> {
        let context_types = agent.info().context_types.clone();
        if context_types.is_empty() {
            return Err(Error::Configuration(format!(
                "agent '{}' declares no context types",
                agent.name()
            )));
        }
        for context_type in context_types {
            self.register_for(context_type, agent.clone())?;
        }
        Ok(())
    }

    /// Register an agent for one context type
    pub fn register_for(&mut self, context_type: impl Into<String>, agent: SharedAgent) -> Result<()> {
        let context_type = context_type.into();
        let name = agent.name().to_string();

        match self.agents.get(&name) {
            Some(existing) if !Arc::ptr_eq(existing, &agent) => {
                return Err(Error::Configuration(format!(
                    "another agent is already registered as '{name}'"
                )));
            }
            Some(_) => {}
            None => {
                self.agents.insert(name.clone(), agent);
                self.order.push(name.clone());
            }
        }

        if self
            .registrations
            .iter()
            .any(|(ct, a)| *ct == context_type && *a == name)
        {
            return Ok(());
        }
        debug!(context_type = %context_type, agent = %name, "Registered route");
        self.registrations.push((context_type, name));
        Ok(())
    }

    /// Look up an agent by name
    #[must_use]
    pub fn agent(&self, name: &str) -> Option<SharedAgent> {
        self.agents.get(name).cloned()
    }

    /// Every registered agent, in registration order
    #[must_use]
    pub fn agents(&self) -> Vec<SharedAgent> {
        self.order
            .iter()
            .filter_map(|name| self.agents.get(name).cloned())
            .collect()
    }

    /// Registered context types, sorted and deduplicated
    #[must_use]
    pub fn list_context_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.registrations.iter().map(|(ct, _)| ct.clone()).collect();
        types.sort();
        types.dedup();
        types
    }

    /// Agent names for a context type, in registration order
    #[must_use]
    pub fn list_agents_for_context_type(&self, context_type: &str) -> Vec<String> {
        self.registrations
            .iter()
            .filter(|(ct, _)| ct == context_type)
            .map(|(_, agent)| agent.clone())
            .collect()
    }

    /// Status of an agent; unknown ids report `Pending`
    #[must_use]
    pub fn get_agent_status(&self, agent_id: &str) -> AgentStatus {
        self.status.get_agent_status(agent_id)
    }

    /// Route with an empty workflow context and no cancellation
    pub async fn route(&self, request: &AgentRequest) -> AgentResponse {
        self.route_with(request, &WorkflowContext::new(), &CancellationToken::new())
            .await
    }

    /// Dispatch and merge into a single response
    pub async fn route_with(
        &self,
        request: &AgentRequest,
        context: &WorkflowContext,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let responses = self.dispatch(request, context, cancel).await;
        merge_responses(request, responses)
    }

    /// Dispatch to every agent for the request's context type, unmerged.
    ///
    /// Never empty: an unknown context type yields one `NotFound` failure.
    pub async fn dispatch(
        &self,
        request: &AgentRequest,
        context: &WorkflowContext,
        cancel: &CancellationToken,
    ) -> Vec<AgentResponse> {
        self.dispatch_inner(request, context, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn dispatch_inner(
        &self,
        request: &AgentRequest,
        context: &WorkflowContext,
        cancel: &CancellationToken,
    ) -> Vec<AgentResponse> {
        let targets = self.list_agents_for_context_type(request.context_type());
        if targets.is_empty() {
            warn!(context_type = %request.context_type(), "No agent registered");
            let err = Error::NotFound(request.context_type().to_string());
            return vec![AgentResponse::from_error(request, ROUTER_NAME, &err)];
        }

        debug!(
            request_id = %request.request_id(),
            context_type = %request.context_type(),
            agents = targets.len(),
            policy = %self.config.dispatch_policy,
            "Dispatching request"
        );

        let mut responses = Vec::with_capacity(targets.len());
        for name in &targets {
            let Some(agent) = self.agents.get(name) else {
                continue;
            };
            let response = agent.execute(request, context, cancel).await;
            let failed = !response.is_success;
            responses.push(response);

            if failed && self.config.dispatch_policy == DispatchPolicy::ShortCircuit {
                info!(agent = %name, "Short-circuiting after failed response");
                break;
            }
        }
        responses
    }

    /// Route with at most `max_retries` retries of transient failures
    pub async fn route_with_retry(&self, request: &AgentRequest, max_retries: u32) -> AgentResponse {
        self.route_with_retry_in(
            request,
            max_retries,
            &WorkflowContext::new(),
            &CancellationToken::new(),
        )
        .await
    }

    /// Full form of [`route_with_retry`](Self::route_with_retry).
    ///
    /// Makes at most `max_retries + 1` attempts. Only `Transient` failures
    /// are retried; when retries run out the last response is returned.
    pub async fn route_with_retry_in(
        &self,
        request: &AgentRequest,
        max_retries: u32,
        context: &WorkflowContext,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let config = self.config.retry.clone().with_max_retries(max_retries);

        let outcome = retry_with_backoff(
            &config,
            cancel,
            move |attempt| async move {
                debug!(request_id = %request.request_id(), attempt, "Routing attempt");
                let response = self.route_with(request, context, cancel).await;
                if response.is_success {
                    Ok(response)
                } else {
                    Err(response)
                }
            },
            AgentResponse::is_transient,
        )
        .await;

        match outcome {
            Ok(response) => response,
            Err(e) => {
                if e.attempts > 1 {
                    warn!(
                        request_id = %request.request_id(),
                        attempts = e.attempts,
                        cancelled = e.cancelled,
                        "Giving up after retries"
                    );
                }
                e.last_error
            }
        }
    }
}
