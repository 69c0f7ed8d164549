//! Host - wires pipeline, router, agents and status together

use crate::agents::{
    AgentServices, CodeAnalyzerAgent, DesignAgent, FileEditorAgent, IntentRouterAgent,
    SharedAgent,
};
use crate::boundary::{TransportRequest, TransportResponse};
use crate::config::SwitchyardConfig;
use crate::error::{AggregateError, Result};
use crate::message::{AgentRequest, AgentResponse, TaskMessage};
use crate::pipeline::{Pipeline, WorkflowContext, WorkflowStep};
use crate::router::ContextRouter;
use crate::status::{AgentStatus, StatusTracker};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use switchyard_llm::{CachedProvider, SharedProvider};
use switchyard_tools::SharedFileSystem;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument, Span};

/// Agent name reported when the pipeline rejects a request
pub const PIPELINE_NAME: &str = "pipeline";

/// Builder for [`Switchyard`]
pub struct SwitchyardBuilder {
    config: SwitchyardConfig,
    status: StatusTracker,
    pipeline: Pipeline,
    agents: Vec<SharedAgent>,
    span: Span,
}

impl SwitchyardBuilder {
    /// Start from a configuration with no agents and the default pipeline
    #[must_use]
    pub fn new(config: SwitchyardConfig) -> Self {
        let span = info_span!("switchyard");
        Self {
            config,
            status: StatusTracker::new(),
            pipeline: Pipeline::with_default_steps()
                .with_span(info_span!(parent: &span, "pipeline")),
            agents: Vec::new(),
            span,
        }
    }

    /// Default agent set over `provider` (cached) and `fs`
    #[must_use]
    pub fn from_config(
        config: SwitchyardConfig,
        provider: SharedProvider,
        fs: SharedFileSystem,
    ) -> Self {
        let cached = Arc::new(CachedProvider::with_ttl(provider, config.cache.ttl()));
        let builder = Self::new(config);

        let design = DesignAgent::new(cached.clone(), builder.services_for("design"));
        let analyzer = CodeAnalyzerAgent::new(builder.services_for("code_analyzer"));
        let editor = FileEditorAgent::new(fs, builder.services_for("file_editor"));
        let intent = IntentRouterAgent::new(Some(cached), builder.services_for("intent_router"));

        builder
            .with_agent(Arc::new(design))
            .with_agent(Arc::new(analyzer))
            .with_agent(Arc::new(editor))
            .with_agent(Arc::new(intent))
    }

    /// Shared status tracker agents must report to
    #[must_use]
    pub fn status(&self) -> &StatusTracker {
        &self.status
    }

    /// Services for an agent: shared status, a child span and the configured timeout
    #[must_use]
    pub fn services_for(&self, agent_name: &str) -> AgentServices {
        let mut services = AgentServices::new(self.status.clone())
            .with_span(info_span!(parent: &self.span, "agent", name = %agent_name));
        if let Some(timeout) = self.config.agents.execute_timeout() {
            services = services.with_execute_timeout(timeout);
        }
        services
    }

    /// Add an agent
    #[must_use]
    pub fn with_agent(mut self, agent: SharedAgent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Add a pipeline step
    #[must_use]
    pub fn with_step(mut self, step: impl WorkflowStep + 'static) -> Self {
        self.pipeline = self.pipeline.with_step(step);
        self
    }

    /// Build the host, registering every agent with the router
    pub fn build(self) -> Result<Switchyard> {
        self.config.validate()?;

        let mut router = ContextRouter::new(self.status.clone())
            .with_config(self.config.router.clone())
            .with_span(info_span!(parent: &self.span, "router"));
        for agent in self.agents {
            router.register(agent)?;
        }

        Ok(Switchyard {
            config: self.config,
            status: self.status,
            pipeline: self.pipeline,
            router,
            span: self.span,
        })
    }
}

/// The orchestration host
pub struct Switchyard {
    config: SwitchyardConfig,
    status: StatusTracker,
    pipeline: Pipeline,
    router: ContextRouter,
    span: Span,
}

impl Switchyard {
    /// Configuration in effect
    #[must_use]
    pub fn config(&self) -> &SwitchyardConfig {
        &self.config
    }

    /// Router
    #[must_use]
    pub fn router(&self) -> &ContextRouter {
        &self.router
    }

    /// Pipeline
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Status of one agent
    #[must_use]
    pub fn get_agent_status(&self, agent_id: &str) -> AgentStatus {
        self.status.get_agent_status(agent_id)
    }

    /// Status of every agent that has reported
    #[must_use]
    pub fn status_snapshot(&self) -> BTreeMap<String, AgentStatus> {
        self.status.snapshot()
    }

    /// Registered context types
    #[must_use]
    pub fn list_context_types(&self) -> Vec<String> {
        self.router.list_context_types()
    }

    /// Agents registered for a context type
    #[must_use]
    pub fn list_agents_for_context_type(&self, context_type: &str) -> Vec<String> {
        self.router.list_agents_for_context_type(context_type)
    }

    /// Initialize every agent concurrently
    pub async fn initialize_all(&self) -> Result<()> {
        let agents = self.router.agents();
        let results = join_all(agents.iter().map(|agent| agent.initialize()))
            .instrument(self.span.clone())
            .await;

        let mut failures = AggregateError::new();
        for (agent, result) in agents.iter().zip(results) {
            if let Err(e) = result {
                failures.push(agent.name(), e);
            }
        }
        if failures.is_empty() {
            info!(agents = agents.len(), "All agents initialized");
        }
        failures.into_result()
    }

    /// Shut down every agent concurrently
    pub async fn shutdown_all(&self) -> Result<()> {
        let agents = self.router.agents();
        let results = join_all(agents.iter().map(|agent| agent.shutdown()))
            .instrument(self.span.clone())
            .await;

        let mut failures = AggregateError::new();
        for (agent, result) in agents.iter().zip(results) {
            if let Err(e) = result {
                failures.push(agent.name(), e);
            }
        }
        if failures.is_empty() {
            info!("All agents shut down");
        } else {
            warn!(error = %failures, "Shutdown reported failures");
        }
        failures.into_result()
    }

    /// Pipeline, then routed dispatch with the configured retry count
    pub async fn process(&self, request: &AgentRequest, cancel: &CancellationToken) -> AgentResponse {
        self.process_with_retries(request, self.config.router.retry.max_retries, cancel)
            .await
    }

    /// Pipeline, then routed dispatch with `max_retries` retries
    pub async fn process_with_retries(
        &self,
        request: &AgentRequest,
        max_retries: u32,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let mut context = WorkflowContext::new();
        if let Err(e) = self.pipeline.run(request, &mut context, cancel).await {
            warn!(request_id = %request.request_id(), error = %e, "Request rejected by pipeline");
            return AgentResponse::from_error(request, PIPELINE_NAME, &e);
        }

        self.router
            .route_with_retry_in(request, max_retries, &context, cancel)
            .await
    }

    /// Decode a transport request, process it and encode the outcome
    pub async fn handle_transport(
        &self,
        transport: &TransportRequest,
        cancel: &CancellationToken,
    ) -> TransportResponse {
        let start = Instant::now();
        let request = match transport.to_agent_request() {
            Ok(request) => request,
            Err(e) => {
                warn!(context_type = %transport.context_type, error = %e, "Malformed transport request");
                return TransportResponse::from_error(&transport.context_type, &e, start.elapsed());
            }
        };

        let response = self.process(&request, cancel).await;
        TransportResponse::from_response(&transport.context_type, response, start.elapsed())
    }

    /// Deliver a message to one agent; `None` if no such agent
    pub async fn send_message(&self, agent_name: &str, message: &TaskMessage) -> Option<AgentResponse> {
        let agent = self.router.agent(agent_name)?;
        Some(agent.handle_message(message).await)
    }
}
