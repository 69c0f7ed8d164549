use super::handlers::{HandlerInput, HandlerRegistry};
use super::types::{AgentInfo, AgentServices};
use crate::error::{AggregateError, Error, Result};
use crate::message::{AgentRequest, AgentResponse, TaskMessage};
use crate::pipeline::WorkflowContext;
use crate::status::{AgentStatus, StatusGuard};
use futures::future::join_all;
use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// A routed capability unit with a uniform lifecycle.
///
/// Implementors supply their [`AgentInfo`], [`HandlerRegistry`] and
/// [`AgentServices`]; the lifecycle operations are provided.
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Static description
    fn info(&self) -> &AgentInfo;

    /// Task handlers
    fn handlers(&self) -> &HandlerRegistry;

    /// Injected collaborators
    fn services(&self) -> &AgentServices;

    /// Agent name
    fn name(&self) -> &str {
        &self.info().name
    }

    /// Current status
    fn status(&self) -> AgentStatus {
        self.services().status.get_agent_status(self.name())
    }

    /// Initialize every handler concurrently.
    ///
    /// All failures are collected into one [`AggregateError`]; any failure
    /// leaves the agent `Failed`.
    async fn initialize(&self) -> Result<()> {
        let span = self.services().span.clone();
        initialize_handlers(self).instrument(span).await
    }

    /// Execute one request. Never panics and never fails; problems become a
    /// failed response.
    async fn execute(
        &self,
        request: &AgentRequest,
        context: &WorkflowContext,
        cancel: &CancellationToken,
    ) -> AgentResponse {
        let span = self.services().span.clone();
        execute_task(self, request, context, cancel)
            .instrument(span)
            .await
    }

    /// Shut down every handler concurrently.
    ///
    /// Status becomes `Pending` on success and `Failed` on any failure.
    async fn shutdown(&self) -> Result<()> {
        let span = self.services().span.clone();
        shutdown_handlers(self).instrument(span).await
    }

    /// Receive a message from another agent; acknowledges by default
    async fn handle_message(&self, message: &TaskMessage) -> AgentResponse {
        debug!(agent = %self.name(), sender = %message.sender, "Message received");
        AgentResponse::reply(
            message,
            self.name(),
            json!({"acknowledged": message.message_id}),
        )
    }
}

/// Shared agent handle
pub type SharedAgent = Arc<dyn Agent>;

async fn initialize_handlers<A: Agent + ?Sized>(agent: &A) -> Result<()> {
    let name = agent.name().to_string();
    let guard = StatusGuard::begin(&agent.services().status, name.clone());

    let results = join_all(agent.handlers().iter().map(|handler| async move {
        (handler.definition().name.clone(), handler.initialize().await)
    }))
    .await;

    let mut failures = AggregateError::new();
    for (task, result) in results {
        if let Err(e) = result {
            failures.push(task, e);
        }
    }

    if failures.is_empty() {
        info!(agent = %name, tasks = agent.handlers().len(), "Agent initialized");
    } else {
        error!(agent = %name, error = %failures, "Agent initialization failed");
    }
    guard.finish_with(failures.is_empty());
    failures.into_result()
}

async fn shutdown_handlers<A: Agent + ?Sized>(agent: &A) -> Result<()> {
    let name = agent.name();

    let results = join_all(agent.handlers().iter().map(|handler| async move {
        (handler.definition().name.clone(), handler.shutdown().await)
    }))
    .await;

    let mut failures = AggregateError::new();
    for (task, result) in results {
        if let Err(e) = result {
            failures.push(task, e);
        }
    }

    let status = if failures.is_empty() {
        info!(agent = %name, "Agent shut down");
        AgentStatus::Pending
    } else {
        warn!(agent = %name, error = %failures, "Agent shutdown reported failures");
        AgentStatus::Failed
    };
    agent.services().status.update_agent_status(name, status);
    failures.into_result()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn execute_task<A: Agent + ?Sized>(
    agent: &A,
    request: &AgentRequest,
    context: &WorkflowContext,
    cancel: &CancellationToken,
) -> AgentResponse {
    let services = agent.services();
    let name = agent.name();
    services.record_execution();

    let guard = StatusGuard::begin(&services.status, name);
    let key = request.task_key();
    let start = Instant::now();

    let Some(handler) = agent.handlers().get(&key) else {
        warn!(agent = %name, task = %request.task_name(), "Unsupported task");
        guard.finish(AgentStatus::Failed);
        let err = Error::UnsupportedTask {
            agent: name.to_string(),
            task: request.task_name().to_string(),
        };
        return AgentResponse::from_error(request, name, &err);
    };

    let input = HandlerInput {
        request,
        context,
        cancel,
    };

    let guarded = async {
        match AssertUnwindSafe(handler.handle(input)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                error!(agent = %name, task = %key, panic = %msg, "Task handler panicked");
                Err(Error::Fatal(format!("task '{key}' panicked: {msg}")))
            }
        }
    };

    let bounded = async {
        match services.execute_timeout {
            Some(limit) => tokio::time::timeout(limit, guarded)
                .await
                .unwrap_or_else(|_| {
                    Err(Error::Transient(format!(
                        "task '{key}' timed out after {}ms",
                        limit.as_millis()
                    )))
                }),
            None => guarded.await,
        }
    };

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = bounded => result,
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(result) => {
            guard.finish(AgentStatus::Completed);
            debug!(agent = %name, task = %key, elapsed_ms, "Task completed");
            AgentResponse::success(request, name, result)
        }
        Err(e) => {
            guard.finish(AgentStatus::Failed);
            warn!(agent = %name, task = %key, kind = %e.kind(), error = %e, elapsed_ms, "Task failed");
            AgentResponse::from_error(request, name, &e)
        }
    }
}
