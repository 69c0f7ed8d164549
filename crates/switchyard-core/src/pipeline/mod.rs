//! Workflow pipeline - ordered steps over a request-scoped context
//!
//! Every request passes through the pipeline before it is routed:
//! - steps run in ascending `order`, ties in registration order
//! - a step whose `can_handle` is false is skipped without side effects
//! - the first failing step aborts the run; earlier writes stay in the
//!   caller's context
//!
//! [`ValidationStep`] is always installed and always runs first.

mod context;
mod step;
mod steps;


pub use context::WorkflowContext;
pub use step::{StepOutput, WorkflowStep};
pub use steps::{ContextEnrichmentStep, LanguageDetectionStep, ValidationStep, VALIDATION_ORDER};

use crate::error::{Error, Result};
use crate::message::AgentRequest;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument, Span};

/// What happened during a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Steps that executed, in execution order
    pub executed: Vec<String>,
    /// Steps skipped because `can_handle` was false
    pub skipped: Vec<String>,
}

/// Ordered chain of [`WorkflowStep`]s
pub struct Pipeline {
    steps: Vec<Arc<dyn WorkflowStep>>,
    span: Span,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Pipeline containing only [`ValidationStep`]
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: vec![Arc::new(ValidationStep)],
            span: Span::none(),
        }
    }

    /// Pipeline with validation, enrichment and language detection
    #[must_use]
    pub fn with_default_steps() -> Self {
        Self::new()
            .with_step(ContextEnrichmentStep)
            .with_step(LanguageDetectionStep)
    }

    /// Set the span runs are recorded under
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Add a step
    #[must_use]
    pub fn with_step(mut self, step: impl WorkflowStep + 'static) -> Self {
        self.add_step(Arc::new(step));
        self
    }

    /// Add a shared step, keeping the list sorted by order
    pub fn add_step(&mut self, step: Arc<dyn WorkflowStep>) {
        debug!(step = %step.name(), order = step.order(), "Registered workflow step");
        self.steps.push(step);
        // stable: equal orders keep registration sequence
        self.steps.sort_by_key(|s| s.order());
    }

    /// Step names in execution order
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; validation is always installed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every applicable step against `context`
    pub async fn run(
        &self,
        request: &AgentRequest,
        context: &mut WorkflowContext,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport> {
        self.run_steps(request, context, cancel)
            .instrument(self.span.clone())
            .await
    }

    async fn run_steps(
        &self,
        request: &AgentRequest,
        context: &mut WorkflowContext,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        for step in &self.steps {
            if cancel.is_cancelled() {
                warn!(request_id = %request.request_id(), step = %step.name(), "Pipeline cancelled");
                return Err(Error::Cancelled);
            }

            if !step.can_handle(request) {
                debug!(step = %step.name(), "Step skipped");
                report.skipped.push(step.name().to_string());
                continue;
            }

            let output = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                result = step.execute(request, context, cancel) => result,
            };

            let output = match output {
                Ok(output) => output,
                Err(e) => {
                    warn!(
                        request_id = %request.request_id(),
                        step = %step.name(),
                        error = %e,
                        "Pipeline step failed"
                    );
                    return Err(e);
                }
            };

            context.merge(step.name(), output.entries)?;
            debug!(step = %step.name(), "Step completed");
            report.executed.push(step.name().to_string());
        }

        Ok(report)
    }
}
