use super::WorkflowContext;
use crate::error::Result;
use crate::message::AgentRequest;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Entries a step wants merged into the workflow context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutput {
    /// Key/value pairs, merged in order
    pub entries: Vec<(String, Value)>,
}

impl StepOutput {
    /// Output that writes nothing
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add an entry
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.push((key.into(), value));
        self
    }
}

/// One stage of the workflow pipeline.
///
/// Steps read the context and return the entries they want written; the
/// pipeline performs the write, so a step that fails or is skipped never
/// mutates the context.
#[async_trait::async_trait]
pub trait WorkflowStep: Send + Sync {
    /// Step name, also recorded as the writer of its entries
    fn name(&self) -> &str;

    /// Position in the pipeline; lower runs first
    fn order(&self) -> i32;

    /// Whether this step applies to the request
    fn can_handle(&self, _request: &AgentRequest) -> bool {
        true
    }

    /// Run the step
    async fn execute(
        &self,
        request: &AgentRequest,
        context: &WorkflowContext,
        cancel: &CancellationToken,
    ) -> Result<StepOutput>;
}
