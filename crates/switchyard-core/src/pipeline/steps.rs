use super::{StepOutput, WorkflowContext, WorkflowStep};
use crate::error::{Error, Result};
use crate::message::AgentRequest;
use chrono::Utc;
use serde_json::json;
use switchyard_tools::{detect_language, Language};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Order of [`ValidationStep`]; nothing can run before it
pub const VALIDATION_ORDER: i32 = i32::MIN;

/// Rejects malformed requests before any agent sees them
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationStep;

impl ValidationStep {
    /// Check every required field
    pub fn validate(request: &AgentRequest) -> Result<()> {
        let request_id = request.request_id().trim();
        if request_id.is_empty() {
            return Err(Error::Validation("request_id is required".to_string()));
        }
        if Uuid::parse_str(request_id).is_err() {
            return Err(Error::Validation(format!(
                "request_id '{request_id}' is not a valid UUID"
            )));
        }
        if request.task_name().trim().is_empty() {
            return Err(Error::Validation("task_name is required".to_string()));
        }
        if request.user_id().trim().is_empty() {
            return Err(Error::Validation("user_id is required".to_string()));
        }
        if request.context_type().trim().is_empty() {
            return Err(Error::Validation("context_type is required".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WorkflowStep for ValidationStep {
    fn name(&self) -> &str {
        "validation"
    }

    fn order(&self) -> i32 {
        VALIDATION_ORDER
    }

    async fn execute(
        &self,
        request: &AgentRequest,
        _context: &WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutput> {
        Self::validate(request)?;
        Ok(StepOutput::empty())
    }
}

/// Records the normalized task key, the user and the receive time
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextEnrichmentStep;

#[async_trait::async_trait]
impl WorkflowStep for ContextEnrichmentStep {
    fn name(&self) -> &str {
        "enrichment"
    }

    fn order(&self) -> i32 {
        100
    }

    async fn execute(
        &self,
        request: &AgentRequest,
        _context: &WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutput> {
        Ok(StepOutput::empty()
            .with("task_key", json!(request.task_key()))
            .with("user_id", json!(request.user_id()))
            .with("received_at", json!(Utc::now().to_rfc3339())))
    }
}

/// Detects the source language of requests that carry code or a file path
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageDetectionStep;

#[async_trait::async_trait]
impl WorkflowStep for LanguageDetectionStep {
    fn name(&self) -> &str {
        "language_detection"
    }

    fn order(&self) -> i32 {
        200
    }

    fn can_handle(&self, request: &AgentRequest) -> bool {
        request.context_str("code").is_some() || request.context_str("file_path").is_some()
    }

    async fn execute(
        &self,
        request: &AgentRequest,
        _context: &WorkflowContext,
        _cancel: &CancellationToken,
    ) -> Result<StepOutput> {
        let language = detect_language(
            request.context_str("language"),
            request.context_str("file_path"),
            request.context_str("code").unwrap_or_default(),
        );
        if language == Language::Unknown {
            return Ok(StepOutput::empty());
        }
        Ok(StepOutput::empty().with("language", json!(language.as_str())))
    }
}
