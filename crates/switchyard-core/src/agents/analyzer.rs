//! Code analyzer agent - static analysis and mechanical refactoring

use super::agent::Agent;
use super::handlers::{HandlerInput, HandlerRegistry, TaskDefinition, TaskHandler};
use super::types::{AgentInfo, AgentServices};
use crate::error::Result;
use serde_json::{json, Value};
use switchyard_tools::{analyze, detect_language, refactor_prints_to_logging, Language};
use tracing::debug;

/// Agent name
pub const CODE_ANALYZER_AGENT: &str = "code_analyzer";

/// Handles the `static_analysis` and `refactoring` context types
pub struct CodeAnalyzerAgent {
    info: AgentInfo,
    handlers: HandlerRegistry,
    services: AgentServices,
}

impl CodeAnalyzerAgent {
    /// Create the agent
    #[must_use]
    pub fn new(services: AgentServices) -> Self {
        let handlers = HandlerRegistry::new()
            .with(Analyze {
                definition: TaskDefinition::new("analyze", "Report issues in a code snippet"),
            })
            .with(Refactor {
                definition: TaskDefinition::new(
                    "refactor",
                    "Replace print calls with logging in Python code",
                ),
            })
            .with(Languages {
                definition: TaskDefinition::new("languages", "List supported languages"),
            });

        let mut info = AgentInfo::new(CODE_ANALYZER_AGENT, "analysis")
            .with_context_type("static_analysis")
            .with_context_type("refactoring");
        for language in Language::SUPPORTED {
            info = info.with_language(language.as_str());
        }
        for key in handlers.keys() {
            info = info.with_capability(key);
        }

        Self {
            info,
            handlers,
            services,
        }
    }
}

impl Agent for CodeAnalyzerAgent {
    fn info(&self) -> &AgentInfo {
        &self.info
    }

    fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    fn services(&self) -> &AgentServices {
        &self.services
    }
}

/// Language from the request, then the pipeline, then detection
fn resolve_language(input: &HandlerInput<'_>, code: &str) -> Language {
    let explicit = input
        .optional_str("language")
        .or_else(|| input.context.get_str("language"));
    detect_language(explicit, input.optional_str("file_path"), code)
}

struct Analyze {
    definition: TaskDefinition,
}

#[async_trait::async_trait]
impl TaskHandler for Analyze {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value> {
        let code = input.require_str("code")?;
        let language = resolve_language(&input, code);

        let report = analyze(code, language);
        debug!(language = %language, issues = report.issues.len(), "Analysis finished");
        Ok(serde_json::to_value(report)?)
    }
}

struct Refactor {
    definition: TaskDefinition,
}

#[async_trait::async_trait]
impl TaskHandler for Refactor {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value> {
        let code = input.require_str("code")?;
        let language = resolve_language(&input, code);

        let refactoring = refactor_prints_to_logging(code, language)?;
        Ok(json!({
            "language": language,
            "code": refactoring.code,
            "changes": refactoring.changes,
        }))
    }
}

struct Languages {
    definition: TaskDefinition,
}

#[async_trait::async_trait]
impl TaskHandler for Languages {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, _input: HandlerInput<'_>) -> Result<Value> {
        Ok(json!({ "languages": Language::SUPPORTED }))
    }
}
