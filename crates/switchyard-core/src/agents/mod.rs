//! Agents - routed capability units
//!
//! Every agent exposes the same lifecycle through the [`Agent`] trait:
//! - `initialize`: prepare all task handlers concurrently
//! - `execute`: dispatch one request to the handler for its task key
//! - `shutdown`: release all task handlers concurrently
//! - `handle_message`: react to a message from another agent
//!
//! Variants only describe themselves and their handlers:
//! - [`DesignAgent`]: architecture analysis, design plans, scaffolds, patterns
//! - [`CodeAnalyzerAgent`]: static analysis and refactoring
//! - [`FileEditorAgent`]: file reads and edits
//! - [`IntentRouterAgent`]: prompt classification

mod agent;
pub mod analyzer;
pub mod design;
pub mod file_editor;
pub mod handlers;
pub mod intent_router;
mod keywords;
mod types;

#[cfg(test)]
mod tests;

pub use agent::{Agent, SharedAgent};
pub use analyzer::{CodeAnalyzerAgent, CODE_ANALYZER_AGENT};
pub use design::{DesignAgent, DESIGN_AGENT};
pub use file_editor::{FileEditorAgent, FILE_EDITOR_AGENT};
pub use handlers::{HandlerInput, HandlerRegistry, TaskDefinition, TaskHandler};
pub use intent_router::{classify_by_rules, Intent, IntentRouterAgent, INTENT_ROUTER_AGENT};
pub use types::{AgentInfo, AgentServices};
