//! File editor agent - reads and edits files through a [`FileSystem`]

use super::agent::Agent;
use super::handlers::{HandlerInput, HandlerRegistry, TaskDefinition, TaskHandler};
use super::types::{AgentInfo, AgentServices};
use crate::error::Result;
use serde_json::{json, Value};
use switchyard_tools::{append_text, replace_text, SharedFileSystem};
use tracing::info;

/// Agent name
pub const FILE_EDITOR_AGENT: &str = "file_editor";

/// Handles the `file_edit` context type
pub struct FileEditorAgent {
    info: AgentInfo,
    handlers: HandlerRegistry,
    services: AgentServices,
}

impl FileEditorAgent {
    /// Create the agent over `fs`
    #[must_use]
    pub fn new(fs: SharedFileSystem, services: AgentServices) -> Self {
        let handlers = HandlerRegistry::new()
            .with(FileTask::new(FileOp::Read, fs.clone()))
            .with(FileTask::new(FileOp::Write, fs.clone()))
            .with(FileTask::new(FileOp::Replace, fs.clone()))
            .with(FileTask::new(FileOp::Append, fs));

        let mut info = AgentInfo::new(FILE_EDITOR_AGENT, "editor").with_context_type("file_edit");
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

impl Agent for FileEditorAgent {
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

#[derive(Debug, Clone, Copy)]
enum FileOp {
    Read,
    Write,
    Replace,
    Append,
}

struct FileTask {
    op: FileOp,
    definition: TaskDefinition,
    fs: SharedFileSystem,
}

impl FileTask {
    fn new(op: FileOp, fs: SharedFileSystem) -> Self {
        let definition = match op {
            FileOp::Read => TaskDefinition::new("readfile", "Read a file"),
            FileOp::Write => TaskDefinition::new("writefile", "Write a file, replacing its contents"),
            FileOp::Replace => {
                TaskDefinition::new("replacetext", "Replace every occurrence of a string in a file")
            }
            FileOp::Append => TaskDefinition::new("appendtext", "Append text to a file"),
        };
        Self { op, definition, fs }
    }
}

#[async_trait::async_trait]
impl TaskHandler for FileTask {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value> {
        let path = input.require_str("path")?;

        match self.op {
            FileOp::Read => {
                let content = self.fs.read_all_text(path).await?;
                Ok(json!({ "path": path, "content": content }))
            }
            FileOp::Write => {
                let content = input.request.context_str("content").unwrap_or_default();
                input.ensure_not_cancelled()?;
                self.fs.write_all_text(path, content).await?;
                info!(path = %path, bytes = content.len(), "File written");
                Ok(json!({ "path": path, "bytes": content.len() }))
            }
            FileOp::Replace => {
                let find = input.require_str("find")?;
                let replace = input.request.context_str("replace").unwrap_or_default();
                input.ensure_not_cancelled()?;
                let replacements = replace_text(self.fs.as_ref(), path, find, replace).await?;
                info!(path = %path, replacements, "Text replaced");
                Ok(json!({ "path": path, "replacements": replacements }))
            }
            FileOp::Append => {
                let content = input.require_str("content")?;
                input.ensure_not_cancelled()?;
                let size = append_text(self.fs.as_ref(), path, content).await?;
                Ok(json!({ "path": path, "size": size }))
            }
        }
    }
}
