//! Switchyard Tools - capabilities agents build on
//!
//! This crate provides the non-LLM work agents delegate to:
//! - File system: workspace-confined async file access
//! - Edit: whole-file text replacement and appends
//! - Analysis: language detection, line-rule static analysis and refactoring

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analysis;
pub mod edit;
pub mod error;
pub mod fs;

pub use analysis::{
    analyze, detect_language, refactor_prints_to_logging, AnalysisReport, Issue, Language,
    Refactoring,
};
pub use edit::{append_text, replace_text};
pub use error::{Error, Result};
pub use fs::{FileSystem, LocalFileSystem, MemoryFileSystem, SharedFileSystem};
