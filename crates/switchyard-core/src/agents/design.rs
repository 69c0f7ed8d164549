//! Design agent - architecture analysis, design plans, scaffolds and patterns
//!
//! Analysis and planning are delegated to the LLM provider (through the
//! response cache). Scaffolds and pattern recommendations are deterministic.

use super::agent::Agent;
use super::handlers::{HandlerInput, HandlerRegistry, TaskDefinition, TaskHandler};
use super::keywords::keyword_matcher;
use super::types::{AgentInfo, AgentServices};
use crate::error::Result;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock};
use switchyard_llm::CachedProvider;
use switchyard_tools::Language;
use tracing::debug;

/// Agent name
pub const DESIGN_AGENT: &str = "design";

/// Handles design-level tasks for the `code_analysis` and `design` context types
pub struct DesignAgent {
    info: AgentInfo,
    handlers: HandlerRegistry,
    services: AgentServices,
}

impl DesignAgent {
    /// Create the agent; LLM-backed tasks go through `provider`
    #[must_use]
    pub fn new(provider: Arc<CachedProvider>, services: AgentServices) -> Self {
        let handlers = HandlerRegistry::new()
            .with(ArchitectureAnalysis {
                definition: TaskDefinition::new(
                    "architectureanalysis",
                    "Analyze the architecture of a code base or description",
                ),
                provider: provider.clone(),
            })
            .with(DesignPlan {
                definition: TaskDefinition::new(
                    "designplan",
                    "Produce a step-by-step design plan for requirements",
                ),
                provider,
            })
            .with(ScaffoldGeneration {
                definition: TaskDefinition::new(
                    "scaffoldgeneration",
                    "Generate a project skeleton",
                ),
            })
            .with(PatternRecommendation {
                definition: TaskDefinition::new(
                    "patternrecommendation",
                    "Recommend design patterns for a problem",
                ),
            });

        let mut info = AgentInfo::new(DESIGN_AGENT, "design")
            .with_context_type("code_analysis")
            .with_context_type("design");
        for language in SCAFFOLD_LANGUAGES {
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

impl Agent for DesignAgent {
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

// ============================================================================
// LLM-backed tasks
// ============================================================================

struct ArchitectureAnalysis {
    definition: TaskDefinition,
    provider: Arc<CachedProvider>,
}

#[async_trait::async_trait]
impl TaskHandler for ArchitectureAnalysis {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value> {
        let subject = match input.optional_str("code") {
            Some(code) => {
                let language = input.context.get_str("language").unwrap_or("source");
                format!("the following {language} code:\n\n{code}")
            }
            None => format!("this system:\n\n{}", input.require_str("description")?),
        };
        let prompt = format!(
            "You are a software architect. Analyze the architecture of {subject}\n\n\
             Identify the main components, their responsibilities and coupling, \
             and list concrete improvements."
        );

        let analysis = self
            .provider
            .get_response_cancellable(&prompt, input.cancel)
            .await?;
        Ok(json!({ "analysis": analysis }))
    }
}

struct DesignPlan {
    definition: TaskDefinition,
    provider: Arc<CachedProvider>,
}

#[async_trait::async_trait]
impl TaskHandler for DesignPlan {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value> {
        let requirements = match input.optional_str("requirements") {
            Some(r) => r,
            None => input.require_str("description")?,
        };
        let prompt = format!(
            "You are a software architect. Write a numbered, step-by-step design plan \
             for the following requirements:\n\n{requirements}"
        );

        let plan = self
            .provider
            .get_response_cancellable(&prompt, input.cancel)
            .await?;
        Ok(json!({ "plan": plan }))
    }
}

// ============================================================================
// Scaffolds
// ============================================================================

const SCAFFOLD_LANGUAGES: [Language; 4] = [
    Language::Rust,
    Language::Python,
    Language::TypeScript,
    Language::CSharp,
];

#[derive(Debug, Serialize)]
struct ScaffoldFile {
    path: String,
    content: String,
}

impl ScaffoldFile {
    fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// `my-app` -> `my_app`
fn snake_case(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// `my-app` -> `MyApp`
fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn scaffold(project: &str, language: Language) -> Result<Vec<ScaffoldFile>> {
    let readme = ScaffoldFile::new("README.md", format!("# {project}\n"));
    let files = match language {
        Language::Rust => vec![
            ScaffoldFile::new(
                "Cargo.toml",
                format!(
                    "[package]\nname = \"{project}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n"
                ),
            ),
            ScaffoldFile::new(
                "src/main.rs",
                "fn main() {\n    println!(\"Hello, world!\");\n}\n",
            ),
            ScaffoldFile::new(".gitignore", "/target\n"),
            readme,
        ],
        Language::Python => {
            let package = snake_case(project);
            vec![
                ScaffoldFile::new(
                    "pyproject.toml",
                    format!(
                        "[project]\nname = \"{project}\"\nversion = \"0.1.0\"\nrequires-python = \">=3.10\"\n"
                    ),
                ),
                ScaffoldFile::new(format!("{package}/__init__.py"), ""),
                ScaffoldFile::new(
                    format!("{package}/main.py"),
                    "import logging\n\n\ndef main() -> None:\n    logging.info(\"Hello, world!\")\n\n\nif __name__ == \"__main__\":\n    main()\n",
                ),
                ScaffoldFile::new(
                    "tests/test_main.py",
                    format!("from {package}.main import main\n\n\ndef test_main():\n    main()\n"),
                ),
                readme,
            ]
        }
        Language::TypeScript => vec![
            ScaffoldFile::new(
                "package.json",
                format!(
                    "{{\n  \"name\": \"{project}\",\n  \"version\": \"0.1.0\",\n  \"scripts\": {{\n    \"build\": \"tsc\"\n  }}\n}}\n"
                ),
            ),
            ScaffoldFile::new(
                "tsconfig.json",
                "{\n  \"compilerOptions\": {\n    \"strict\": true,\n    \"outDir\": \"dist\"\n  }\n}\n",
            ),
            ScaffoldFile::new("src/index.ts", "console.log(\"Hello, world!\");\n"),
            readme,
        ],
        Language::CSharp => {
            let name = pascal_case(project);
            vec![
                ScaffoldFile::new(
                    format!("{name}.csproj"),
                    "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <OutputType>Exe</OutputType>\n    <TargetFramework>net8.0</TargetFramework>\n  </PropertyGroup>\n</Project>\n",
                ),
                ScaffoldFile::new(
                    "Program.cs",
                    format!(
                        "namespace {name};\n\ninternal static class Program\n{{\n    private static void Main() => System.Console.WriteLine(\"Hello, world!\");\n}}\n"
                    ),
                ),
                readme,
            ]
        }
        other => return Err(switchyard_tools::Error::UnsupportedLanguage(other.to_string()).into()),
    };
    Ok(files)
}

struct ScaffoldGeneration {
    definition: TaskDefinition,
}

#[async_trait::async_trait]
impl TaskHandler for ScaffoldGeneration {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value> {
        let project = input.require_str("project_name")?.trim();
        let language = Language::from_name(input.optional_str("language").unwrap_or("rust"));

        let files = scaffold(project, language)?;
        debug!(project = %project, language = %language, files = files.len(), "Scaffold generated");
        Ok(json!({
            "project_name": project,
            "language": language,
            "files": files,
        }))
    }
}

// ============================================================================
// Patterns
// ============================================================================

struct PatternRule {
    keywords: &'static [&'static str],
    pattern: &'static str,
    rationale: &'static str,
}

const PATTERN_CATALOG: &[PatternRule] = &[
    PatternRule {
        keywords: &["notify", "event", "subscribe", "listener", "observer"],
        pattern: "Observer",
        rationale: "Decouples producers of events from the components reacting to them.",
    },
    PatternRule {
        keywords: &["factory", "create", "instantiate", "construct"],
        pattern: "Factory Method",
        rationale: "Centralizes object creation so callers depend on an interface.",
    },
    PatternRule {
        keywords: &["algorithm", "strategy", "interchangeable", "policy", "sort"],
        pattern: "Strategy",
        rationale: "Lets interchangeable algorithms vary independently of their callers.",
    },
    PatternRule {
        keywords: &["database", "persist", "storage", "repository", "crud"],
        pattern: "Repository",
        rationale: "Hides persistence details behind a collection-like interface.",
    },
    PatternRule {
        keywords: &["retry", "transient", "flaky", "timeout"],
        pattern: "Retry with Exponential Backoff",
        rationale: "Absorbs transient downstream failures without hammering the dependency.",
    },
    PatternRule {
        keywords: &["circuit", "outage", "cascade", "downstream"],
        pattern: "Circuit Breaker",
        rationale: "Stops calling a failing dependency until it recovers.",
    },
    PatternRule {
        keywords: &["cache", "memoize", "expensive"],
        pattern: "Decorator (Cache-Aside)",
        rationale: "Adds caching around an existing interface without changing callers.",
    },
    PatternRule {
        keywords: &["pipeline", "stage", "step", "workflow", "middleware"],
        pattern: "Chain of Responsibility",
        rationale: "Processes a request through an ordered chain of independent handlers.",
    },
    PatternRule {
        keywords: &["adapter", "legacy", "third-party", "integrate", "wrapper"],
        pattern: "Adapter",
        rationale: "Translates a foreign interface into the one your code expects.",
    },
    PatternRule {
        keywords: &["builder", "configuration", "options", "optional parameters"],
        pattern: "Builder",
        rationale: "Constructs complex objects step by step with readable defaults.",
    },
    PatternRule {
        keywords: &["undo", "command", "queue", "history"],
        pattern: "Command",
        rationale: "Represents operations as values that can be queued, logged or undone.",
    },
    PatternRule {
        keywords: &["state", "transition", "lifecycle", "status"],
        pattern: "State Machine",
        rationale: "Makes legal transitions explicit and rejects the rest.",
    },
];

const GENERAL_RECOMMENDATIONS: &[(&str, &str)] = &[
    (
        "Separation of Concerns",
        "Keep domain logic, I/O and presentation in separate modules.",
    ),
    (
        "Dependency Injection",
        "Pass collaborators in explicitly so components stay testable.",
    ),
];

#[derive(Debug, Serialize)]
struct Recommendation {
    pattern: &'static str,
    rationale: &'static str,
}

static PATTERN_MATCHERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PATTERN_CATALOG
        .iter()
        .map(|rule| keyword_matcher(rule.keywords))
        .collect()
});

fn recommend_patterns(text: &str) -> Vec<Recommendation> {
    let matched: Vec<Recommendation> = PATTERN_CATALOG
        .iter()
        .zip(PATTERN_MATCHERS.iter())
        .filter(|(_, matcher)| matcher.is_match(text))
        .map(|(rule, _)| Recommendation {
            pattern: rule.pattern,
            rationale: rule.rationale,
        })
        .collect();

    if !matched.is_empty() {
        return matched;
    }
    GENERAL_RECOMMENDATIONS
        .iter()
        .map(|&(pattern, rationale)| Recommendation { pattern, rationale })
        .collect()
}

struct PatternRecommendation {
    definition: TaskDefinition,
}

#[async_trait::async_trait]
impl TaskHandler for PatternRecommendation {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value> {
        let text = ["description", "code", "prompt", "requirements"]
            .iter()
            .filter_map(|key| input.optional_str(key))
            .collect::<Vec<_>>()
            .join("\n");

        let recommendations = recommend_patterns(&text);
        Ok(json!({ "recommendations": recommendations }))
    }
}
