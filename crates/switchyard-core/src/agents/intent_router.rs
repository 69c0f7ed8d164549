//! Intent router agent - maps free-form prompts to a context type and task
//!
//! Keyword rules are tried first. When none matches and a provider is
//! configured, the provider is asked to choose; otherwise a low-confidence
//! default is returned.

use super::agent::Agent;
use super::handlers::{HandlerInput, HandlerRegistry, TaskDefinition, TaskHandler};
use super::keywords::keyword_matcher;
use super::types::{AgentInfo, AgentServices};
use crate::error::Result;
use crate::message::{AgentResponse, TaskMessage};
use serde::{Deserialize, Serialize};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock};
use switchyard_llm::CachedProvider;
use tracing::{debug, warn};

/// Agent name
pub const INTENT_ROUTER_AGENT: &str = "intent_router";

/// Confidence reported when nothing better is known
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

const PROVIDER_CONFIDENCE: f64 = 0.6;

/// One keyword rule
#[derive(Debug, Clone, Serialize)]
pub struct IntentRule {
    /// Any of these words or phrases selects the rule
    pub keywords: &'static [&'static str],
    /// Target context type
    pub context_type: &'static str,
    /// Target task
    pub task_name: &'static str,
    /// Reported confidence
    pub confidence: f64,
}

/// Rules in priority order
pub const INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        keywords: &["read file", "open file", "show file", "show me the file"],
        context_type: "file_edit",
        task_name: "readfile",
        confidence: 0.9,
    },
    IntentRule {
        keywords: &["write file", "create file", "save file", "overwrite"],
        context_type: "file_edit",
        task_name: "writefile",
        confidence: 0.85,
    },
    IntentRule {
        keywords: &["replace", "substitute"],
        context_type: "file_edit",
        task_name: "replacetext",
        confidence: 0.8,
    },
    IntentRule {
        keywords: &["append"],
        context_type: "file_edit",
        task_name: "appendtext",
        confidence: 0.8,
    },
    IntentRule {
        keywords: &["refactor", "clean up", "use logging"],
        context_type: "refactoring",
        task_name: "refactor",
        confidence: 0.8,
    },
    IntentRule {
        keywords: &["lint", "static analysis", "code smell", "find issues", "analyze code"],
        context_type: "static_analysis",
        task_name: "analyze",
        confidence: 0.8,
    },
    IntentRule {
        keywords: &["pattern"],
        context_type: "code_analysis",
        task_name: "patternrecommendation",
        confidence: 0.85,
    },
    IntentRule {
        keywords: &["architecture"],
        context_type: "code_analysis",
        task_name: "architectureanalysis",
        confidence: 0.8,
    },
    IntentRule {
        keywords: &["scaffold", "new project", "boilerplate", "skeleton"],
        context_type: "design",
        task_name: "scaffoldgeneration",
        confidence: 0.85,
    },
    IntentRule {
        keywords: &["plan", "design"],
        context_type: "design",
        task_name: "designplan",
        confidence: 0.7,
    },
];

/// Classification result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Context type to route to
    pub context_type: String,
    /// Task to run
    pub task_name: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    /// "rules", "provider" or "default"
    pub source: String,
}

impl Intent {
    fn fallback() -> Self {
        Self {
            context_type: "design".to_string(),
            task_name: "designplan".to_string(),
            confidence: FALLBACK_CONFIDENCE,
            source: "default".to_string(),
        }
    }
}

static RULE_MATCHERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    INTENT_RULES
        .iter()
        .map(|rule| keyword_matcher(rule.keywords))
        .collect()
});

/// Match `prompt` against [`INTENT_RULES`]
#[must_use]
pub fn classify_by_rules(prompt: &str) -> Option<Intent> {
    INTENT_RULES
        .iter()
        .zip(RULE_MATCHERS.iter())
        .find(|(_, matcher)| matcher.is_match(prompt))
        .map(|(rule, _)| Intent {
            context_type: rule.context_type.to_string(),
            task_name: rule.task_name.to_string(),
            confidence: rule.confidence,
            source: "rules".to_string(),
        })
}

#[derive(Debug, Deserialize)]
struct ProviderChoice {
    context_type: String,
    task_name: String,
}

/// Pull the first JSON object out of a provider answer
fn parse_choice(answer: &str) -> Option<ProviderChoice> {
    let start = answer.find('{')?;
    let end = answer.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&answer[start..=end]).ok()
}

/// Handles the `intent` context type
pub struct IntentRouterAgent {
    info: AgentInfo,
    handlers: HandlerRegistry,
    services: AgentServices,
}

impl IntentRouterAgent {
    /// Create the agent; `provider` is consulted when no rule matches
    #[must_use]
    pub fn new(provider: Option<Arc<CachedProvider>>, services: AgentServices) -> Self {
        let handlers = HandlerRegistry::new().with(Classify {
            definition: TaskDefinition::new("classify", "Map a prompt to a context type and task"),
            provider,
        });

        let info = AgentInfo::new(INTENT_ROUTER_AGENT, "router")
            .with_context_type("intent")
            .with_capability("classify");

        Self {
            info,
            handlers,
            services,
        }
    }
}

#[async_trait::async_trait]
impl Agent for IntentRouterAgent {
    fn info(&self) -> &AgentInfo {
        &self.info
    }

    fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    fn services(&self) -> &AgentServices {
        &self.services
    }

    async fn handle_message(&self, message: &TaskMessage) -> AgentResponse {
        if message.payload.get("kind").and_then(Value::as_str) == Some("rules") {
            return AgentResponse::reply(message, self.name(), json!({ "rules": INTENT_RULES }));
        }
        AgentResponse::reply(
            message,
            self.name(),
            json!({"acknowledged": message.message_id}),
        )
    }
}

struct Classify {
    definition: TaskDefinition,
    provider: Option<Arc<CachedProvider>>,
}

impl Classify {
    fn provider_prompt(prompt: &str) -> String {
        let options = INTENT_RULES
            .iter()
            .map(|r| format!("- {} / {}", r.context_type, r.task_name))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Choose the best context type and task for the request below.\n\
             Options:\n{options}\n\n\
             Answer with JSON only: {{\"context_type\": \"...\", \"task_name\": \"...\"}}\n\n\
             Request: {prompt}"
        )
    }
}

#[async_trait::async_trait]
impl TaskHandler for Classify {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, input: HandlerInput<'_>) -> Result<Value> {
        let prompt = input.require_str("prompt")?;

        if let Some(intent) = classify_by_rules(prompt) {
            debug!(context_type = %intent.context_type, task = %intent.task_name, "Intent matched by rule");
            return Ok(serde_json::to_value(intent)?);
        }

        let Some(provider) = &self.provider else {
            return Ok(serde_json::to_value(Intent::fallback())?);
        };

        let answer = provider
            .get_response_cancellable(&Self::provider_prompt(prompt), input.cancel)
            .await?;
        let intent = match parse_choice(&answer) {
            Some(choice) => Intent {
                context_type: choice.context_type,
                task_name: choice.task_name,
                confidence: PROVIDER_CONFIDENCE,
                source: "provider".to_string(),
            },
            None => {
                warn!("Provider answer was not a valid intent, using default");
                Intent::fallback()
            }
        };
        Ok(serde_json::to_value(intent)?)
    }
}
