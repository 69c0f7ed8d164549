//! Integration tests for Switchyard
//!
//! These tests drive the assembled host end to end:
//! - switchyard-core: pipeline, router, agents, status and transport boundary
//! - switchyard-llm: cached mock provider
//! - switchyard-tools: file systems behind the file editor

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use switchyard_core::agents::{HandlerInput, TaskDefinition};
use switchyard_core::{
    Agent, AgentInfo, AgentRequest, AgentServices, AgentStatus, Error, ErrorKind,
    HandlerRegistry, StatusClass, Switchyard, SwitchyardBuilder, SwitchyardConfig, TaskHandler,
    TaskMessage, TransportRequest, TransportStatus, PIPELINE_NAME,
};
use switchyard_llm::{MockProvider, SharedProvider};
use switchyard_tools::{LocalFileSystem, MemoryFileSystem, SharedFileSystem};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helpers
// ============================================================================

fn fast_config() -> SwitchyardConfig {
    let mut config = SwitchyardConfig::default();
    config.router.retry.initial_delay = Duration::from_millis(1);
    config.router.retry.max_delay = Duration::from_millis(5);
    config
}

fn host_with(provider: Arc<MockProvider>, fs: SharedFileSystem) -> Switchyard {
    let provider: SharedProvider = provider;
    SwitchyardBuilder::from_config(fast_config(), provider, fs)
        .build()
        .unwrap()
}

fn default_host() -> Switchyard {
    host_with(
        Arc::new(MockProvider::with_default("1. sketch\n2. build")),
        Arc::new(MemoryFileSystem::new()),
    )
}

fn request(context_type: &str, task: &str, context: Value) -> AgentRequest {
    AgentRequest::new(context_type, task)
        .with_user("alice")
        .with_context(context)
}

struct AlwaysBusy {
    definition: TaskDefinition,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl TaskHandler for AlwaysBusy {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn handle(&self, _input: HandlerInput<'_>) -> switchyard_core::Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Transient("downstream busy".into()))
    }
}

struct BusyAgent {
    info: AgentInfo,
    handlers: HandlerRegistry,
    services: AgentServices,
}

impl Agent for BusyAgent {
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
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_invalid_request_never_reaches_an_agent() {
    let host = default_host();
    host.initialize_all().await.unwrap();

    let invalid = AgentRequest::new("code_analysis", "patternrecommendation");
    let response = host.process(&invalid, &CancellationToken::new()).await;

    assert!(!response.is_success);
    assert_eq!(response.agent_name, PIPELINE_NAME);
    assert_eq!(response.error_kind, Some(ErrorKind::Validation));
    assert!(response.error_message.unwrap().contains("user_id"));

    let design = host.router().agent("design").unwrap();
    assert_eq!(design.services().execution_count(), 0);
}

#[tokio::test]
async fn test_pipeline_language_flows_to_analyzer() {
    let host = default_host();
    let response = host
        .process(
            &request(
                "static_analysis",
                "analyze",
                json!({"code": "def todo():\n    pass\n", "file_path": "jobs.py"}),
            ),
            &CancellationToken::new(),
        )
        .await;

    assert!(response.is_success, "{:?}", response.error_message);
    assert_eq!(response.result["language"], "python");
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_pattern_recommendation_round_trip() {
    let host = default_host();
    host.initialize_all().await.unwrap();

    let response = host
        .process(
            &request(
                "code_analysis",
                "Pattern Recommendation",
                json!({"description": "notify listeners when state changes"}),
            ),
            &CancellationToken::new(),
        )
        .await;

    assert!(response.is_success, "{:?}", response.error_message);
    assert_eq!(response.agent_name, "design");
    let recommendations = response.result["recommendations"].as_array().unwrap();
    assert!(!recommendations.is_empty());
}

#[tokio::test]
async fn test_transient_failures_are_retried_then_reported() {
    let calls = Arc::new(AtomicUsize::new(0));
    let builder = SwitchyardBuilder::new(fast_config());
    let agent = BusyAgent {
        info: AgentInfo::new("busy", "test").with_context_type("busy"),
        handlers: HandlerRegistry::new().with(AlwaysBusy {
            definition: TaskDefinition::new("work", "always busy"),
            calls: calls.clone(),
        }),
        services: builder.services_for("busy"),
    };
    let host = builder.with_agent(Arc::new(agent)).build().unwrap();

    let response = host
        .process_with_retries(&request("busy", "work", json!({})), 2, &CancellationToken::new())
        .await;

    assert!(!response.is_success);
    assert_eq!(response.error_kind, Some(ErrorKind::Transient));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(host.get_agent_status("busy"), AgentStatus::Failed);
}

#[tokio::test]
async fn test_provider_answers_are_cached() {
    let provider = Arc::new(MockProvider::with_default("1. plan"));
    let host = host_with(provider.clone(), Arc::new(MemoryFileSystem::new()));
    let cancel = CancellationToken::new();

    for _ in 0..3 {
        let response = host
            .process(
                &request("design", "designplan", json!({"requirements": "a todo app"})),
                &cancel,
            )
            .await;
        assert!(response.is_success);
        assert_eq!(response.result["plan"], "1. plan");
    }
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_status_is_never_left_in_progress() {
    let host = default_host();
    host.initialize_all().await.unwrap();
    let cancel = CancellationToken::new();

    host.process(&request("code_analysis", "designplan", json!({"requirements": "x"})), &cancel)
        .await;
    host.process(&request("static_analysis", "unknown_task", json!({})), &cancel)
        .await;
    host.process(&request("file_edit", "readfile", json!({"path": "missing.txt"})), &cancel)
        .await;

    let snapshot = host.status_snapshot();
    assert!(!snapshot.is_empty());
    assert!(snapshot.values().all(|s| *s != AgentStatus::InProgress));
    assert_eq!(host.get_agent_status("file_editor"), AgentStatus::Failed);
    assert_eq!(host.get_agent_status("code_analyzer"), AgentStatus::Failed);
}

#[tokio::test]
async fn test_cancelled_before_dispatch() {
    let host = default_host();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let response = host
        .process(&request("design", "designplan", json!({"requirements": "x"})), &cancel)
        .await;

    assert!(!response.is_success);
    assert_eq!(response.error_kind, Some(ErrorKind::Cancelled));
}

// ============================================================================
// File editing
// ============================================================================

#[tokio::test]
async fn test_file_edit_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let host = host_with(
        Arc::new(MockProvider::with_default("ok")),
        Arc::new(LocalFileSystem::new(dir.path())),
    );
    let cancel = CancellationToken::new();

    let written = host
        .process(
            &request("file_edit", "writefile", json!({"path": "notes.txt", "content": "hello"})),
            &cancel,
        )
        .await;
    assert!(written.is_success, "{:?}", written.error_message);

    let appended = host
        .process(
            &request("file_edit", "appendtext", json!({"path": "notes.txt", "content": " world"})),
            &cancel,
        )
        .await;
    assert_eq!(appended.result["size"], 11);

    assert_eq!(
        std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
        "hello world"
    );
}

// ============================================================================
// Transport boundary
// ============================================================================

#[tokio::test]
async fn test_transport_success() {
    let host = default_host();
    let transport = TransportRequest::new(
        "design",
        json!({
            "taskName": "scaffoldgeneration",
            "userId": "alice",
            "context": {"project_name": "orders", "language": "python"}
        })
        .to_string(),
    );

    let response = host.handle_transport(&transport, &CancellationToken::new()).await;

    assert_eq!(response.status, TransportStatus::Success);
    assert_eq!(response.context_type, "design");
    assert_eq!(response.result["language"], "python");
    assert!(response.error_body().is_none());
}

#[tokio::test]
async fn test_transport_unknown_context_is_not_found() {
    let host = default_host();
    let transport = TransportRequest::new(
        "billing",
        json!({"taskName": "charge", "userId": "alice"}).to_string(),
    );

    let response = host.handle_transport(&transport, &CancellationToken::new()).await;

    assert_eq!(response.status, TransportStatus::Failure);
    assert_eq!(response.error_kind, Some(ErrorKind::NotFound));
    assert_eq!(response.status_class(), Some(StatusClass::NotFound));
    assert_eq!(response.status_class().unwrap().code(), 404);
}

#[tokio::test]
async fn test_transport_malformed_document_is_bad_request() {
    let host = default_host();
    let transport = TransportRequest::new("design", "{not json");

    let response = host.handle_transport(&transport, &CancellationToken::new()).await;

    assert_eq!(response.status_class(), Some(StatusClass::BadRequest));
    assert_eq!(response.error_body().unwrap().error, "Bad Request");
}

// ============================================================================
// Lifecycle and messaging
// ============================================================================

#[tokio::test]
async fn test_initialize_and_shutdown_all() {
    let host = default_host();

    host.initialize_all().await.unwrap();
    for name in ["design", "code_analyzer", "file_editor", "intent_router"] {
        assert_eq!(host.get_agent_status(name), AgentStatus::Completed, "{name}");
    }

    host.shutdown_all().await.unwrap();
    for name in ["design", "code_analyzer", "file_editor", "intent_router"] {
        assert_eq!(host.get_agent_status(name), AgentStatus::Pending, "{name}");
    }
}

#[tokio::test]
async fn test_registry_queries() {
    let host = default_host();

    let contexts = host.list_context_types();
    for expected in ["code_analysis", "design", "file_edit", "intent", "refactoring", "static_analysis"] {
        assert!(contexts.contains(&expected.to_string()), "{expected}");
    }
    assert_eq!(host.list_agents_for_context_type("file_edit"), vec!["file_editor"]);
    assert!(host.list_agents_for_context_type("billing").is_empty());
}

#[tokio::test]
async fn test_send_message() {
    let host = default_host();
    let message = TaskMessage::new("host", json!({"kind": "ping"}));

    let reply = host.send_message("design", &message).await.unwrap();
    assert!(reply.is_success);
    assert_eq!(reply.request_id, message.message_id.to_string());

    assert!(host.send_message("nobody", &message).await.is_none());
}
