use super::*;
use crate::error::{Error, ErrorKind, Result};
use crate::message::{AgentRequest, TaskMessage};
use crate::pipeline::WorkflowContext;
use crate::status::{AgentStatus, StatusTracker};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
    Hang,
}

struct ScriptedHandler {
    definition: TaskDefinition,
    behavior: Behavior,
    init_fails: bool,
    shutdown_fails: bool,
    calls: Arc<AtomicUsize>,
}

impl ScriptedHandler {
    fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            definition: TaskDefinition::new(name, "scripted"),
            behavior,
            init_fails: false,
            shutdown_fails: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait::async_trait]
impl TaskHandler for ScriptedHandler {
    fn definition(&self) -> &TaskDefinition {
        &self.definition
    }

    async fn initialize(&self) -> Result<()> {
        if self.init_fails {
            return Err(Error::Fatal(format!("{} cannot start", self.definition.name)));
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        if self.shutdown_fails {
            return Err(Error::Fatal("stuck".into()));
        }
        Ok(())
    }

    async fn handle(&self, _input: HandlerInput<'_>) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(json!({"ok": true})),
            Behavior::Fail => Err(Error::Transient("downstream busy".into())),
            Behavior::Panic => panic!("handler exploded"),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Value::Null)
            }
        }
    }
}

struct TestAgent {
    info: AgentInfo,
    handlers: HandlerRegistry,
    services: AgentServices,
}

impl TestAgent {
    fn new(handlers: HandlerRegistry, services: AgentServices) -> Self {
        Self {
            info: AgentInfo::new("test", "test").with_context_type("test"),
            handlers,
            services,
        }
    }
}

impl Agent for TestAgent {
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

fn request(task: &str) -> AgentRequest {
    AgentRequest::new("test", task).with_user("alice")
}

async fn execute(agent: &TestAgent, task: &str) -> crate::message::AgentResponse {
    agent
        .execute(&request(task), &WorkflowContext::new(), &CancellationToken::new())
        .await
}

#[tokio::test]
async fn test_initialize_success() {
    let status = StatusTracker::new();
    let agent = TestAgent::new(
        HandlerRegistry::new()
            .with(ScriptedHandler::new("a", Behavior::Succeed))
            .with(ScriptedHandler::new("b", Behavior::Succeed)),
        AgentServices::new(status.clone()),
    );

    assert_eq!(agent.status(), AgentStatus::Pending);
    agent.initialize().await.unwrap();
    assert_eq!(agent.status(), AgentStatus::Completed);
}

#[tokio::test]
async fn test_initialize_aggregates_every_failure() {
    let mut a = ScriptedHandler::new("a", Behavior::Succeed);
    a.init_fails = true;
    let mut c = ScriptedHandler::new("c", Behavior::Succeed);
    c.init_fails = true;

    let agent = TestAgent::new(
        HandlerRegistry::new()
            .with(a)
            .with(ScriptedHandler::new("b", Behavior::Succeed))
            .with(c),
        AgentServices::new(StatusTracker::new()),
    );

    let err = agent.initialize().await.unwrap_err();
    match err {
        Error::Aggregate(agg) => {
            let sources: Vec<&str> = agg.failures().iter().map(|(s, _)| s.as_str()).collect();
            assert_eq!(sources, vec!["a", "c"]);
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
    assert_eq!(agent.status(), AgentStatus::Failed);
}

#[tokio::test]
async fn test_execute_dispatches_by_task_key() {
    let handler = ScriptedHandler::new("do_work", Behavior::Succeed);
    let calls = handler.calls.clone();
    let agent = TestAgent::new(
        HandlerRegistry::new().with(handler),
        AgentServices::new(StatusTracker::new()),
    );

    let response = execute(&agent, "Do Work").await;
    assert!(response.is_success);
    assert_eq!(response.agent_name, "test");
    assert_eq!(response.task_name, "Do Work");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.status(), AgentStatus::Completed);
    assert_eq!(agent.services().execution_count(), 1);
}

#[tokio::test]
async fn test_unknown_task_is_unsupported() {
    let agent = TestAgent::new(HandlerRegistry::new(), AgentServices::new(StatusTracker::new()));

    let response = execute(&agent, "fly").await;
    assert!(!response.is_success);
    assert_eq!(response.error_kind, Some(ErrorKind::UnsupportedTask));
    assert_eq!(agent.status(), AgentStatus::Failed);
}

#[tokio::test]
async fn test_handler_error_becomes_failed_response() {
    let agent = TestAgent::new(
        HandlerRegistry::new().with(ScriptedHandler::new("work", Behavior::Fail)),
        AgentServices::new(StatusTracker::new()),
    );

    let response = execute(&agent, "work").await;
    assert_eq!(response.error_kind, Some(ErrorKind::Transient));
    assert!(response.error_message.unwrap().contains("downstream busy"));
    assert_eq!(agent.status(), AgentStatus::Failed);
}

#[tokio::test]
async fn test_panic_is_contained() {
    let agent = TestAgent::new(
        HandlerRegistry::new().with(ScriptedHandler::new("work", Behavior::Panic)),
        AgentServices::new(StatusTracker::new()),
    );

    let response = execute(&agent, "work").await;
    assert!(!response.is_success);
    assert_eq!(response.error_kind, Some(ErrorKind::Fatal));
    assert!(response.error_message.unwrap().contains("handler exploded"));
    assert_eq!(agent.status(), AgentStatus::Failed);
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let agent = TestAgent::new(
        HandlerRegistry::new().with(ScriptedHandler::new("work", Behavior::Hang)),
        AgentServices::new(StatusTracker::new()).with_execute_timeout(Duration::from_millis(20)),
    );

    let response = execute(&agent, "work").await;
    assert_eq!(response.error_kind, Some(ErrorKind::Transient));
    assert_eq!(agent.status(), AgentStatus::Failed);
}

#[tokio::test]
async fn test_cancellation_settles_status() {
    let agent = TestAgent::new(
        HandlerRegistry::new().with(ScriptedHandler::new("work", Behavior::Hang)),
        AgentServices::new(StatusTracker::new()),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let response = agent
        .execute(&request("work"), &WorkflowContext::new(), &cancel)
        .await;
    assert_eq!(response.error_kind, Some(ErrorKind::Cancelled));
    assert_eq!(agent.status(), AgentStatus::Failed);
}

#[tokio::test]
async fn test_dropped_execute_never_stays_in_progress() {
    let agent = TestAgent::new(
        HandlerRegistry::new().with(ScriptedHandler::new("work", Behavior::Hang)),
        AgentServices::new(StatusTracker::new()),
    );

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        agent.execute(&request("work"), &WorkflowContext::new(), &CancellationToken::new()),
    )
    .await;
    assert!(outcome.is_err());
    assert_eq!(agent.status(), AgentStatus::Failed);
}

#[tokio::test]
async fn test_shutdown_resets_to_pending() {
    let agent = TestAgent::new(
        HandlerRegistry::new().with(ScriptedHandler::new("work", Behavior::Succeed)),
        AgentServices::new(StatusTracker::new()),
    );
    agent.initialize().await.unwrap();

    agent.shutdown().await.unwrap();
    assert_eq!(agent.status(), AgentStatus::Pending);
}

#[tokio::test]
async fn test_shutdown_failure_is_reported() {
    let mut handler = ScriptedHandler::new("work", Behavior::Succeed);
    handler.shutdown_fails = true;
    let agent = TestAgent::new(
        HandlerRegistry::new().with(handler),
        AgentServices::new(StatusTracker::new()),
    );
    agent.initialize().await.unwrap();

    let err = agent.shutdown().await.unwrap_err();
    assert!(matches!(err, Error::Aggregate(_)));
    assert_eq!(agent.status(), AgentStatus::Failed);
}

#[tokio::test]
async fn test_default_handle_message_acknowledges() {
    let agent = TestAgent::new(HandlerRegistry::new(), AgentServices::new(StatusTracker::new()));
    let message = TaskMessage::new("router", json!({"hello": "world"}));

    let response = agent.handle_message(&message).await;
    assert!(response.is_success);
    assert_eq!(response.request_id, message.message_id.to_string());
    assert_eq!(response.result["acknowledged"], message.message_id.to_string());
}
