use crate::error::ErrorKind;
use crate::message::{AgentRequest, AgentResponse};
use serde_json::{json, Value};

/// Fold several agent responses into one.
///
/// A single response is returned unchanged. Otherwise `result` is an array
/// of per-agent entries in dispatch order, and the merged response succeeds
/// only if every agent succeeded. A failed merge is `Transient` only when
/// every failure was transient, so a retry never re-runs a permanent failure.
#[must_use]
pub fn merge_responses(request: &AgentRequest, mut responses: Vec<AgentResponse>) -> AgentResponse {
    if responses.len() == 1 {
        if let Some(only) = responses.pop() {
            return only;
        }
    }

    let agent_name = responses
        .iter()
        .map(|r| r.agent_name.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let entries: Vec<Value> = responses
        .iter()
        .map(|r| {
            let mut entry = json!({
                "agent_name": r.agent_name,
                "is_success": r.is_success,
                "result": r.result,
            });
            if let (Some(message), Some(kind)) = (&r.error_message, r.error_kind) {
                entry["error_message"] = json!(message);
                entry["error_kind"] = json!(kind);
            }
            entry
        })
        .collect();

    let failures: Vec<&AgentResponse> = responses.iter().filter(|r| !r.is_success).collect();
    if failures.is_empty() {
        return AgentResponse::success(request, agent_name, Value::Array(entries));
    }

    let kind = if failures.iter().all(|r| r.is_transient()) {
        ErrorKind::Transient
    } else {
        failures
            .iter()
            .filter_map(|r| r.error_kind)
            .find(|k| !k.is_retryable())
            .unwrap_or(ErrorKind::Fatal)
    };
    let message = failures
        .iter()
        .map(|r| {
            format!(
                "{}: {}",
                r.agent_name,
                r.error_message.as_deref().unwrap_or("failed")
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    let mut merged = AgentResponse::failure(request, agent_name, kind, message);
    merged.result = Value::Array(entries);
    merged
}
