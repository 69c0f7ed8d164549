//! Transport boundary - wire shapes exchanged with plugin hosts and servers
//!
//! Field names are camelCase on the wire.

use crate::error::{Error, ErrorKind, Result};
use crate::message::{AgentRequest, AgentResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Inbound request as sent by a transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportRequest {
    /// Context type used for routing
    pub context_type: String,
    /// JSON document: `{requestId?, taskName, userId, context?}`
    pub serialized_context: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerializedContext {
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    task_name: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    context: Value,
}

impl TransportRequest {
    /// Create a transport request
    #[must_use]
    pub fn new(context_type: impl Into<String>, serialized_context: impl Into<String>) -> Self {
        Self {
            context_type: context_type.into(),
            serialized_context: serialized_context.into(),
        }
    }

    /// Decode into an [`AgentRequest`].
    ///
    /// A missing `requestId` gets a fresh UUID. Blank fields are left for the
    /// pipeline's validation step to report.
    pub fn to_agent_request(&self) -> Result<AgentRequest> {
        let decoded: SerializedContext = serde_json::from_str(&self.serialized_context)
            .map_err(|e| Error::Validation(format!("serializedContext is not valid JSON: {e}")))?;

        let context = match decoded.context {
            Value::Null => Value::Object(serde_json::Map::new()),
            Value::Object(map) => Value::Object(map),
            _ => {
                return Err(Error::Validation(
                    "serializedContext.context must be an object".to_string(),
                ))
            }
        };

        let request_id = decoded
            .request_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(AgentRequest::new(self.context_type.clone(), decoded.task_name)
            .with_request_id(request_id)
            .with_user(decoded.user_id)
            .with_context(context))
    }
}

/// Outcome flag on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportStatus {
    /// The request succeeded
    Success,
    /// The request failed
    Failure,
}

/// Outbound response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportResponse {
    /// Success or failure
    pub status: TransportStatus,
    /// Context type of the request
    pub context_type: String,
    /// Wall time spent, in milliseconds
    pub processing_time: u64,
    /// Agent result
    pub result: Value,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
    /// Failure classification
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<ErrorKind>,
}

impl TransportResponse {
    /// Wrap an agent response
    #[must_use]
    pub fn from_response(context_type: &str, response: AgentResponse, elapsed: Duration) -> Self {
        Self {
            status: if response.is_success {
                TransportStatus::Success
            } else {
                TransportStatus::Failure
            },
            context_type: context_type.to_string(),
            processing_time: elapsed.as_millis() as u64,
            result: response.result,
            error_message: response.error_message,
            error_kind: response.error_kind,
        }
    }

    /// Failure built straight from an error
    #[must_use]
    pub fn from_error(context_type: &str, error: &Error, elapsed: Duration) -> Self {
        Self {
            status: TransportStatus::Failure,
            context_type: context_type.to_string(),
            processing_time: elapsed.as_millis() as u64,
            result: Value::Null,
            error_message: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    /// Whether the request succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == TransportStatus::Success
    }

    /// HTTP-style class for a failure; `None` on success
    #[must_use]
    pub fn status_class(&self) -> Option<StatusClass> {
        if self.is_success() {
            return None;
        }
        Some(self.error_kind.map_or(StatusClass::Internal, StatusClass::from_kind))
    }

    /// Error body for a failure; `None` on success
    #[must_use]
    pub fn error_body(&self) -> Option<ErrorBody> {
        let class = self.status_class()?;
        Some(ErrorBody {
            error: class.title().to_string(),
            details: self
                .error_message
                .clone()
                .unwrap_or_else(|| "request failed".to_string()),
        })
    }
}

/// Coarse failure class for HTTP-like transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusClass {
    /// 400
    BadRequest,
    /// 404
    NotFound,
    /// 500
    Internal,
}

impl StatusClass {
    /// Map a failure kind to its class
    #[must_use]
    pub fn from_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation | ErrorKind::UnsupportedTask => Self::BadRequest,
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::Transient | ErrorKind::Fatal | ErrorKind::Provider | ErrorKind::Cancelled => {
                Self::Internal
            }
        }
    }

    /// Numeric status code
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    /// Short title used as `ErrorBody::error`
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::Internal => "Internal Server Error",
        }
    }
}

/// Error payload for HTTP-like transports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short error title
    pub error: String,
    /// Detailed message
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_request() {
        let id = Uuid::new_v4().to_string();
        let transport = TransportRequest::new(
            "design",
            json!({
                "requestId": id,
                "taskName": "designplan",
                "userId": "alice",
                "context": {"requirements": "a todo app"}
            })
            .to_string(),
        );

        let request = transport.to_agent_request().unwrap();
        assert_eq!(request.request_id(), id);
        assert_eq!(request.context_type(), "design");
        assert_eq!(request.user_id(), "alice");
        assert_eq!(request.context_str("requirements"), Some("a todo app"));
    }

    #[test]
    fn test_missing_request_id_is_generated() {
        let transport = TransportRequest::new("design", r#"{"taskName": "designplan", "userId": "a"}"#);
        let request = transport.to_agent_request().unwrap();
        assert!(Uuid::parse_str(request.request_id()).is_ok());
        assert!(request.context().as_object().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_context_is_validation_error() {
        let err = TransportRequest::new("design", "{not json")
            .to_agent_request()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = TransportRequest::new("design", r#"{"taskName": "x", "context": [1]}"#)
            .to_agent_request()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_wire_names() {
        let request = AgentRequest::new("design", "designplan");
        let response = TransportResponse::from_response(
            "design",
            AgentResponse::success(&request, "design", json!({"plan": "x"})),
            Duration::from_millis(12),
        );
        let wire = serde_json::to_value(&response).unwrap();

        assert_eq!(wire["status"], "Success");
        assert_eq!(wire["contextType"], "design");
        assert_eq!(wire["processingTime"], 12);
        assert!(wire.get("errorMessage").is_none());
        assert!(response.error_body().is_none());

        let parsed: TransportRequest =
            serde_json::from_value(json!({"contextType": "x", "serializedContext": "{}"})).unwrap();
        assert_eq!(parsed.context_type, "x");
    }

    #[test]
    fn test_status_classes() {
        assert_eq!(StatusClass::from_kind(ErrorKind::Validation).code(), 400);
        assert_eq!(StatusClass::from_kind(ErrorKind::UnsupportedTask).code(), 400);
        assert_eq!(StatusClass::from_kind(ErrorKind::NotFound).code(), 404);
        assert_eq!(StatusClass::from_kind(ErrorKind::Transient).code(), 500);

        let response = TransportResponse::from_error(
            "billing",
            &Error::NotFound("billing".into()),
            Duration::ZERO,
        );
        let body = response.error_body().unwrap();
        assert_eq!(body.error, "Not Found");
        assert!(body.details.contains("billing"));
    }
}
