use chrono::{DateTime, Utc};
use quiver_core::types::AnyValue;
use uuid::Uuid;

use crate::executor::http::HttpResponseParts;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HttpOutcome {
    pub status: u16,
    pub duration_ms: u64,

    /// Response body parsed as JSON when possible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<AnyValue>,

    /// Raw response text, kept even when `body` parsed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl HttpOutcome {
    pub fn from_parts(parts: &HttpResponseParts, duration_ms: u64) -> Self {
        let text = String::from_utf8_lossy(&parts.body).to_string();
        let body = serde_json::from_str::<AnyValue>(&text).ok();
        Self {
            status: parts.status,
            duration_ms,
            body,
            text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// A response was received. Any status counts, 4xx/5xx included: those
    /// are response data, not execution failures.
    Http(HttpOutcome),
    /// The call never completed (connect/dns/tls/timeout). Not retried.
    TransportFailed { error: String },
    /// A template referenced an unbound variable; no call was attempted.
    ResolutionFailed { variable: String, path: String },
}

impl Outcome {
    pub fn http(&self) -> Option<&HttpOutcome> {
        match self {
            Outcome::Http(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// One executed request and what came of it. Immutable once constructed; the
/// unit appended to the record sink.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionRecord {
    pub session_id: Uuid,
    pub desc: String,
    pub method: String,
    pub url: String,
    pub outcome: Outcome,
    pub timestamp: DateTime<Utc>,
}
