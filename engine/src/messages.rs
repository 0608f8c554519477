//! Message envelope between rewrite triggers and the service.
//!
//! Requests are externally tagged by a `type` field; responses carry either
//! a result or a human-readable error string, never both. Unknown request
//! types fail at deserialization, before they reach the dispatcher.

use crate::service::RewriteService;
use serde::{Deserialize, Serialize};
use tonedown_types::RewriteResult;

/// Incoming rewrite request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "REWRITE_SELECTION")]
    RewriteSelection { text: String },
    #[serde(rename = "ANALYZE_TEXT")]
    AnalyzeText { text: String },
}

impl Request {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::RewriteSelection { text } | Self::AnalyzeText { text } => text,
        }
    }
}

/// Outgoing reply. `ok` discriminates which of the optional fields is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RewriteResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    #[must_use]
    pub fn success(result: RewriteResult) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Route one request to the service and fold the outcome into a reply.
/// Errors become their display strings; the caller never sees error types.
pub async fn dispatch(service: &RewriteService, request: Request) -> Response {
    let outcome = match &request {
        Request::RewriteSelection { text } => service.rewrite(text).await,
        Request::AnalyzeText { text } => service.analyze(text).await,
    };
    match outcome {
        Ok(result) => Response::success(result),
        Err(err) => {
            tracing::debug!(error = %err, "rewrite request failed");
            Response::failure(err.to_string())
        }
    }
}
