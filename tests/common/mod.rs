//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use tonedown_engine::{GenerationClient, RewriteService};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start a mock server that simulates the Gemini generateContent API
pub async fn start_gemini_mock() -> MockServer {
    MockServer::start().await
}

/// Endpoint path for one (version, model) candidate target
pub fn gemini_path(version: &str, model: &str) -> String {
    format!("/{version}/models/{model}:generateContent")
}

/// Response envelope carrying one text part, the shape every
/// successful generateContent reply uses
pub fn gemini_text_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{ "text": text }]
            }
        }]
    })
}

/// Mount a successful text reply for one candidate target
pub async fn mount_text_response(server: &MockServer, version: &str, model: &str, text: &str) {
    Mock::given(method("POST"))
        .and(path(gemini_path(version, model)))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body(text)))
        .mount(server)
        .await;
}

/// Mount the unknown-model failure the fallback resolver advances past
pub async fn mount_model_not_found(server: &MockServer, version: &str, model: &str) {
    Mock::given(method("POST"))
        .and(path(gemini_path(version, model)))
        .respond_with(ResponseTemplate::new(404).set_body_string(format!(
            "models/{model} is not found for API version {version}"
        )))
        .mount(server)
        .await;
}

/// The structured contract's reply payload, delivered as the text part
pub fn structured_reply(sentiment: &str, toxic: bool, rewrite: bool, text: &str) -> String {
    serde_json::json!({
        "sentiment": sentiment,
        "isToxic": toxic,
        "shouldRewrite": rewrite,
        "rewrittenText": text,
    })
    .to_string()
}

/// A service wired to the mock server with a test credential
pub fn service_for(server: &MockServer) -> RewriteService {
    RewriteService::new(
        GenerationClient::with_client(reqwest::Client::new(), server.uri()),
        Some("integration-test-key".to_string()),
        None,
    )
}

/// Same wiring with a preferred model override
pub fn service_preferring(server: &MockServer, model: &str) -> RewriteService {
    RewriteService::new(
        GenerationClient::with_client(reqwest::Client::new(), server.uri()),
        Some("integration-test-key".to_string()),
        Some(model.to_string()),
    )
}
