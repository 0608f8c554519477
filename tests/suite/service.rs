//! End-to-end rewrite service tests against a mock generateContent endpoint.
//!
//! These exercise the full path a request takes in production: message
//! dispatch, credential check, candidate fallback across API versions, and
//! output-contract enforcement at the response boundary.

use tonedown_engine::{GenerationClient, Request, RewriteService, dispatch};
use tonedown_providers::{DEFAULT_MODEL, MODEL_CANDIDATES};
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    gemini_text_body, mount_model_not_found, mount_text_response, service_for, service_preferring,
    start_gemini_mock, structured_reply,
};

/// When every model on the first API version is unknown, the fallback walks
/// onto the second version and succeeds there.
#[tokio::test]
async fn rollover_reaches_the_second_api_version() {
    let server = start_gemini_mock().await;
    for model in MODEL_CANDIDATES {
        mount_model_not_found(&server, "v1beta", model).await;
    }
    mount_text_response(&server, "v1", DEFAULT_MODEL, "a calmer phrasing").await;

    let result = service_for(&server)
        .rewrite("this is absolutely unacceptable work")
        .await
        .expect("fifth candidate should succeed");

    assert_eq!(result.rewritten_text, "a calmer phrasing");
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), MODEL_CANDIDATES.len() + 1);
    assert!(received[..MODEL_CANDIDATES.len()]
        .iter()
        .all(|r| r.url.path().starts_with("/v1beta/")));
    assert!(received[MODEL_CANDIDATES.len()].url.path().starts_with("/v1/"));
}

/// A configured model preference is attempted before any default candidate.
#[tokio::test]
async fn preferred_model_is_attempted_first() {
    let server = start_gemini_mock().await;
    mount_text_response(&server, "v1beta", "gemini-custom-tuned", "softened").await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("wrong candidate"))
        .expect(0)
        .mount(&server)
        .await;

    let result = service_preferring(&server, "gemini-custom-tuned")
        .rewrite("knock it off already, all of you")
        .await
        .expect("preferred model should be used directly");

    assert_eq!(result.rewritten_text, "softened");
}

/// A rewrite request travels through dispatch and comes back as a success
/// response carrying the result.
#[tokio::test]
async fn dispatch_answers_rewrite_requests() {
    let server = start_gemini_mock().await;
    mount_text_response(&server, "v1beta", DEFAULT_MODEL, "could you take another look?").await;

    let response = dispatch(
        &service_for(&server),
        Request::RewriteSelection {
            text: "did you even read what I wrote?".to_string(),
        },
    )
    .await;

    assert!(response.ok);
    assert!(response.error.is_none());
    let result = response.result.expect("success carries a result");
    assert_eq!(result.rewritten_text, "could you take another look?");
    assert!(result.analysis.is_none());
}

/// Structured analysis survives a model that fences its JSON and pads it
/// with prose.
#[tokio::test]
async fn dispatch_recovers_fenced_analysis_output() {
    let server = start_gemini_mock().await;
    let fenced = format!(
        "Here is the analysis you asked for:\n```json\n{}\n```",
        structured_reply("negative", true, true, "please reconsider this")
    );
    mount_text_response(&server, "v1beta", DEFAULT_MODEL, &fenced).await;

    let response = dispatch(
        &service_for(&server),
        Request::AnalyzeText {
            text: "what a useless answer".to_string(),
        },
    )
    .await;

    assert!(response.ok);
    let result = response.result.expect("analysis result");
    assert_eq!(result.rewritten_text, "please reconsider this");
    let analysis = result.analysis.expect("structured contract carries analysis");
    assert!(analysis.is_toxic);
    assert!(analysis.should_rewrite);
}

/// When the model declines to rewrite, the response echoes the caller's text
/// exactly, whitespace and all, even though the wire reply was normalized.
#[tokio::test]
async fn declined_analysis_returns_the_callers_exact_text() {
    let server = start_gemini_mock().await;
    mount_text_response(
        &server,
        "v1beta",
        DEFAULT_MODEL,
        &structured_reply("positive", false, false, "thanks, that helps a lot"),
    )
    .await;

    let raw = "  thanks,   that helps a lot  ";
    let response = dispatch(
        &service_for(&server),
        Request::AnalyzeText {
            text: raw.to_string(),
        },
    )
    .await;

    assert!(response.ok);
    let result = response.result.expect("analysis result");
    assert!(!result.should_rewrite());
    assert_eq!(result.rewritten_text, raw);
}

/// The exact-input guarantee holds on cache hits too: a second caller with
/// different spacing gets its own spacing back, not the first caller's.
#[tokio::test]
async fn declined_analysis_cache_hits_mirror_each_caller() {
    let server = start_gemini_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body(
            &structured_reply("neutral", false, false, "fine by me, go ahead"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let first = dispatch(
        &service,
        Request::AnalyzeText {
            text: "fine by me,  go ahead".to_string(),
        },
    )
    .await;
    let second = dispatch(
        &service,
        Request::AnalyzeText {
            text: "  fine by me, go ahead".to_string(),
        },
    )
    .await;

    assert_eq!(
        first.result.expect("first result").rewritten_text,
        "fine by me,  go ahead"
    );
    assert_eq!(
        second.result.expect("cached result").rewritten_text,
        "  fine by me, go ahead"
    );
}

/// Without a credential the failure surfaces as a user-facing message naming
/// the setting, and the endpoint is never contacted.
#[tokio::test]
async fn missing_credential_fails_without_touching_the_network() {
    let server = start_gemini_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body("never served")))
        .expect(0)
        .mount(&server)
        .await;

    let service = RewriteService::new(
        GenerationClient::with_client(reqwest::Client::new(), server.uri()),
        None,
        None,
    );
    let response = dispatch(
        &service,
        Request::RewriteSelection {
            text: "some perfectly ordinary text".to_string(),
        },
    )
    .await;

    assert!(!response.ok);
    assert!(response.result.is_none());
    let error = response.error.expect("failure carries a message");
    assert!(error.contains("GEMINI_API_KEY"), "got: {error}");
}
