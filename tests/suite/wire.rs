//! Wire-format tests for the request/response envelope.
//!
//! The page side of the system speaks this JSON verbatim, so the shapes are
//! asserted exactly, key for key.

use serde_json::json;
use tonedown_engine::{Request, Response};
use tonedown_types::{RewriteResult, Sentiment, ToneAnalysis};

#[test]
fn rewrite_request_round_trips_exactly() {
    let request = Request::RewriteSelection {
        text: "calm down already".to_string(),
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(
        value,
        json!({"type": "REWRITE_SELECTION", "text": "calm down already"})
    );
    let parsed: Request = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, request);
}

#[test]
fn analyze_request_parses_from_page_json() {
    let parsed: Request =
        serde_json::from_str(r#"{"type":"ANALYZE_TEXT","text":"is this hostile?"}"#).unwrap();
    assert_eq!(
        parsed,
        Request::AnalyzeText {
            text: "is this hostile?".to_string()
        }
    );
}

#[test]
fn freeform_success_carries_only_the_text() {
    let response = Response::success(RewriteResult::freeform("a calmer phrasing"));
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "ok": true,
            "result": { "rewrittenText": "a calmer phrasing" },
        })
    );
}

#[test]
fn structured_success_flattens_the_analysis() {
    let response = Response::success(RewriteResult::structured(
        "a calmer phrasing",
        ToneAnalysis {
            sentiment: Sentiment::Negative,
            is_toxic: true,
            should_rewrite: true,
        },
    ));
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "ok": true,
            "result": {
                "rewrittenText": "a calmer phrasing",
                "sentiment": "negative",
                "isToxic": true,
                "shouldRewrite": true,
            },
        })
    );
}

#[test]
fn failure_round_trips_without_a_result_field() {
    let response = Response::failure("No text selected.");
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value, json!({"ok": false, "error": "No text selected."}));
    let parsed: Response = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, response);
}

#[test]
fn responses_parse_with_their_omitted_fields_absent() {
    let success: Response =
        serde_json::from_str(r#"{"ok":true,"result":{"rewrittenText":"x"}}"#).unwrap();
    assert!(success.ok);
    assert!(success.error.is_none());
    assert_eq!(
        success.result.map(|r| r.rewritten_text),
        Some("x".to_string())
    );

    let failure: Response = serde_json::from_str(r#"{"ok":false,"error":"boom"}"#).unwrap();
    assert!(!failure.ok);
    assert!(failure.result.is_none());
}
