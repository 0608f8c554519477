//! Full-page scan tests: a comment thread goes through the real service and
//! a mock generateContent endpoint, and hostile comments come back rewritten
//! in place while everything else is left alone.

use std::sync::Arc;

use tonedown_scan::candidates::TOGGLE_ATTR;
use tonedown_scan::{LiveDocument, NodeId, ScanEngine};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{gemini_text_body, service_for, start_gemini_mock, structured_reply};

const RUDE_COMMENT: &str =
    "You are a complete idiot and this whole proposal is garbage from start to finish.";
const RUDE_REWRITE: &str =
    "I strongly disagree with this proposal and think it needs a rework before it lands.";
const POLITE_COMMENT: &str =
    "Thanks for writing this up, the migration plan looks solid and thorough to me.";
const INTRO: &str = "Welcome to the discussion. Keep things civil and on topic while you are here.";

fn thread_page() -> String {
    format!(
        "<html><body><article id=\"thread\">\
         <p id=\"intro\">{INTRO}</p>\
         <div class=\"comment\" id=\"first\">{RUDE_COMMENT}</div>\
         <div class=\"comment\" id=\"second\">{POLITE_COMMENT}</div>\
         <div class=\"comment\" id=\"short\">lol ok</div>\
         <div class=\"comment\" id=\"hidden\" style=\"display:none\">\
         You are a complete fool and everyone reading this thread secretly agrees with me.\
         </div>\
         </article></body></html>"
    )
}

fn element_by_id(doc: &LiveDocument, id: &str) -> NodeId {
    doc.subtree_elements(doc.root())
        .into_iter()
        .find(|e| doc.attr(*e, "id") == Some(id))
        .expect("element with id present")
}

/// The element's own comment text, ignoring any attached engine controls.
fn comment_text(doc: &LiveDocument, id: &str) -> String {
    let element = element_by_id(doc, id);
    let node = doc.descendant_text_nodes(element)[0];
    doc.text(node).expect("text node").to_string()
}

fn toggle_in(doc: &LiveDocument, id: &str) -> Option<NodeId> {
    let element = element_by_id(doc, id);
    doc.subtree_elements(element)
        .into_iter()
        .find(|e| doc.attr(*e, TOGGLE_ATTR).is_some())
}

/// Route each comment to its own analysis by matching the input text the
/// prompt embeds.
async fn mount_structured(server: &MockServer, needle: &str, reply: &str) {
    Mock::given(method("POST"))
        .and(body_string_contains(needle))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text_body(reply)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn hostile_comments_are_rewritten_and_the_rest_survive() {
    let server = start_gemini_mock().await;
    mount_structured(
        &server,
        "complete idiot",
        &structured_reply("negative", true, true, RUDE_REWRITE),
    )
    .await;
    mount_structured(
        &server,
        "Welcome to the discussion",
        &structured_reply("neutral", false, false, INTRO),
    )
    .await;
    mount_structured(
        &server,
        "migration plan",
        &structured_reply("positive", false, false, POLITE_COMMENT),
    )
    .await;
    // Hidden and too-short comments must never reach the endpoint.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("unexpected dispatch"))
        .expect(0)
        .mount(&server)
        .await;

    let mut doc = LiveDocument::parse(&thread_page());
    let mut engine = ScanEngine::new(Arc::new(service_for(&server)));
    engine.scan_document(&doc);
    assert_eq!(engine.pending_rewrites(), 3);
    engine.drain(&mut doc).await;

    assert_eq!(comment_text(&doc, "first"), RUDE_REWRITE);
    assert_eq!(comment_text(&doc, "intro"), INTRO);
    assert_eq!(comment_text(&doc, "second"), POLITE_COMMENT);
    assert_eq!(comment_text(&doc, "short"), "lol ok");

    // Only the rewritten comment carries a toggle control.
    assert!(toggle_in(&doc, "first").is_some());
    assert!(toggle_in(&doc, "intro").is_none());
    assert!(toggle_in(&doc, "second").is_none());
    assert!(doc.to_html(doc.root()).contains(TOGGLE_ATTR));
}

#[tokio::test]
async fn toggling_restores_the_original_comment_without_redispatch() {
    let server = start_gemini_mock().await;
    mount_structured(
        &server,
        "complete idiot",
        &structured_reply("negative", true, true, RUDE_REWRITE),
    )
    .await;

    let page = format!(
        "<html><body><div class=\"comment\" id=\"only\">{RUDE_COMMENT}</div></body></html>"
    );
    let mut doc = LiveDocument::parse(&page);
    let mut engine = ScanEngine::new(Arc::new(service_for(&server)));
    engine.scan_document(&doc);
    engine.drain(&mut doc).await;
    assert_eq!(comment_text(&doc, "only"), RUDE_REWRITE);

    let toggle = toggle_in(&doc, "only").expect("toggle attached");
    engine.toggle(&mut doc, toggle);
    assert_eq!(comment_text(&doc, "only"), RUDE_COMMENT);

    engine.toggle(&mut doc, toggle);
    assert_eq!(comment_text(&doc, "only"), RUDE_REWRITE);

    // Flipping edits the page, but those edits settle without new requests;
    // the single expect(1) mock verifies when the server shuts down.
    engine.observe(&mut doc);
    assert_eq!(engine.pending_rewrites(), 0);
}

#[tokio::test]
async fn comments_added_after_the_initial_scan_are_rewritten() {
    let server = start_gemini_mock().await;
    mount_structured(
        &server,
        "working brain",
        &structured_reply(
            "negative",
            true,
            true,
            "I do not think this approach holds up, and I would like to see the numbers.",
        ),
    )
    .await;

    let mut doc =
        LiveDocument::parse("<html><body><article id=\"thread\"></article></body></html>");
    let mut engine = ScanEngine::new(Arc::new(service_for(&server)));
    engine.scan_document(&doc);
    assert_eq!(engine.pending_rewrites(), 0);

    let thread = element_by_id(&doc, "thread");
    doc.append_html(
        thread,
        "<div class=\"comment\" id=\"late\">\
         Nobody with a working brain would ship this, and you all know it perfectly well.\
         </div>",
    );
    engine.observe(&mut doc);
    assert_eq!(engine.pending_rewrites(), 1);
    engine.drain(&mut doc).await;

    assert_eq!(
        comment_text(&doc, "late"),
        "I do not think this approach holds up, and I would like to see the numbers."
    );
    assert!(toggle_in(&doc, "late").is_some());
}
