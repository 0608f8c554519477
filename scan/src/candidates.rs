//! Candidate discovery: which elements look like user-authored content, and
//! which text region inside them is worth rewriting.

use crate::dom::{LiveDocument, NodeId};
use tonedown_types::normalize;

/// Normalized text shorter than this is never processed.
pub const MIN_SCAN_LENGTH: usize = 20;

/// Normalized text longer than this is never processed.
pub const MAX_SCAN_LENGTH: usize = 900;

/// Minimum whitespace-delimited tokens; filters out code-ish fragments and
/// bare labels that happen to clear the length floor.
pub const MIN_SCAN_TOKENS: usize = 4;

/// Marker attribute on controls the engine inserts itself. Anything carrying
/// it (or nested under it) is excluded from candidate discovery.
pub const TOGGLE_ATTR: &str = "data-tonedown-toggle";

/// Generic flow containers that commonly hold prose.
const CONTAINER_TAGS: &[&str] = &[
    "p",
    "li",
    "blockquote",
    "dd",
    "figcaption",
    "td",
    "article",
    "section",
    "div",
];

/// ARIA roles that mark user-authored regions.
const CONTAINER_ROLES: &[&str] = &["comment", "article", "listitem", "note"];

/// Naming conventions sites use for comment-like containers; matched as a
/// case-insensitive substring of the class attribute.
const CLASS_HINTS: &[&str] = &["comment", "reply", "review", "message", "post"];

/// Whether an element is a candidate container.
#[must_use]
pub fn matches_container(doc: &LiveDocument, element: NodeId) -> bool {
    let Some(tag) = doc.tag_name(element) else {
        return false;
    };
    if CONTAINER_TAGS.contains(&tag) {
        return true;
    }
    if let Some(role) = doc.attr(element, "role") {
        let role = role.to_ascii_lowercase();
        if CONTAINER_ROLES.contains(&role.as_str()) {
            return true;
        }
    }
    if let Some(class) = doc.attr(element, "class") {
        let class = class.to_ascii_lowercase();
        return CLASS_HINTS.iter().any(|hint| class.contains(hint));
    }
    false
}

/// Whether the node was inserted by the engine (or sits inside something
/// that was), making it ineligible for rescanning.
#[must_use]
pub fn is_engine_artifact(doc: &LiveDocument, id: NodeId) -> bool {
    doc.self_and_ancestors(id)
        .any(|ancestor| doc.attr(ancestor, TOGGLE_ATTR).is_some())
}

/// The candidate's primary text region: the visible descendant text node
/// with the greatest normalized length that clears the length floor. Ties
/// keep the first node in document order. Returns the node together with
/// its normalized value.
#[must_use]
pub fn primary_text_region(doc: &LiveDocument, element: NodeId) -> Option<(NodeId, String)> {
    let mut best: Option<(NodeId, String, usize)> = None;
    for node in doc.descendant_text_nodes(element) {
        if is_engine_artifact(doc, node) || !doc.is_visible(node) {
            continue;
        }
        let Some(raw) = doc.text(node) else {
            continue;
        };
        let value = normalize(raw);
        let length = value.chars().count();
        if length < MIN_SCAN_LENGTH {
            continue;
        }
        if best
            .as_ref()
            .is_none_or(|(_, _, best_length)| length > *best_length)
        {
            best = Some((node, value, length));
        }
    }
    best.map(|(node, value, _)| (node, value))
}

/// The eligibility filter applied to a normalized text region before it is
/// handed to the rewrite service.
#[must_use]
pub fn is_eligible(normalized: &str) -> bool {
    let length = normalized.chars().count();
    if !(MIN_SCAN_LENGTH..=MAX_SCAN_LENGTH).contains(&length) {
        return false;
    }
    normalized.split_whitespace().count() >= MIN_SCAN_TOKENS
}
