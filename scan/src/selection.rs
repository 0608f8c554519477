//! Selection-driven rewriting: the user selects a span of text, confirms
//! via the floating button, and the selected range is replaced in place.
//!
//! The overlay owns no rendering; it tracks the active selection, validates
//! targets, and reports what the frontend should do (replace happened, or
//! show a toast). Button geometry is a pure function so placement can be
//! tested without a layout engine.

use crate::dom::{LiveDocument, NodeId};
use tonedown_engine::Rewriter;
use tonedown_types::{OutputContract, normalize};

/// Selections longer than this (normalized) are refused with a toast.
pub const MAX_SELECTION_LENGTH: usize = 1200;

/// How long the frontend should keep a toast visible.
pub const TOAST_VISIBLE_MS: u64 = 2800;

/// Gap between the selection rectangle and the button.
const BUTTON_OFFSET: f64 = 8.0;

/// Minimum distance from the viewport's top-left edges.
const BUTTON_EDGE_PADDING: f64 = 8.0;

/// Room reserved so the button never overflows the right viewport edge.
const BUTTON_WIDTH_ALLOWANCE: f64 = 100.0;

/// Room reserved so the button never overflows the bottom viewport edge.
const BUTTON_HEIGHT_ALLOWANCE: f64 = 40.0;

/// Bounding rectangle of the active selection, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Top-left corner for the floating button.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonPosition {
    pub left: f64,
    pub top: f64,
}

/// Place the button just past the selection's bottom-right corner, clamped
/// inside the viewport. A collapsed rectangle means the selection is gone;
/// the button should be hidden.
#[must_use]
pub fn place_button(rect: Rect, viewport: Viewport) -> Option<ButtonPosition> {
    if rect.width() <= 0.0 && rect.height() <= 0.0 {
        return None;
    }
    let left = (rect.right + BUTTON_OFFSET)
        .min(viewport.width - BUTTON_WIDTH_ALLOWANCE)
        .max(BUTTON_EDGE_PADDING);
    let top = (rect.bottom + BUTTON_OFFSET)
        .min(viewport.height - BUTTON_HEIGHT_ALLOWANCE)
        .max(BUTTON_EDGE_PADDING);
    Some(ButtonPosition { left, top })
}

/// What the frontend should do after a confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// The selected range now holds the rewritten text.
    Replaced,
    /// Show this message briefly; the document was not changed.
    Toast(String),
}

/// A byte range inside one text node.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    node: NodeId,
    start: usize,
    end: usize,
    text: String,
}

/// Tracks the active selection and runs the confirm flow.
#[derive(Debug, Default)]
pub struct SelectionOverlay {
    selection: Option<Selection>,
}

impl SelectionOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new selection spanning `start..end` (byte offsets) of one
    /// text node. Empty, invalid, or forbidden-target selections clear the
    /// overlay instead.
    pub fn update_selection(
        &mut self,
        doc: &LiveDocument,
        node: NodeId,
        start: usize,
        end: usize,
    ) {
        self.selection = None;
        let Some(raw) = doc.text(node) else {
            return;
        };
        if start >= end
            || end > raw.len()
            || !raw.is_char_boundary(start)
            || !raw.is_char_boundary(end)
        {
            return;
        }
        let text = normalize(&raw[start..end]);
        if text.is_empty() || is_forbidden_target(doc, node) {
            return;
        }
        self.selection = Some(Selection {
            node,
            start,
            end,
            text,
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Normalized text of the active selection, if any.
    #[must_use]
    pub fn selection_text(&self) -> Option<&str> {
        self.selection.as_ref().map(|selection| selection.text.as_str())
    }

    /// The confirm flow: validate the stored selection, run the rewrite,
    /// and splice the result into the document. Validation failures and
    /// rewrite errors become toast messages.
    pub async fn rewrite_selection<R: Rewriter>(
        &mut self,
        doc: &mut LiveDocument,
        rewriter: &R,
    ) -> Feedback {
        let Some(selection) = self.selection.clone() else {
            return Feedback::Toast("Please select text first.".to_string());
        };
        let length = selection.text.chars().count();
        if length > MAX_SELECTION_LENGTH {
            return Feedback::Toast(format!(
                "Selection is too long ({length}/{MAX_SELECTION_LENGTH})."
            ));
        }
        if is_forbidden_target(doc, selection.node) {
            self.selection = None;
            return Feedback::Toast(
                "Rewriting in input/textarea/contentEditable is not supported.".to_string(),
            );
        }

        let outcome = rewriter
            .rewrite(&selection.text, OutputContract::Freeform)
            .await;
        match outcome {
            Ok(result) => {
                self.replace_selected_range(doc, &selection, &result.rewritten_text);
                Feedback::Replaced
            }
            Err(err) => Feedback::Toast(err.to_string()),
        }
    }

    /// Splice the rewritten text over the selected byte range. If the node
    /// changed or detached while the rewrite was in flight, the stale result
    /// is discarded silently.
    fn replace_selected_range(
        &mut self,
        doc: &mut LiveDocument,
        selection: &Selection,
        new_text: &str,
    ) {
        self.selection = None;
        let safe = normalize(new_text);
        if safe.is_empty() || !doc.is_attached(selection.node) {
            return;
        }
        let Some(raw) = doc.text(selection.node) else {
            return;
        };
        if selection.end > raw.len()
            || !raw.is_char_boundary(selection.start)
            || !raw.is_char_boundary(selection.end)
        {
            return;
        }
        let updated = format!(
            "{}{}{}",
            &raw[..selection.start],
            safe,
            &raw[selection.end..]
        );
        doc.set_text(selection.node, &updated);
    }
}

/// Selections inside form controls or editable regions are never rewritten.
fn is_forbidden_target(doc: &LiveDocument, node: NodeId) -> bool {
    let Some(element) = doc.containing_element(node) else {
        return false;
    };
    doc.self_and_ancestors(element).any(|ancestor| {
        if let Some(tag) = doc.tag_name(ancestor)
            && matches!(tag, "input" | "textarea")
        {
            return true;
        }
        matches!(doc.attr(ancestor, "contenteditable"), Some("" | "true"))
    })
}
