//! The scan engine: watches a live document's change feed, discovers
//! candidate text regions, and rewrites qualifying ones in place.
//!
//! Scanning is fire-and-forget: `observe` runs synchronously and only queues
//! rewrite futures; `drain` awaits them and applies completed results. A
//! processed-node record is written at dispatch time, then updated to the
//! rewritten value at apply time, so the engine's own document edits are
//! never mistaken for new page content and cannot loop.

use crate::candidates::{self, TOGGLE_ATTR};
use crate::dom::{LiveDocument, Mutation, NodeId};
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tonedown_engine::Rewriter;
use tonedown_types::{OutputContract, RewriteError, RewriteResult, normalize};

/// Toggle label while the rewritten text is displayed.
pub const TOGGLE_LABEL_ORIGINAL: &str = "Show original";

/// Toggle label while the original text is displayed.
pub const TOGGLE_LABEL_REWRITE: &str = "Show rewrite";

/// A rewrite the engine has applied to the document, kept for toggling.
#[derive(Debug)]
struct AppliedRewrite {
    original: String,
    rewritten: String,
    showing_original: bool,
}

struct ScanOutcome {
    node: NodeId,
    outcome: Result<RewriteResult, RewriteError>,
}

/// Drives candidate discovery and in-place rewriting over one document.
pub struct ScanEngine<R> {
    rewriter: Arc<R>,
    /// Processed-node records: text node to the last normalized value either
    /// submitted for that node or applied to it by the engine.
    records: HashMap<NodeId, String>,
    applied: HashMap<NodeId, AppliedRewrite>,
    /// Toggle control element to the text node it flips.
    toggles: HashMap<NodeId, NodeId>,
    pending: FuturesUnordered<BoxFuture<'static, ScanOutcome>>,
}

impl<R: Rewriter + 'static> ScanEngine<R> {
    #[must_use]
    pub fn new(rewriter: Arc<R>) -> Self {
        Self {
            rewriter,
            records: HashMap::new(),
            applied: HashMap::new(),
            toggles: HashMap::new(),
            pending: FuturesUnordered::new(),
        }
    }

    /// Initial pass over the whole document.
    pub fn scan_document(&mut self, doc: &LiveDocument) {
        self.scan_subtree(doc, doc.root());
    }

    /// Drain the document's change feed. Additions rescan the added subtree;
    /// character-data changes rescan the changed node's containing element
    /// only. Removals purge records for everything that came detached.
    pub fn observe(&mut self, doc: &mut LiveDocument) {
        for mutation in doc.take_mutations() {
            match mutation {
                Mutation::ChildList { added, removed, .. } => {
                    if !removed.is_empty() {
                        self.purge_detached(doc);
                    }
                    for node in added {
                        if !doc.is_attached(node) {
                            continue;
                        }
                        if doc.is_element(node) {
                            self.scan_subtree(doc, node);
                        } else if let Some(element) = doc.containing_element(node) {
                            self.scan_element(doc, element);
                        }
                    }
                }
                Mutation::CharacterData { node } => {
                    if doc.is_attached(node)
                        && let Some(element) = doc.containing_element(node)
                    {
                        self.scan_element(doc, element);
                    }
                }
            }
        }
    }

    /// Number of rewrites dispatched but not yet applied.
    #[must_use]
    pub fn pending_rewrites(&self) -> usize {
        self.pending.len()
    }

    /// Await every pending rewrite and apply results as they complete. The
    /// engine's own edits queue further change notifications; those are
    /// observed inline and settle without new dispatches.
    pub async fn drain(&mut self, doc: &mut LiveDocument) {
        while let Some(completed) = self.pending.next().await {
            self.apply(doc, completed);
            self.observe(doc);
        }
    }

    /// Flip a rewritten node between its original and rewritten content.
    /// `toggle` is the control element the engine attached earlier.
    pub fn toggle(&mut self, doc: &mut LiveDocument, toggle: NodeId) {
        let Some(&node) = self.toggles.get(&toggle) else {
            return;
        };
        let (text, label) = {
            let Some(state) = self.applied.get_mut(&node) else {
                return;
            };
            state.showing_original = !state.showing_original;
            if state.showing_original {
                (state.original.clone(), TOGGLE_LABEL_REWRITE)
            } else {
                (state.rewritten.clone(), TOGGLE_LABEL_ORIGINAL)
            }
        };
        doc.set_text(node, &text);
        self.records.insert(node, normalize(&text));
        if let Some(label_node) = doc.children(toggle).first().copied() {
            doc.set_text(label_node, label);
        }
    }

    fn purge_detached(&mut self, doc: &LiveDocument) {
        self.records.retain(|node, _| doc.is_attached(*node));
        self.applied.retain(|node, _| doc.is_attached(*node));
        self.toggles.retain(|toggle, _| doc.is_attached(*toggle));
    }

    fn scan_subtree(&mut self, doc: &LiveDocument, root: NodeId) {
        for element in doc.subtree_elements(root) {
            self.scan_element(doc, element);
        }
    }

    fn scan_element(&mut self, doc: &LiveDocument, element: NodeId) {
        if candidates::is_engine_artifact(doc, element)
            || !candidates::matches_container(doc, element)
        {
            return;
        }
        let Some((node, value)) = candidates::primary_text_region(doc, element) else {
            return;
        };
        if !candidates::is_eligible(&value) {
            return;
        }
        if self.records.get(&node) == Some(&value) {
            return;
        }
        self.dispatch(node, value);
    }

    /// Record first, then queue: overlapping mutation callbacks observing
    /// the same unchanged content cannot double-submit a node.
    fn dispatch(&mut self, node: NodeId, value: String) {
        tracing::debug!(node = ?node, chars = value.chars().count(), "queueing rewrite");
        self.records.insert(node, value.clone());
        let rewriter = Arc::clone(&self.rewriter);
        self.pending.push(
            async move {
                let outcome = rewriter
                    .rewrite(&value, OutputContract::Structured)
                    .await;
                ScanOutcome { node, outcome }
            }
            .boxed(),
        );
    }

    fn apply(&mut self, doc: &mut LiveDocument, completed: ScanOutcome) {
        let ScanOutcome { node, outcome } = completed;
        if !doc.is_attached(node) {
            return;
        }
        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                // Record stays at the input value: the same content is not
                // resubmitted on every mutation, while genuinely new content
                // still qualifies.
                tracing::warn!(error = %err, "scan rewrite failed");
                return;
            }
        };
        if !result.should_rewrite() {
            return;
        }
        let Some(original) = doc.text(node).map(str::to_string) else {
            return;
        };
        let rewritten = result.rewritten_text;
        doc.set_text(node, &rewritten);
        self.records.insert(node, normalize(&rewritten));
        if let Some(toggle) = attach_toggle(doc, node) {
            self.toggles.insert(toggle, node);
        }
        self.applied.insert(
            node,
            AppliedRewrite {
                original,
                rewritten,
                showing_original: false,
            },
        );
    }
}

/// Append the toggle control to the rewritten node's containing element.
fn attach_toggle(doc: &mut LiveDocument, node: NodeId) -> Option<NodeId> {
    let element = doc.containing_element(node)?;
    let markup =
        format!("<button type=\"button\" {TOGGLE_ATTR}=\"\">{TOGGLE_LABEL_ORIGINAL}</button>");
    doc.append_html(element, &markup).into_iter().next()
}
