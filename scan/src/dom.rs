//! In-memory live document with a change feed.
//!
//! Parsing goes through `scraper`; the parsed body subtree is copied into an
//! arena of nodes addressed by `NodeId`, which stays valid across edits.
//! Every structural or character-data edit appends to a mutation queue that
//! the scan engine drains, mirroring how a mutation observer batches change
//! notifications. Attribute edits are deliberately not observed.

use scraper::{ElementRef, Html, Node};
use std::iter;
use std::mem;

// ============================================================================
// Node arena
// ============================================================================

/// Stable handle into one document's arena. Ids are never reused, and they
/// are only meaningful for the document that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
}

#[derive(Debug)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// One batched change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Children were added to or removed from `target`.
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// A text node's character content changed.
    CharacterData { node: NodeId },
}

/// A mutable HTML document rooted at `<body>`.
///
/// Detached subtrees stay in the arena (their ids remain queryable) but are
/// no longer reachable from the root; `is_attached` distinguishes the two.
#[derive(Debug)]
pub struct LiveDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
    mutations: Vec<Mutation>,
}

impl LiveDocument {
    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse a full HTML document (lenient, handles malformed markup) and
    /// build the arena from its `<body>` subtree.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            mutations: Vec::new(),
        };
        let body = find_body(&parsed).unwrap_or_else(|| parsed.root_element());
        doc.root = doc.convert_element(body, None);
        doc
    }

    fn convert_element(&mut self, element: ElementRef<'_>, parent: Option<NodeId>) -> NodeId {
        let attrs = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let id = self.push_node(
            parent,
            NodeKind::Element {
                name: element.value().name().to_ascii_lowercase(),
                attrs,
            },
        );
        for child in element.children() {
            match child.value() {
                Node::Text(text) => {
                    self.push_node(
                        Some(id),
                        NodeKind::Text {
                            text: text.to_string(),
                        },
                    );
                }
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.convert_element(el, Some(id));
                    }
                }
                _ => {}
            }
        }
        id
    }

    fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element { .. })
    }

    /// Tag name for element nodes, `None` for text nodes.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text { .. } => None,
        }
    }

    /// Character content for text nodes, `None` for elements.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text { text } => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(attr_name, _)| attr_name.as_str() == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text { .. } => None,
        }
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The node itself for elements, the parent element for text nodes.
    #[must_use]
    pub fn containing_element(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes[id.0].kind {
            NodeKind::Element { .. } => Some(id),
            NodeKind::Text { .. } => self.nodes[id.0].parent,
        }
    }

    /// Walk from `id` up through its parents, yielding `id` first.
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(Some(id), |current| self.nodes[current.0].parent)
    }

    /// Whether the node is still reachable from the document root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.self_and_ancestors(id).any(|node| node == self.root)
    }

    /// Text nodes under `root` (inclusive), in document order.
    #[must_use]
    pub fn descendant_text_nodes(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match &self.nodes[id.0].kind {
                NodeKind::Text { .. } => found.push(id),
                NodeKind::Element { .. } => {
                    for child in self.nodes[id.0].children.iter().rev() {
                        stack.push(*child);
                    }
                }
            }
        }
        found
    }

    /// Element nodes under `root` (inclusive), in document order.
    #[must_use]
    pub fn subtree_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let NodeKind::Element { .. } = &self.nodes[id.0].kind {
                found.push(id);
                for child in self.nodes[id.0].children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        found
    }

    /// Visibility cascade: a node is visible when no ancestor element hides
    /// it through the `hidden` attribute or inline `display`/`visibility`/
    /// `opacity` declarations, and its containing element renders a box.
    /// Without layout information, "renders a box" is approximated as
    /// "contains non-whitespace text".
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        let Some(element) = self.containing_element(id) else {
            return false;
        };
        for ancestor in self.self_and_ancestors(element) {
            if self.attr(ancestor, "hidden").is_some() {
                return false;
            }
            if let Some(style) = self.attr(ancestor, "style")
                && style_hides(style)
            {
                return false;
            }
        }
        self.descendant_text_nodes(element)
            .iter()
            .any(|node| self.text(*node).is_some_and(|text| !text.trim().is_empty()))
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Replace a text node's character content. Records a mutation unless
    /// the value is unchanged. No-op for element nodes.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeKind::Text { text: current } = &mut self.nodes[id.0].kind
            && current != text
        {
            *current = text.to_string();
            self.mutations.push(Mutation::CharacterData { node: id });
        }
    }

    /// Set or replace an attribute on an element. Attribute changes are not
    /// part of the observed change feed.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            if let Some(slot) = attrs.iter_mut().find(|(attr_name, _)| attr_name == name) {
                slot.1 = value.to_string();
            } else {
                attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Parse an HTML fragment and append its top-level nodes as children of
    /// `parent`. Returns the added roots and records one child-list mutation
    /// covering all of them.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        if !self.is_element(parent) {
            return Vec::new();
        }
        let fragment = Html::parse_fragment(html);
        let context = fragment.root_element();
        let mut added = Vec::new();
        for child in context.children() {
            match child.value() {
                Node::Text(text) => {
                    added.push(self.push_node(
                        Some(parent),
                        NodeKind::Text {
                            text: text.to_string(),
                        },
                    ));
                }
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        added.push(self.convert_element(el, Some(parent)));
                    }
                }
                _ => {}
            }
        }
        if !added.is_empty() {
            self.mutations.push(Mutation::ChildList {
                target: parent,
                added: added.clone(),
                removed: Vec::new(),
            });
        }
        added
    }

    /// Remove a node from its parent. The subtree stays in the arena but is
    /// no longer attached. No-op for the root and already-detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent else {
            return;
        };
        self.nodes[parent.0].children.retain(|child| *child != id);
        self.nodes[id.0].parent = None;
        self.mutations.push(Mutation::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![id],
        });
    }

    /// Drain the queued change notifications, oldest first.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        mem::take(&mut self.mutations)
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize a subtree back to HTML with text and attribute escaping.
    #[must_use]
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text { text } => out.push_str(&escape_text(text)),
            NodeKind::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for (attr_name, value) in attrs {
                    out.push(' ');
                    out.push_str(attr_name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }
                for child in &self.nodes[id.0].children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

fn find_body(parsed: &Html) -> Option<ElementRef<'_>> {
    parsed
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
}

fn style_hides(style: &str) -> bool {
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim().to_ascii_lowercase();
        let hidden = match property.as_str() {
            "display" => value == "none",
            "visibility" => value == "hidden",
            "opacity" => value == "0" || value == "0.0",
            _ => false,
        };
        if hidden {
            return true;
        }
    }
    false
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
