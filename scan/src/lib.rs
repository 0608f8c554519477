//! Live-document scanning for Tonedown.
//!
//! Models the page side of the system: a mutable HTML document with a change
//! feed, candidate discovery over it, a scan engine that rewrites qualifying
//! regions in place, and the selection overlay for user-driven rewrites.

pub mod candidates;
pub mod dom;
pub mod engine;
pub mod selection;

pub use dom::{LiveDocument, Mutation, NodeId};
pub use engine::ScanEngine;
pub use selection::{Feedback, SelectionOverlay};
