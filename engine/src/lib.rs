//! Core engine for Tonedown - rewrite orchestration.
//!
//! This crate owns everything between a rewrite trigger and the provider
//! call: response caching, request de-duplication, model fallback, and the
//! message envelope used by frontends.

pub mod cache;
pub mod messages;
pub mod service;

pub use cache::{DEFAULT_CACHE_CAPACITY, ResponseCache};
pub use messages::{Request, Response, dispatch};
pub use service::{RewriteService, Rewriter};

// Re-export from crates for public API
pub use tonedown_providers::{self, GenerationClient};
pub use tonedown_types::{
    self, OutputContract, RewriteError, RewriteResult, Sentiment, ToneAnalysis,
};
