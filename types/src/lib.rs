//! Core domain types for Tonedown.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod text;
pub use text::{EmptyTextError, NormalizedText, normalize};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Settings Keys
// ============================================================================

/// Name of the credential setting: settings-store key, environment variable,
/// and the name surfaced in configuration errors.
pub const API_KEY_SETTING: &str = "GEMINI_API_KEY";

/// Name of the preferred-model override setting.
pub const MODEL_SETTING: &str = "GEMINI_MODEL";

// ============================================================================
// Output Contracts
// ============================================================================

/// Shape of the output expected back from the model.
///
/// `Freeform` is plain prose that gets unwrapped (fences, quotes) before use.
/// `Structured` is a single JSON object carrying a tone analysis alongside the
/// rewritten text. Both flow through the same orchestrator; only the prompt
/// and the post-processing differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputContract {
    #[default]
    Freeform,
    Structured,
}

impl OutputContract {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Freeform => "freeform",
            Self::Structured => "structured",
        }
    }
}

// ============================================================================
// Rewrite Results
// ============================================================================

/// Overall sentiment reported by the structured contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
    /// Anything the model reported that is not one of the known labels.
    Unknown,
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

impl Sentiment {
    /// Lenient parse for model-produced labels ("Negative", " NEUTRAL ", ...).
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("negative") {
            Self::Negative
        } else if raw.eq_ignore_ascii_case("neutral") {
            Self::Neutral
        } else if raw.eq_ignore_ascii_case("positive") {
            Self::Positive
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::Unknown => "unknown",
        }
    }
}

/// Tone analysis fields carried by the structured contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneAnalysis {
    pub sentiment: Sentiment,
    pub is_toxic: bool,
    pub should_rewrite: bool,
}

/// Outcome of one rewrite: the replacement text plus, for the structured
/// contract, the analysis that produced it.
///
/// Invariant: when `analysis.should_rewrite` is false, `rewritten_text` is the
/// caller's original input verbatim. The orchestrator enforces this on every
/// path that returns a result, cache hits included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteResult {
    pub rewritten_text: String,
    #[serde(flatten)]
    pub analysis: Option<ToneAnalysis>,
}

impl RewriteResult {
    /// A plain freeform rewrite with no analysis attached.
    #[must_use]
    pub fn freeform(rewritten_text: impl Into<String>) -> Self {
        Self {
            rewritten_text: rewritten_text.into(),
            analysis: None,
        }
    }

    /// A structured rewrite carrying its tone analysis.
    #[must_use]
    pub fn structured(rewritten_text: impl Into<String>, analysis: ToneAnalysis) -> Self {
        Self {
            rewritten_text: rewritten_text.into(),
            analysis: Some(analysis),
        }
    }

    /// Whether the text was actually changed by the model.
    ///
    /// Freeform results always rewrite; structured results defer to the flag.
    #[must_use]
    pub fn should_rewrite(&self) -> bool {
        self.analysis.is_none_or(|analysis| analysis.should_rewrite)
    }
}

// ============================================================================
// Candidate Targets
// ============================================================================

/// Gemini REST API version token, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    V1Beta,
    V1,
}

impl ApiVersion {
    /// Versions in the order they are attempted. Every model is tried on
    /// `v1beta` before any model is tried on `v1`.
    pub const PRIORITY: [Self; 2] = [Self::V1Beta, Self::V1];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1Beta => "v1beta",
            Self::V1 => "v1",
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (API version, model identifier) pair to attempt against the endpoint.
///
/// Constructed transiently by the fallback resolver; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTarget {
    pub version: ApiVersion,
    pub model: String,
}

impl CandidateTarget {
    pub fn new(version: ApiVersion, model: impl Into<String>) -> Self {
        Self {
            version,
            model: model.into(),
        }
    }
}

impl std::fmt::Display for CandidateTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/models/{}", self.version, self.model)
    }
}

// ============================================================================
// Error Taxonomy
// ============================================================================

/// Everything that can go wrong between "rewrite this text" and an answer.
///
/// Messages are user-facing: the service boundary surfaces `Display` output
/// directly, so each variant reads as a sentence rather than a debug dump.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// Input collapsed to nothing under normalization. Raised before the
    /// cache or the network is touched.
    #[error("No text selected.")]
    EmptyInput,

    /// No credential configured. Raised before any network call.
    #[error("Gemini API key is missing. Set {setting} in the options or environment.")]
    MissingCredential { setting: &'static str },

    /// Transport-level failure: the endpoint was never reached.
    #[error("Gemini request could not be sent: {0}")]
    Network(String),

    /// Endpoint reachable but returned a non-success status.
    #[error("Gemini request failed ({status}): {body}")]
    Http { status: u16, body: String },

    /// Success status but the body was not the expected envelope, or the
    /// declared JSON output could not be parsed.
    #[error("Gemini response could not be interpreted: {0}")]
    MalformedResponse(String),

    /// The model answered, but with nothing usable: output that normalizes
    /// to nothing, or declared JSON output missing a required field.
    #[error("Gemini returned an empty rewrite: {0}")]
    EmptyOutput(String),

    /// Every candidate target was exhausted without a recorded error.
    #[error("No supported Gemini model endpoint available.")]
    NoEndpoint,
}

impl RewriteError {
    /// Whether this failure means "this model/version pair is unavailable"
    /// rather than "the request itself is broken".
    ///
    /// A 404 status is retryable outright. Beyond that, the rendered message
    /// is checked for a NOT_FOUND status token or a model-path mention, which
    /// is how the endpoint words unknown-model rejections regardless of
    /// status code. Everything else aborts the fallback loop.
    #[must_use]
    pub fn is_retryable_model_error(&self) -> bool {
        if let Self::Http { status: 404, .. } = self {
            return true;
        }
        let message = self.to_string().to_lowercase();
        message.contains("not_found") || message.contains("models/")
    }
}
