//! Whitespace normalization, the canonical key/comparison form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Collapse every whitespace run to a single space and trim the ends.
///
/// This is the one canonical form used for cache keys and for deciding
/// whether two pieces of page text are "the same". Idempotent.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A non-empty, already-normalized string.
///
/// Construction runs [`normalize`] and rejects input that collapses to
/// nothing, so a value of this type is always a valid cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedText(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("text is empty after whitespace normalization")]
pub struct EmptyTextError;

impl NormalizedText {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EmptyTextError> {
        let collapsed = normalize(raw.as_ref());
        if collapsed.is_empty() {
            Err(EmptyTextError)
        } else {
            Ok(Self(collapsed))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NormalizedText {
    type Error = EmptyTextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NormalizedText {
    type Error = EmptyTextError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NormalizedText> for String {
    fn from(value: NormalizedText) -> Self {
        value.0
    }
}

impl std::ops::Deref for NormalizedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
