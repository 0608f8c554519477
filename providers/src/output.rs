//! Post-processing of raw model text.
//!
//! Models wrap answers in code fences or quotation marks even when told not
//! to, and structured answers sometimes arrive with prose around the JSON
//! object. Both recoveries are deterministic: the freeform unwrap strips one
//! known layer at a time, and the structured parse is a strict pass followed
//! by a single brace-delimited extraction.

use serde::Deserialize;
use thiserror::Error;

/// Unwrap freeform model output.
///
/// Strips, in order: surrounding whitespace, a leading code-fence marker with
/// its optional language tag, a trailing fence, one layer of matching
/// quotation marks (straight or curly), carriage returns, and surrounding
/// whitespace again. One layer only; intentional inner quotes survive.
#[must_use]
pub fn unwrap_freeform(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = strip_trailing_fence(strip_leading_fence(trimmed)).trim();
    let unquoted = strip_quote_layer(unfenced);
    let cleaned = unquoted.replace('\r', "");
    cleaned.trim().to_string()
}

fn strip_leading_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest =
        rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    rest.strip_prefix('\n').unwrap_or(rest)
}

fn strip_trailing_fence(text: &str) -> &str {
    let Some(rest) = text.strip_suffix("```") else {
        return text;
    };
    rest.strip_suffix('\n').unwrap_or(rest)
}

const QUOTE_PAIRS: [(char, char); 4] = [
    ('"', '"'),
    ('\'', '\''),
    ('\u{201c}', '\u{201d}'),
    ('\u{2018}', '\u{2019}'),
];

fn strip_quote_layer(text: &str) -> &str {
    for (open, close) in QUOTE_PAIRS {
        if text.len() >= open.len_utf8() + close.len_utf8()
            && text.starts_with(open)
            && text.ends_with(close)
        {
            return &text[open.len_utf8()..text.len() - close.len_utf8()];
        }
    }
    text
}

/// Structured-contract payload as the model produced it, before the fields
/// are validated. `toxicity` is accepted as a spelling of `isToxic`.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredPayload {
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default, alias = "toxicity")]
    pub is_toxic: Option<bool>,
    #[serde(default)]
    pub should_rewrite: Option<bool>,
    #[serde(default)]
    pub rewritten_text: Option<String>,
}

/// Why structured output could not be recovered from raw model text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuredParseError {
    #[error("output was not a JSON object: {0}")]
    NotJson(String),
    #[error("output contained no JSON object")]
    NoObject,
}

/// Two-stage structured parse: strict, then brace-delimited extraction.
pub fn parse_structured(raw: &str) -> Result<StructuredPayload, StructuredParseError> {
    let trimmed = raw.trim();
    match serde_json::from_str(trimmed) {
        Ok(payload) => Ok(payload),
        Err(strict_err) => {
            let Some(slice) = brace_delimited(trimmed) else {
                return Err(if trimmed.contains('{') || trimmed.contains('}') {
                    StructuredParseError::NotJson(strict_err.to_string())
                } else {
                    StructuredParseError::NoObject
                });
            };
            serde_json::from_str(slice)
                .map_err(|e| StructuredParseError::NotJson(e.to_string()))
        }
    }
}

/// The first brace-delimited slice: first `{` through the last `}`.
fn brace_delimited(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
