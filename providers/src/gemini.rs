//! One-shot Gemini generateContent client.

use crate::output::{self, StructuredPayload};
use crate::{GEMINI_API_BASE_URL, http_client, prompt, read_capped_error_body};
use serde::Deserialize;
use serde_json::{Value, json};
use tonedown_types::{
    CandidateTarget, OutputContract, RewriteError, RewriteResult, Sentiment, ToneAnalysis,
    normalize,
};

// Freeform sampling mirrors the production extension; structured answers are
// parsed, so sampling stays tight.
const FREEFORM_TEMPERATURE: f64 = 0.5;
const FREEFORM_TOP_P: f64 = 0.92;
const STRUCTURED_TEMPERATURE: f64 = 0.2;

/// Client for the generateContent endpoint.
///
/// Holds the HTTP client and the base URL; everything per-attempt (version,
/// model, credential, contract) arrives as arguments so one client serves
/// every candidate target.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    base_url: String,
}

impl GenerationClient {
    /// Client against the production endpoint, using the shared hardened
    /// HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: http_client().clone(),
            base_url: GEMINI_API_BASE_URL.to_string(),
        }
    }

    /// Client with an explicit HTTP client and base URL. Mock servers in
    /// tests come through here.
    #[must_use]
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue exactly one generateContent request against `target`.
    ///
    /// No retries happen here; advancing to another candidate on a
    /// retryable failure is the orchestrator's call.
    pub async fn attempt(
        &self,
        text: &str,
        credential: &str,
        target: &CandidateTarget,
        contract: OutputContract,
    ) -> Result<RewriteResult, RewriteError> {
        let url = format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, target.version, target.model
        );
        let body = build_request_body(contract, text);

        tracing::debug!(target = %target, contract = contract.as_str(), "calling generateContent");
        let response = self
            .http
            .post(&url)
            .query(&[("key", credential)])
            .json(&body)
            .send()
            .await
            .map_err(|e| RewriteError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            return Err(RewriteError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GenerateContentResponse = response.json().await.map_err(|e| {
            RewriteError::MalformedResponse(format!("response body was not JSON: {e}"))
        })?;
        let raw = envelope.output_text().ok_or_else(|| {
            RewriteError::MalformedResponse("response did not include any output text".into())
        })?;

        match contract {
            OutputContract::Freeform => {
                let rewritten = output::unwrap_freeform(&raw);
                if rewritten.is_empty() {
                    return Err(RewriteError::EmptyOutput(
                        "output text normalized to nothing".into(),
                    ));
                }
                Ok(RewriteResult::freeform(rewritten))
            }
            OutputContract::Structured => {
                let payload = output::parse_structured(&raw)
                    .map_err(|e| RewriteError::MalformedResponse(e.to_string()))?;
                interpret_structured(payload)
            }
        }
    }
}

impl Default for GenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a parsed structured payload into a result.
///
/// `shouldRewrite` is required; a missing or blank `rewrittenText` is only an
/// error when the model asked for a rewrite. Sentiment and toxicity default
/// leniently since they are advisory.
fn interpret_structured(payload: StructuredPayload) -> Result<RewriteResult, RewriteError> {
    let Some(should_rewrite) = payload.should_rewrite else {
        return Err(RewriteError::EmptyOutput(
            "structured output omitted shouldRewrite".into(),
        ));
    };

    let analysis = ToneAnalysis {
        sentiment: payload
            .sentiment
            .as_deref()
            .map_or(Sentiment::Unknown, Sentiment::parse),
        is_toxic: payload.is_toxic.unwrap_or(false),
        should_rewrite,
    };

    let rewritten = payload.rewritten_text.unwrap_or_default();
    if should_rewrite && normalize(&rewritten).is_empty() {
        return Err(RewriteError::EmptyOutput(
            "structured output omitted rewrittenText".into(),
        ));
    }

    Ok(RewriteResult::structured(rewritten, analysis))
}

fn build_request_body(contract: OutputContract, text: &str) -> Value {
    let prompt = prompt::build(contract, text);
    let generation_config = match contract {
        OutputContract::Freeform => json!({
            "temperature": FREEFORM_TEMPERATURE,
            "topP": FREEFORM_TOP_P,
            "responseMimeType": "text/plain",
        }),
        OutputContract::Structured => json!({
            "temperature": STRUCTURED_TEMPERATURE,
            "responseMimeType": "application/json",
        }),
    };

    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": generation_config,
    })
}

// ============================================================================
// Response Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, the one field the rewrite
    /// pipeline consumes.
    fn output_text(self) -> Option<String> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }
}
