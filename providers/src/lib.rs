//! Gemini generateContent client for Tonedown.
//!
//! # Architecture
//!
//! The crate is the network edge of the rewrite pipeline:
//!
//! - [`fallback`] - ordered (API version, model) candidate plan
//! - [`gemini`] - one-shot generateContent client ([`GenerationClient`])
//! - [`output`] - post-processing of raw model text per output contract
//! - [`prompt`] - instruction blocks sent to the model
//!
//! [`GenerationClient::attempt`] issues exactly one request per call and maps
//! every failure into the [`tonedown_types::RewriteError`] taxonomy. Walking
//! the candidate list on retryable failures belongs to the orchestrator, not
//! to this crate.
//!
//! # Error Handling
//!
//! | Failure | Mapped to |
//! |---------|-----------|
//! | transport-level send failure | `RewriteError::Network` |
//! | non-2xx status | `RewriteError::Http` (body capped at 32 KiB) |
//! | body not the expected envelope | `RewriteError::MalformedResponse` |
//! | output text absent or unusable | `RewriteError::EmptyOutput` |

pub mod fallback;
pub mod gemini;
pub mod output;
pub mod prompt;

pub use gemini::GenerationClient;

pub use tonedown_types;

use std::sync::OnceLock;
use std::time::Duration;

/// Canonical Gemini API base URL. The API version segment is appended per
/// candidate target, not baked in here.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model attempted first when no preference is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Fixed fallback model identifiers, in attempt order.
pub const MODEL_CANDIDATES: [&str; 4] = [
    DEFAULT_MODEL,
    "gemini-2.5-flash-latest",
    "gemini-1.5-flash-latest",
    "gemini-1.5-flash",
];

const CONNECT_TIMEOUT_SECS: u64 = 30;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Shared hardened HTTP client for production use.
///
/// Tests and local harnesses construct [`GenerationClient`] with their own
/// `reqwest::Client` instead; this one refuses plaintext endpoints.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!(
                "Failed to build hardened HTTP client: {e}. Attempting minimal hardened fallback."
            );
            reqwest::Client::builder()
                .https_only(true)
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Minimal hardened HTTP client must build; cannot proceed without TLS")
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .https_only(true)
}

/// Read a failed response's body for error reporting, capped so a hostile or
/// misconfigured endpoint cannot balloon memory.
pub(crate) async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}
