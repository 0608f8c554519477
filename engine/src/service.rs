//! The rewrite service: one public operation, "rewrite this text".
//!
//! Each call walks `normalize -> cache check -> credential check -> candidate
//! loop -> cache insert`. The candidate loop tries targets strictly in
//! resolver order and advances only on retryable (unknown-model) failures;
//! anything else aborts. Concurrent calls for the same normalized key join
//! one shared in-flight future, so identical text never races the network.

use crate::cache::ResponseCache;
use async_trait::async_trait;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tonedown_providers::{GenerationClient, fallback};
use tonedown_types::{
    API_KEY_SETTING, NormalizedText, OutputContract, RewriteError, RewriteResult,
};

type PendingRewrite = Shared<BoxFuture<'static, Result<RewriteResult, RewriteError>>>;

/// Seam for anything that triggers rewrites (the scan engine, the selection
/// overlay). Lets tests count invocations with a stub instead of a server.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(
        &self,
        text: &str,
        contract: OutputContract,
    ) -> Result<RewriteResult, RewriteError>;
}

/// Orchestrator owning the response cache and the in-flight request map.
///
/// Constructed explicitly and injected; there is no global instance. A
/// missing credential is not a construction error because cache hits are
/// served without one.
pub struct RewriteService {
    client: GenerationClient,
    api_key: Option<String>,
    preferred_model: Option<String>,
    cache: Arc<Mutex<ResponseCache>>,
    inflight: Arc<Mutex<HashMap<String, PendingRewrite>>>,
}

impl RewriteService {
    #[must_use]
    pub fn new(
        client: GenerationClient,
        api_key: Option<String>,
        preferred_model: Option<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            preferred_model,
            cache: Arc::new(Mutex::new(ResponseCache::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Replace the default cache, mainly to shrink capacity in tests.
    #[must_use]
    pub fn with_cache(self, cache: ResponseCache) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
            ..self
        }
    }

    /// Rewrite under the freeform contract.
    pub async fn rewrite(&self, text: &str) -> Result<RewriteResult, RewriteError> {
        self.rewrite_with(text, OutputContract::Freeform).await
    }

    /// Analyze and conditionally rewrite under the structured contract.
    pub async fn analyze(&self, text: &str) -> Result<RewriteResult, RewriteError> {
        self.rewrite_with(text, OutputContract::Structured).await
    }

    /// The one state machine behind both public operations.
    pub async fn rewrite_with(
        &self,
        text: &str,
        contract: OutputContract,
    ) -> Result<RewriteResult, RewriteError> {
        let normalized = NormalizedText::new(text).map_err(|_| RewriteError::EmptyInput)?;
        let key = service_key(contract, &normalized);

        if let Some(hit) = self.cache.lock().await.lookup(&key) {
            tracing::debug!(contract = contract.as_str(), "serving cached rewrite");
            return Ok(restore_unchanged_input(hit, text));
        }

        // Cache hits above work without a credential; everything past this
        // point needs one.
        let Some(api_key) = self.api_key.clone() else {
            return Err(RewriteError::MissingCredential {
                setting: API_KEY_SETTING,
            });
        };

        let pending = {
            let mut inflight = self.inflight.lock().await;
            if let Some(shared) = inflight.get(&key) {
                tracing::debug!(contract = contract.as_str(), "joining in-flight rewrite");
                shared.clone()
            } else {
                let shared = self
                    .build_call(key.clone(), normalized.into_inner(), contract, api_key)
                    .boxed()
                    .shared();
                inflight.insert(key, shared.clone());
                shared
            }
        };

        let result = pending.await?;
        Ok(restore_unchanged_input(result, text))
    }

    /// Build the owned future for one cache miss. Exactly one of these runs
    /// per key at a time; it inserts into the cache on success and always
    /// clears its in-flight slot.
    fn build_call(
        &self,
        key: String,
        normalized: String,
        contract: OutputContract,
        api_key: String,
    ) -> impl Future<Output = Result<RewriteResult, RewriteError>> + Send + 'static {
        let client = self.client.clone();
        let preferred = self.preferred_model.clone();
        let cache = Arc::clone(&self.cache);
        let inflight = Arc::clone(&self.inflight);
        async move {
            let outcome =
                call_with_fallback(&client, &normalized, &api_key, preferred.as_deref(), contract)
                    .await;
            if let Ok(result) = &outcome {
                cache.lock().await.insert(key.clone(), result.clone());
            }
            inflight.lock().await.remove(&key);
            outcome
        }
    }
}

#[async_trait]
impl Rewriter for RewriteService {
    async fn rewrite(
        &self,
        text: &str,
        contract: OutputContract,
    ) -> Result<RewriteResult, RewriteError> {
        self.rewrite_with(text, contract).await
    }
}

/// Freeform and structured results for the same text never share an entry.
fn service_key(contract: OutputContract, normalized: &NormalizedText) -> String {
    format!("{}:{}", contract.as_str(), normalized.as_str())
}

/// Enforce the structured-contract invariant: a result that declined to
/// rewrite carries this caller's input verbatim, whatever the model (or the
/// cache, for a differently-spaced equivalent input) returned.
fn restore_unchanged_input(mut result: RewriteResult, original: &str) -> RewriteResult {
    if !result.should_rewrite() {
        result.rewritten_text = original.to_string();
    }
    result
}

/// Walk the candidate list, advancing only past unknown-model failures.
async fn call_with_fallback(
    client: &GenerationClient,
    text: &str,
    api_key: &str,
    preferred: Option<&str>,
    contract: OutputContract,
) -> Result<RewriteResult, RewriteError> {
    let mut last_error: Option<RewriteError> = None;
    for target in fallback::candidate_targets(preferred) {
        match client.attempt(text, api_key, &target, contract).await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_retryable_model_error() => {
                tracing::debug!(target = %target, error = %err, "candidate unavailable, advancing");
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_error.unwrap_or(RewriteError::NoEndpoint))
}
