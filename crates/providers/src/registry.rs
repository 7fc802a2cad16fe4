//! Builds the generative-model adapter from config.
//!
//! Returns `None` when the model is disabled or cannot be used (no key,
//! client build failure). Callers then run on deterministic fallbacks only.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::google::GoogleProvider;
use crate::traits::{CompletionRequest, CompletionResponse, LlmProvider};
use cm_domain::config::LlmConfig;
use cm_domain::error::{Error, Result};
use cm_domain::trace::TraceEvent;

pub fn build_provider(config: &LlmConfig) -> Option<Arc<dyn LlmProvider>> {
    if !config.enabled {
        tracing::info!("generative model disabled by config");
        return None;
    }

    match GoogleProvider::from_config(config) {
        Ok(provider) if provider.has_credentials() => {
            tracing::info!(
                provider_id = provider.provider_id(),
                model = %provider.model(),
                timeout_ms = config.timeout_ms,
                "registered generative model"
            );
            let timeout = Duration::from_millis(config.timeout_ms);
            Some(Arc::new(TimeoutProvider::new(Arc::new(provider), timeout)))
        }
        Ok(_) => {
            tracing::warn!("generative model has no API key, replies use fallback templates");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to initialize generative model, skipping");
            None
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TimeoutProvider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bounds every call of the wrapped provider and records an `LlmRequest`
/// trace event for successful ones.
pub struct TimeoutProvider {
    inner: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait::async_trait]
impl LlmProvider for TimeoutProvider {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse> {
        let started = Instant::now();
        let resp = match tokio::time::timeout(self.timeout, self.inner.complete(req)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Timeout(format!(
                    "provider '{}' timed out after {}ms",
                    self.inner.provider_id(),
                    self.timeout.as_millis()
                )))
            }
        };

        TraceEvent::LlmRequest {
            provider: self.inner.provider_id().to_string(),
            model: resp.model.clone(),
            purpose: req.purpose.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
            completion_tokens: resp.usage.map(|u| u.completion_tokens),
        }
        .emit();

        Ok(resp)
    }

    fn provider_id(&self) -> &str {
        self.inner.provider_id()
    }
}
