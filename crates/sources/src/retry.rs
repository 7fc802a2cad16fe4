//! Retry-then-default combinator shared by every data-source call.

use std::future::Future;
use std::time::{Duration, Instant};

use cm_domain::config::SourcesConfig;
use cm_domain::error::{Error, Result};
use cm_domain::trace::TraceEvent;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub max_retries: u32,
    /// Bound on each individual attempt.
    pub timeout: Duration,
    /// Base delay; doubles after every failed attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            timeout: Duration::from_secs(5),
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &SourcesConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            timeout: Duration::from_millis(cfg.timeout_ms),
            backoff: Duration::from_millis(cfg.backoff_ms),
        }
    }

    /// Run `call` until it succeeds, fails permanently, or the retry budget
    /// is spent.
    ///
    /// * Retries transient errors ([`Error::is_transient`]), including an
    ///   attempt exceeding `timeout`.
    /// * Does **not** retry missing credentials or 4xx responses.
    /// * Emits a `TraceEvent::SourceCall` after every attempt.
    pub async fn run<T, F, Fut>(&self, source: &str, variant: &str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.backoff * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let result = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(format!(
                    "{source} {variant} exceeded {}ms",
                    self.timeout.as_millis()
                ))),
            };

            TraceEvent::SourceCall {
                source: source.to_owned(),
                variant: variant.to_owned(),
                attempt: attempt + 1,
                ok: result.is_ok(),
                duration_ms: start.elapsed().as_millis() as u64,
            }
            .emit();

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    tracing::debug!(source, variant, attempt, error = %e, "transient source failure");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::Other(format!("{source} {variant}: all retries exhausted"))))
    }

    /// Like [`run`](Self::run), but any final failure resolves to `default`.
    pub async fn run_or_default<T, F, Fut>(
        &self,
        source: &str,
        variant: &str,
        default: T,
        call: F,
    ) -> T
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.run(source, variant, call).await {
            Ok(value) => value,
            Err(e) => {
                let attempts = if e.is_transient() { self.max_retries + 1 } else { 1 };
                tracing::warn!(source, variant, attempts, error = %e, "source unavailable, using empty result");
                TraceEvent::SourceGaveUp {
                    source: source.to_owned(),
                    variant: variant.to_owned(),
                    attempts,
                    reason: e.to_string(),
                }
                .emit();
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            timeout: Duration::from_millis(200),
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let out = fast()
            .run("tmdb", "search", || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Http("connection reset".into()))
                } else {
                    Ok(vec![1, 2])
                }
            })
            .await
            .unwrap();
        assert_eq!(out, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_is_first_attempt_plus_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let out: Vec<u8> = fast()
            .run_or_default("rawg", "search", Vec::new(), || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::Timeout("slow".into()))
            })
            .await;
        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_credentials_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let out: Vec<u8> = fast()
            .run_or_default("serper", "search", Vec::new(), || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::Auth("SERPER_API_KEY not set".into()))
            })
            .await;
        assert!(out.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_attempt_counts_as_timeout() {
        let policy = RetryPolicy {
            max_retries: 0,
            timeout: Duration::from_millis(20),
            backoff: Duration::from_millis(1),
        };
        let err = policy
            .run("tmdb", "trending", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy {
            max_retries: 0,
            ..fast()
        };
        let out = policy
            .run_or_default("tmdb", "people", 7, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::Http("refused".into()))
            })
            .await;
        assert_eq!(out, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
