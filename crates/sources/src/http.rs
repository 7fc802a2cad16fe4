//! Plumbing shared by the HTTP-backed sources.

use std::time::Duration;

use cm_domain::config::{EndpointConfig, SourcesConfig};
use cm_domain::error::{Error, Result};
use cm_providers::util::{from_reqwest, resolve_api_key, status_error};
use serde_json::Value;

/// Base URL, optional key and a client with the configured timeout.
pub(crate) struct Endpoint {
    pub source: &'static str,
    pub base_url: String,
    api_key: Option<String>,
    pub client: reqwest::Client,
}

impl Endpoint {
    pub fn new(source: &'static str, endpoint: &EndpointConfig, cfg: &SourcesConfig) -> Result<Self> {
        let api_key = match resolve_api_key(&endpoint.auth) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(source, error = %e, "source API key unavailable, it will return nothing");
                None
            }
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;
        Ok(Self {
            source,
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    /// The API key, or a permanent `Auth` error when none was configured.
    pub fn key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Auth(format!("{} API key not configured", self.source)))
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send, check the status and parse the body as JSON.
    pub async fn send_json(&self, rb: reqwest::RequestBuilder) -> Result<Value> {
        let resp = rb.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let body = resp.text().await.map_err(from_reqwest)?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{}: {}", self.source, status)));
        }
        if !status.is_success() {
            return Err(status_error(self.source, status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

// ── JSON field helpers ──────────────────────────────────────────────

pub(crate) fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|s| s.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub(crate) fn f64_field(v: &Value, key: &str) -> f64 {
    v.get(key).and_then(|n| n.as_f64()).unwrap_or(0.0)
}

pub(crate) fn results<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.get(key)
        .and_then(|r| r.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default()
}
