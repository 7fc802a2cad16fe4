//! Google Gemini adapter.
//!
//! Implements the Gemini `generateContent` API. Auth is via an API key passed
//! as a query parameter (`key={api_key}`).

use std::time::Duration;

use crate::traits::{CompletionRequest, CompletionResponse, LlmProvider, Usage};
use crate::util::{from_reqwest, resolve_api_key, status_error};
use cm_domain::config::LlmConfig;
use cm_domain::error::{Error, Result};
use serde_json::Value;

const PROVIDER_ID: &str = "gemini";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct GoogleProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GoogleProvider {
    /// Create a provider from config. A missing key is not fatal here:
    /// every call then fails with [`Error::Auth`] and callers fall back.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = match resolve_api_key(&cfg.auth) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(error = %e, "gemini API key unavailable");
                None
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
            client,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        )
    }
}

fn build_body(req: &CompletionRequest) -> Value {
    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{"text": req.prompt}],
        }],
    });

    let g = &req.generation;
    let mut gen_config = serde_json::json!({});
    if let Some(temp) = g.temperature {
        gen_config["temperature"] = serde_json::json!(temp);
    }
    if let Some(top_k) = g.top_k {
        gen_config["topK"] = serde_json::json!(top_k);
    }
    if let Some(top_p) = g.top_p {
        gen_config["topP"] = serde_json::json!(top_p);
    }
    if let Some(max) = g.max_output_tokens {
        gen_config["maxOutputTokens"] = serde_json::json!(max);
    }
    if req.json_mode {
        gen_config["responseMimeType"] = serde_json::json!("application/json");
    }
    if gen_config.as_object().is_some_and(|o| !o.is_empty()) {
        body["generationConfig"] = gen_config;
    }

    body
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_gemini_response(body: &Value, model: &str) -> Result<CompletionResponse> {
    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .ok_or_else(|| Error::Provider {
            provider: PROVIDER_ID.into(),
            message: "no candidates in response".into(),
        })?;

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|v| v.as_str()))
                .collect()
        })
        .unwrap_or_default();

    let finish_reason = candidate
        .get("finishReason")
        .and_then(|v| v.as_str())
        .map(|s| match s {
            "STOP" => "stop".to_string(),
            "MAX_TOKENS" => "length".to_string(),
            other => other.to_lowercase(),
        });

    if text.trim().is_empty() {
        return Err(Error::Provider {
            provider: PROVIDER_ID.into(),
            message: format!(
                "empty candidate (finish reason: {})",
                finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    let usage = body.get("usageMetadata").and_then(parse_gemini_usage);

    Ok(CompletionResponse {
        text,
        model: model.to_string(),
        usage,
        finish_reason,
    })
}

fn parse_gemini_usage(v: &Value) -> Option<Usage> {
    let prompt = v.get("promptTokenCount")?.as_u64()? as u32;
    let completion = v
        .get("candidatesTokenCount")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    Some(Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
    })
}

/// Redact API key from URL for safe logging.
fn redact_url_key(url: &str) -> String {
    if let Some(idx) = url.find("key=") {
        let prefix = &url[..idx + 4];
        let rest = &url[idx + 4..];
        let end = rest.find('&').unwrap_or(rest.len());
        format!("{prefix}[REDACTED]{}", &rest[end..])
    } else {
        url.to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for GoogleProvider {
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Auth("gemini API key not configured".into()))?;
        let url = self.generate_url(api_key);
        let body = build_body(req);

        tracing::debug!(
            provider = PROVIDER_ID,
            purpose = req.purpose,
            url = %redact_url_key(&url),
            "gemini generate request"
        );

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(status_error(PROVIDER_ID, status, &resp_text));
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_gemini_response(&resp_json, &self.model)
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::GenerationConfig;
    use cm_domain::config::AuthConfig;

    fn request() -> CompletionRequest {
        CompletionRequest {
            prompt: "hello".into(),
            generation: GenerationConfig {
                temperature: Some(0.8),
                top_k: Some(40),
                top_p: Some(0.95),
                max_output_tokens: Some(300),
            },
            json_mode: false,
            purpose: "reply",
        }
    }

    #[test]
    fn body_carries_generation_config() {
        let body = build_body(&request());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        let g = &body["generationConfig"];
        assert_eq!(g["topK"], 40);
        assert_eq!(g["maxOutputTokens"], 300);
        assert!(g.get("responseMimeType").is_none());
    }

    #[test]
    fn body_omits_empty_generation_config() {
        let req = CompletionRequest {
            prompt: "x".into(),
            ..Default::default()
        };
        assert!(build_body(&req).get("generationConfig").is_none());
    }

    #[test]
    fn json_mode_sets_mime_type() {
        let mut req = request();
        req.json_mode = true;
        let body = build_body(&req);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn parses_text_and_usage() {
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Arre "}, {"text": "yaar!"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
        });
        let resp = parse_gemini_response(&body, "gemini-1.5-flash").unwrap();
        assert_eq!(resp.text, "Arre yaar!");
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
        assert_eq!(resp.usage.unwrap().prompt_tokens, 12);
    }

    #[test]
    fn no_candidates_is_an_error() {
        let body = serde_json::json!({"candidates": []});
        let err = parse_gemini_response(&body, "m").unwrap_err();
        assert!(err.to_string().contains("no candidates"));
    }

    #[test]
    fn blank_candidate_is_an_error() {
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": []}, "finishReason": "SAFETY"}]
        });
        let err = parse_gemini_response(&body, "m").unwrap_err();
        assert!(err.to_string().contains("safety"));
    }

    #[test]
    fn redacts_key_in_url() {
        assert_eq!(
            redact_url_key("https://x/v1beta/models/m:generateContent?key=abc&alt=sse"),
            "https://x/v1beta/models/m:generateContent?key=[REDACTED]&alt=sse"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let cfg = LlmConfig {
            auth: AuthConfig {
                env: Some("CM_TEST_GEMINI_KEY_NEVER_SET".into()),
                key: None,
            },
            base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        let provider = GoogleProvider::from_config(&cfg).unwrap();
        assert!(!provider.has_credentials());
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    async fn fake_gemini(status: u16, body: Value) -> String {
        use axum::http::StatusCode;
        use axum::Json;

        let app = axum::Router::new().fallback(move || {
            let body = body.clone();
            async move { (StatusCode::from_u16(status).unwrap(), Json(body)) }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn provider_for(base_url: String) -> GoogleProvider {
        GoogleProvider::from_config(&LlmConfig {
            base_url,
            auth: AuthConfig {
                key: Some("test-key".into()),
                env: None,
            },
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn complete_returns_candidate_text() {
        let base = fake_gemini(
            200,
            serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Must watch yaar!"}]}}]
            }),
        )
        .await;
        let resp = provider_for(base).complete(&request()).await.unwrap();
        assert_eq!(resp.text, "Must watch yaar!");
        assert_eq!(resp.model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn server_error_is_transient_provider_error() {
        let base = fake_gemini(503, serde_json::json!({"error": "overloaded"})).await;
        let err = provider_for(base).complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 503"));
        assert!(err.is_transient());
    }
}
