use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generative model (Gemini)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// When false, every reply comes from the fallback templates and
    /// automatic mode detection uses keywords only.
    #[serde(default = "d_true")]
    pub enabled: bool,
    #[serde(default = "d_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Hard bound on a single model call, including connect time.
    #[serde(default = "d_8000u")]
    pub timeout_ms: u64,
    #[serde(default = "d_gemini_auth")]
    pub auth: AuthConfig,
    /// Sampling parameters for reply generation.
    #[serde(default)]
    pub generation: GenerationDefaults,
    /// Sampling parameters for model-assisted classification.
    #[serde(default = "d_classification")]
    pub classification: GenerationDefaults,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: d_gemini_base_url(),
            model: d_model(),
            timeout_ms: 8_000,
            auth: d_gemini_auth(),
            generation: GenerationDefaults::default(),
            classification: d_classification(),
        }
    }
}

/// Sampling knobs forwarded to the model as its generation config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: Some(0.8),
            top_k: Some(40),
            top_p: Some(0.95),
            max_output_tokens: Some(300),
        }
    }
}

/// Where to find an API key. A direct `key` wins over `env`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env).
    #[serde(default)]
    pub key: Option<String>,
}

impl AuthConfig {
    pub fn from_env(var: &str) -> Self {
        Self {
            env: Some(var.into()),
            key: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_true() -> bool {
    true
}
fn d_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn d_model() -> String {
    "gemini-1.5-flash".into()
}
fn d_8000u() -> u64 {
    8_000
}
fn d_gemini_auth() -> AuthConfig {
    AuthConfig::from_env("GEMINI_API_KEY")
}
fn d_classification() -> GenerationDefaults {
    GenerationDefaults {
        temperature: Some(0.1),
        top_k: None,
        top_p: None,
        max_output_tokens: Some(200),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_config_defaults_target_gemini_flash() {
        let cfg = LlmConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.model, "gemini-1.5-flash");
        assert_eq!(cfg.auth.env.as_deref(), Some("GEMINI_API_KEY"));
        assert_eq!(cfg.generation.max_output_tokens, Some(300));
        assert_eq!(cfg.classification.temperature, Some(0.1));
    }

    #[test]
    fn partial_generation_table_keeps_other_knobs_unset() {
        let toml_str = r#"
            [generation]
            temperature = 0.3
        "#;
        let cfg: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.generation.temperature, Some(0.3));
        assert_eq!(cfg.generation.top_k, None);
    }

    #[test]
    fn auth_key_deserializes() {
        let toml_str = r#"
            [auth]
            key = "direct-key"
        "#;
        let cfg: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.auth.key.as_deref(), Some("direct-key"));
        assert!(cfg.auth.env.is_none());
    }
}
