mod llm;
mod observability;
mod pipeline;
mod server;
mod sources;
mod storage;

pub use llm::*;
pub use observability::*;
pub use pipeline::*;
pub use server::*;
pub use sources::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Missing API keys are
    /// warnings: the affected adapter simply degrades to empty results.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(error(
                "server.max_concurrent_requests",
                "must allow at least one request",
            ));
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        if self.llm.enabled {
            if self.llm.base_url.is_empty() {
                errors.push(error("llm.base_url", "base_url must not be empty"));
            }
            if self.llm.model.is_empty() {
                errors.push(error("llm.model", "model must not be empty"));
            }
            if !has_credential(&self.llm.auth) {
                errors.push(warning(
                    "llm.auth",
                    "no API key available; replies will use fallback templates",
                ));
            }
        }
        if self.llm.timeout_ms == 0 {
            errors.push(error("llm.timeout_ms", "timeout must be greater than 0"));
        }

        if self.sources.timeout_ms == 0 {
            errors.push(error("sources.timeout_ms", "timeout must be greater than 0"));
        }
        for (name, endpoint) in [
            ("tmdb", &self.sources.tmdb),
            ("rawg", &self.sources.rawg),
            ("serper", &self.sources.serper),
        ] {
            if endpoint.base_url.is_empty() {
                errors.push(error(
                    &format!("sources.{name}.base_url"),
                    "base_url must not be empty",
                ));
            }
            if !has_credential(&endpoint.auth) {
                errors.push(warning(
                    &format!("sources.{name}.auth"),
                    "no API key available; this source will always return nothing",
                ));
            }
        }

        if self.pipeline.history_turns == 0 {
            errors.push(error(
                "pipeline.history_turns",
                "history window must hold at least one turn",
            ));
        }
        if self.pipeline.title_chars == 0 {
            errors.push(error("pipeline.title_chars", "must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(error(
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            ));
        }

        errors
    }
}

fn has_credential(auth: &AuthConfig) -> bool {
    if auth.key.as_deref().is_some_and(|k| !k.is_empty()) {
        return true;
    }
    auth.env
        .as_deref()
        .and_then(|var| std::env::var(var).ok())
        .is_some_and(|v| !v.is_empty())
}

fn error(field: &str, message: &str) -> ConfigError {
    ConfigError {
        severity: ConfigSeverity::Error,
        field: field.into(),
        message: message.into(),
    }
}

fn warning(field: &str, message: &str) -> ConfigError {
    ConfigError {
        severity: ConfigSeverity::Warning,
        field: field.into(),
        message: message.into(),
    }
}
