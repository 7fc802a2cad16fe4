//! Shared helpers for HTTP adapters.

use cm_domain::config::AuthConfig;
use cm_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Build the domain error for a non-2xx response.
pub fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> Error {
    Error::Provider {
        provider: provider.to_string(),
        message: format!("HTTP {} - {}", status.as_u16(), truncate(body, 300)),
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `env` field (reads environment variable)
/// 3. Error
///
/// Empty values count as missing.
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(key) = auth.key.as_deref().filter(|k| !k.is_empty()) {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; prefer 'env' instead"
        );
        return Ok(key.to_string());
    }

    if let Some(ref env_var) = auth.env {
        return match std::env::var(env_var) {
            Ok(v) if !v.is_empty() => Ok(v),
            _ => Err(Error::Auth(format!(
                "environment variable '{env_var}' not set or empty"
            ))),
        };
    }

    Err(Error::Auth(
        "no API key configured: set 'key' or 'env' in auth".into(),
    ))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_api_key_plaintext() {
        let auth = AuthConfig {
            key: Some("sk-test-123".into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "sk-test-123");
    }

    #[test]
    fn resolve_api_key_env_var() {
        let var_name = "CM_TEST_RESOLVE_ENV_KEY_1234";
        std::env::set_var(var_name, "env-secret-value");
        let auth = AuthConfig {
            env: Some(var_name.into()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "env-secret-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_env_var_missing() {
        let auth = AuthConfig {
            env: Some("CM_TEST_NONEXISTENT_VAR_8888".into()),
            ..Default::default()
        };
        let err = resolve_api_key(&auth).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(err.to_string().contains("CM_TEST_NONEXISTENT_VAR_8888"));
    }

    #[test]
    fn resolve_api_key_empty_key_falls_through_to_env() {
        let var_name = "CM_TEST_EMPTY_KEY_FALLTHROUGH_4321";
        std::env::set_var(var_name, "from-env");
        let auth = AuthConfig {
            key: Some(String::new()),
            env: Some(var_name.into()),
        };
        assert_eq!(resolve_api_key(&auth).unwrap(), "from-env");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_no_config() {
        let err = resolve_api_key(&AuthConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no API key configured"));
    }

    #[test]
    fn status_error_is_transient_only_for_server_side() {
        let e = status_error("tmdb", reqwest::StatusCode::BAD_GATEWAY, "upstream");
        assert!(e.is_transient());
        let e = status_error("tmdb", reqwest::StatusCode::UNAUTHORIZED, "bad key");
        assert!(!e.is_transient());
        assert!(e.to_string().contains("HTTP 401"));
    }
}
