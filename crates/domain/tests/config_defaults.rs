use cm_domain::config::{Config, ConfigSeverity, StorageBackend};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn empty_file_is_a_complete_config() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.server.port, 3210);
    assert_eq!(config.llm.model, "gemini-1.5-flash");
    assert_eq!(config.sources.timeout_ms, 5_000);
    assert_eq!(config.pipeline.display.movies, 6);
    assert_eq!(config.pipeline.display.people, 5);
    assert_eq!(config.pipeline.display.games, 6);
    assert_eq!(config.pipeline.display.search_hits, 5);
    assert_eq!(config.storage.backend, StorageBackend::Memory);
}

#[test]
fn cors_config_parses_custom_origins() {
    let toml_str = r#"
[server.cors]
allowed_origins = ["https://myapp.com", "http://localhost:3000"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.cors.allowed_origins.len(), 2);
    assert!(config.server.cors.allowed_origins.contains(&"https://myapp.com".to_string()));
}

#[test]
fn file_storage_parses() {
    let toml_str = r#"
[storage]
backend = "file"
state_path = "/var/lib/chatmux"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.storage.backend, StorageBackend::File);
    assert_eq!(config.storage.state_path.to_str(), Some("/var/lib/chatmux"));
}

#[test]
fn sources_section_overrides_retry_budget() {
    let toml_str = r#"
[sources]
max_retries = 0
timeout_ms = 1500

[sources.limits]
games = 3
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.sources.max_retries, 0);
    assert_eq!(config.sources.timeout_ms, 1500);
    assert_eq!(config.sources.limits.games, 3);
    assert_eq!(config.sources.limits.movie_search, 8);
}

#[test]
fn validate_rejects_zero_port() {
    let mut config = Config::default();
    config.server.port = 0;
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|e| e.field == "server.port" && e.severity == ConfigSeverity::Error));
}

#[test]
fn validate_rejects_out_of_range_sample_rate() {
    let mut config = Config::default();
    config.observability.sample_rate = 1.5;
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|e| e.field == "observability.sample_rate" && e.severity == ConfigSeverity::Error));
}

#[test]
fn inline_keys_avoid_credential_warnings() {
    let toml_str = r#"
[llm.auth]
key = "g"

[sources.tmdb]
base_url = "https://api.themoviedb.org/3"
auth = { key = "t" }

[sources.rawg]
base_url = "https://api.rawg.io/api"
auth = { key = "r" }

[sources.serper]
base_url = "https://google.serper.dev"
auth = { key = "s" }
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.validate().is_empty(), "{:?}", config.validate());
}

#[test]
fn disabled_llm_skips_credential_check() {
    let mut config = Config::default();
    config.llm.enabled = false;
    config.llm.auth.env = Some("CHATMUX_TEST_UNSET_GEMINI_KEY".into());
    assert!(!config.validate().iter().any(|e| e.field == "llm.auth"));
}
