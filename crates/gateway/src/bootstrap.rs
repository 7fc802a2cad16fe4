//! Startup wiring: validate config, open the store, build the provider and
//! data sources, and assemble the turn coordinator.

use std::sync::Arc;

use anyhow::Context;

use cm_domain::config::{Config, ConfigSeverity};
use cm_pipeline::TurnCoordinator;
use cm_providers::build_provider;
use cm_sessions::{open_store, ConversationStore, InMemoryStore};
use cm_sources::SourceSet;

use crate::state::AppState;

/// Log every validation issue; fail on any error-severity entry.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}

/// Build a coordinator on top of `store`. Returns whether a model is wired.
pub fn build_coordinator(
    config: &Config,
    store: Arc<dyn ConversationStore>,
) -> anyhow::Result<(TurnCoordinator, bool)> {
    let llm = build_provider(&config.llm);
    let llm_enabled = llm.is_some();
    let sources = SourceSet::from_config(&config.sources).context("building data sources")?;
    Ok((
        TurnCoordinator::from_config(config, store, llm, sources),
        llm_enabled,
    ))
}

/// Full server state using the configured storage backend.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    check_config(&config)?;

    let store = open_store(&config.storage).context("opening conversation store")?;
    tracing::info!(backend = ?config.storage.backend, "conversation store ready");

    let (coordinator, llm_enabled) = build_coordinator(&config, store)?;

    let token = std::env::var(&config.server.api_token_env).ok();
    if token.as_deref().map_or(true, str::is_empty) {
        tracing::warn!(
            env = %config.server.api_token_env,
            "API token not set, /api routes are unauthenticated"
        );
    }

    Ok(AppState::new(
        config,
        Arc::new(coordinator),
        llm_enabled,
        token.as_deref(),
    ))
}

/// Coordinator over a throwaway in-memory store, for CLI sessions.
pub fn build_ephemeral(config: &Config) -> anyhow::Result<TurnCoordinator> {
    check_config(config)?;
    let (coordinator, _) = build_coordinator(config, Arc::new(InMemoryStore::new()))?;
    Ok(coordinator)
}
