use std::sync::Arc;
use std::time::Instant;

use sha2::{Digest, Sha256};

use cm_domain::config::Config;
use cm_pipeline::TurnCoordinator;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub coordinator: Arc<TurnCoordinator>,
    /// Whether a generative model is wired in.
    pub llm_enabled: bool,
    /// SHA-256 of the API token, read once at startup. `None` means the
    /// API is open (dev mode).
    pub api_token_hash: Option<Arc<[u8]>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        coordinator: Arc<TurnCoordinator>,
        llm_enabled: bool,
        api_token: Option<&str>,
    ) -> Self {
        let api_token_hash = api_token
            .filter(|t| !t.is_empty())
            .map(|t| Arc::from(Sha256::digest(t.as_bytes()).as_slice()));
        Self {
            config,
            coordinator,
            llm_enabled,
            api_token_hash,
            started_at: Instant::now(),
        }
    }
}
