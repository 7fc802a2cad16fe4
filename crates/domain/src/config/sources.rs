use serde::{Deserialize, Serialize};

use super::AuthConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// External data sources
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Per-attempt timeout for every data-source call.
    #[serde(default = "d_5000u")]
    pub timeout_ms: u64,
    /// Extra attempts after the first one for transient failures.
    #[serde(default = "d_2")]
    pub max_retries: u32,
    /// Base delay for exponential backoff between attempts.
    #[serde(default = "d_100u")]
    pub backoff_ms: u64,
    #[serde(default = "d_tmdb")]
    pub tmdb: EndpointConfig,
    #[serde(default = "d_rawg")]
    pub rawg: EndpointConfig,
    #[serde(default = "d_serper")]
    pub serper: EndpointConfig,
    #[serde(default)]
    pub limits: SourceLimits,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_retries: 2,
            backoff_ms: 100,
            tmdb: d_tmdb(),
            rawg: d_rawg(),
            serper: d_serper(),
            limits: SourceLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// How many normalized results each adapter keeps from a raw response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceLimits {
    #[serde(default = "d_8")]
    pub movie_search: usize,
    #[serde(default = "d_6")]
    pub trending_movies: usize,
    #[serde(default = "d_5")]
    pub people: usize,
    #[serde(default = "d_6")]
    pub games: usize,
    #[serde(default = "d_5")]
    pub search_hits: usize,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            movie_search: 8,
            trending_movies: 6,
            people: 5,
            games: 6,
            search_hits: 5,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_5000u() -> u64 {
    5_000
}
fn d_100u() -> u64 {
    100
}
fn d_2() -> u32 {
    2
}
fn d_5() -> usize {
    5
}
fn d_6() -> usize {
    6
}
fn d_8() -> usize {
    8
}
fn d_tmdb() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://api.themoviedb.org/3".into(),
        auth: AuthConfig::from_env("TMDB_API_KEY"),
    }
}
fn d_rawg() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://api.rawg.io/api".into(),
        auth: AuthConfig::from_env("RAWG_API_KEY"),
    }
}
fn d_serper() -> EndpointConfig {
    EndpointConfig {
        base_url: "https://google.serper.dev".into(),
        auth: AuthConfig::from_env("SERPER_API_KEY"),
    }
}
