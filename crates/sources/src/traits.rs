use cm_domain::context::{GameSummary, MovieDetails, MovieSummary, PersonSummary, SearchHit};
use cm_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Source traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Implementations surface every failure as an error so the caller can tell
// transient from permanent ones. The aggregator wraps each call in
// `RetryPolicy::run_or_default`, which turns the error into an empty list.

#[async_trait::async_trait]
pub trait MovieSource: Send + Sync {
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummary>>;

    async fn trending_movies(&self) -> Result<Vec<MovieSummary>>;

    async fn search_people(&self, query: &str) -> Result<Vec<PersonSummary>>;

    /// Fails with `Error::NotFound` for unknown ids.
    async fn movie_details(&self, id: u64) -> Result<MovieDetails>;
}

#[async_trait::async_trait]
pub trait GameSource: Send + Sync {
    async fn search_games(&self, query: &str) -> Result<Vec<GameSummary>>;

    async fn trending_games(&self) -> Result<Vec<GameSummary>>;
}

#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}
