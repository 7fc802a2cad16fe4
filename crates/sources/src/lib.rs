//! External data sources: movies and people (TMDB), games (RAWG) and web
//! search (Serper), plus the retry policy used around every call.

mod http;
pub mod rawg;
pub mod retry;
pub mod serper;
pub mod tmdb;
pub mod traits;

use std::sync::Arc;

use cm_domain::config::SourcesConfig;
use cm_domain::error::Result;

pub use rawg::RawgClient;
pub use retry::RetryPolicy;
pub use serper::SerperClient;
pub use tmdb::TmdbClient;
pub use traits::{GameSource, MovieSource, WebSearch};

/// The three source families the aggregator fans out to.
#[derive(Clone)]
pub struct SourceSet {
    pub movies: Arc<dyn MovieSource>,
    pub games: Arc<dyn GameSource>,
    pub web: Arc<dyn WebSearch>,
}

impl SourceSet {
    pub fn from_config(cfg: &SourcesConfig) -> Result<Self> {
        let tmdb = TmdbClient::from_config(cfg)?;
        let rawg = RawgClient::from_config(cfg)?;
        let serper = SerperClient::from_config(cfg)?;
        tracing::info!(
            tmdb = tmdb.has_key(),
            rawg = rawg.has_key(),
            serper = serper.has_key(),
            "data sources initialized"
        );
        Ok(Self {
            movies: Arc::new(tmdb),
            games: Arc::new(rawg),
            web: Arc::new(serper),
        })
    }
}
