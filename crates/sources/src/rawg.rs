//! RAWG game adapter.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use cm_domain::config::SourcesConfig;
use cm_domain::context::GameSummary;
use cm_domain::error::Result;
use serde_json::Value;

use crate::http::{f64_field, results, str_field, Endpoint};
use crate::traits::GameSource;

/// Trailing window used for "trending": top-rated releases of the last year.
const TRENDING_WINDOW_DAYS: i64 = 365;

pub struct RawgClient {
    endpoint: Endpoint,
    limit: usize,
}

impl RawgClient {
    pub fn from_config(cfg: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new("rawg", &cfg.rawg, cfg)?,
            limit: cfg.limits.games,
        })
    }

    pub fn has_key(&self) -> bool {
        self.endpoint.has_key()
    }

    async fn games(&self, params: &[(&str, &str)]) -> Result<Vec<GameSummary>> {
        let key = self.endpoint.key()?;
        let page_size = self.limit.to_string();
        let rb = self
            .endpoint
            .client
            .get(self.endpoint.url("/games"))
            .query(&[("key", key), ("page_size", page_size.as_str())])
            .query(params);
        let body = self.endpoint.send_json(rb).await?;
        Ok(parse_games(&body, self.limit))
    }
}

#[async_trait]
impl GameSource for RawgClient {
    async fn search_games(&self, query: &str) -> Result<Vec<GameSummary>> {
        self.games(&[("search", query)]).await
    }

    async fn trending_games(&self) -> Result<Vec<GameSummary>> {
        let dates = trending_dates(Utc::now().date_naive());
        self.games(&[("dates", dates.as_str()), ("ordering", "-rating")])
            .await
    }
}

fn trending_dates(today: NaiveDate) -> String {
    let from = today - Duration::days(TRENDING_WINDOW_DAYS);
    format!("{},{}", from.format("%Y-%m-%d"), today.format("%Y-%m-%d"))
}

fn names(v: &Value, list: &str, nested: Option<&str>) -> Vec<String> {
    results(v, list)
        .iter()
        .filter_map(|item| match nested {
            Some(key) => item.get(key).and_then(|n| str_field(n, "name")),
            None => str_field(item, "name"),
        })
        .collect()
}

pub fn parse_games(body: &Value, limit: usize) -> Vec<GameSummary> {
    results(body, "results")
        .iter()
        .filter_map(|g| {
            Some(GameSummary {
                id: g.get("id")?.as_u64()?,
                name: str_field(g, "name")?,
                rating: f64_field(g, "rating"),
                released: str_field(g, "released"),
                platforms: names(g, "platforms", Some("platform")),
                genres: names(g, "genres", None),
                background_image: str_field(g, "background_image"),
            })
        })
        .take(limit)
        .collect()
}
