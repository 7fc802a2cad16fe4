//! Serper (Google) web search adapter.

use async_trait::async_trait;
use cm_domain::config::SourcesConfig;
use cm_domain::context::SearchHit;
use cm_domain::error::Result;
use serde_json::Value;

use crate::http::{results, str_field, Endpoint};
use crate::traits::WebSearch;

pub struct SerperClient {
    endpoint: Endpoint,
    limit: usize,
}

impl SerperClient {
    pub fn from_config(cfg: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new("serper", &cfg.serper, cfg)?,
            limit: cfg.limits.search_hits,
        })
    }

    pub fn has_key(&self) -> bool {
        self.endpoint.has_key()
    }
}

#[async_trait]
impl WebSearch for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let key = self.endpoint.key()?;
        let rb = self
            .endpoint
            .client
            .post(self.endpoint.url("/search"))
            .header("X-API-KEY", key)
            .json(&serde_json::json!({ "q": query, "num": self.limit }));
        let body = self.endpoint.send_json(rb).await?;
        Ok(parse_organic(&body, self.limit))
    }
}

fn hostname(link: &str) -> Option<String> {
    let url = reqwest::Url::parse(link).ok()?;
    url.host_str().map(String::from)
}

/// Hits whose link is not an absolute URL are dropped.
pub fn parse_organic(body: &Value, limit: usize) -> Vec<SearchHit> {
    results(body, "organic")
        .iter()
        .filter_map(|r| {
            let link = str_field(r, "link")?;
            let source = hostname(&link)?;
            Some(SearchHit {
                title: str_field(r, "title").unwrap_or_else(|| source.clone()),
                snippet: str_field(r, "snippet").unwrap_or_default(),
                link,
                source,
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_is_link_hostname() {
        let body = json!({"organic": [
            {"title": "Paris", "link": "https://en.wikipedia.org/wiki/Paris", "snippet": "Capital of France."},
            {"title": "No link"},
            {"title": "Relative", "link": "/wiki/Lyon"},
            {"link": "https://www.britannica.com/place/Paris"}
        ]});
        let hits = parse_organic(&body, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "en.wikipedia.org");
        assert_eq!(hits[1].title, "www.britannica.com");
        assert_eq!(hits[1].snippet, "");
    }
}
