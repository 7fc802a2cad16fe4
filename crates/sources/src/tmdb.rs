//! TMDB movie and people adapter.

use async_trait::async_trait;
use cm_domain::config::SourcesConfig;
use cm_domain::context::{MovieDetails, MovieSummary, PersonSummary};
use cm_domain::error::Result;
use serde_json::Value;

use crate::http::{f64_field, results, str_field, Endpoint};
use crate::traits::MovieSource;

/// Words that make an empty search fall back to what is trending.
const RECENCY_WORDS: &[&str] = &["recent", "new", "latest", "newest"];

pub struct TmdbClient {
    endpoint: Endpoint,
    search_limit: usize,
    trending_limit: usize,
    people_limit: usize,
}

impl TmdbClient {
    pub fn from_config(cfg: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Endpoint::new("tmdb", &cfg.tmdb, cfg)?,
            search_limit: cfg.limits.movie_search,
            trending_limit: cfg.limits.trending_movies,
            people_limit: cfg.limits.people,
        })
    }

    pub fn has_key(&self) -> bool {
        self.endpoint.has_key()
    }

    async fn search(&self, kind: &str, query: &str) -> Result<Value> {
        let key = self.endpoint.key()?;
        let rb = self
            .endpoint
            .client
            .get(self.endpoint.url(&format!("/search/{kind}")))
            .query(&[
                ("api_key", key),
                ("query", query),
                ("language", "en-US"),
                ("page", "1"),
                ("include_adult", "false"),
            ]);
        self.endpoint.send_json(rb).await
    }
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummary>> {
        let body = self.search("movie", query).await?;
        let movies = parse_movies(&body, self.search_limit);
        if movies.is_empty() && mentions_recency(query) {
            tracing::debug!(query, "empty movie search for a recency query, using trending");
            return self.trending_movies().await;
        }
        Ok(movies)
    }

    async fn trending_movies(&self) -> Result<Vec<MovieSummary>> {
        let key = self.endpoint.key()?;
        let rb = self
            .endpoint
            .client
            .get(self.endpoint.url("/trending/movie/week"))
            .query(&[("api_key", key)]);
        let body = self.endpoint.send_json(rb).await?;
        Ok(parse_movies(&body, self.trending_limit))
    }

    async fn search_people(&self, query: &str) -> Result<Vec<PersonSummary>> {
        let body = self.search("person", query).await?;
        Ok(parse_people(&body, self.people_limit))
    }

    async fn movie_details(&self, id: u64) -> Result<MovieDetails> {
        let key = self.endpoint.key()?;
        let rb = self
            .endpoint
            .client
            .get(self.endpoint.url(&format!("/movie/{id}")))
            .query(&[
                ("api_key", key),
                ("append_to_response", "credits,similar"),
                ("language", "en-US"),
            ]);
        let body = self.endpoint.send_json(rb).await?;
        parse_details(&body).ok_or_else(|| cm_domain::Error::Provider {
            provider: "tmdb".into(),
            message: format!("malformed details for movie {id}"),
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response normalization
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn mentions_recency(query: &str) -> bool {
    query
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| RECENCY_WORDS.iter().any(|r| w.eq_ignore_ascii_case(r)))
}

fn parse_movie(v: &Value) -> Option<MovieSummary> {
    Some(MovieSummary {
        id: v.get("id")?.as_u64()?,
        title: str_field(v, "title").or_else(|| str_field(v, "name"))?,
        overview: str_field(v, "overview"),
        release_date: str_field(v, "release_date"),
        vote_average: f64_field(v, "vote_average"),
        poster_path: str_field(v, "poster_path"),
    })
}

/// Entries without an id or title are dropped.
pub fn parse_movies(body: &Value, limit: usize) -> Vec<MovieSummary> {
    results(body, "results")
        .iter()
        .filter_map(parse_movie)
        .take(limit)
        .collect()
}

pub fn parse_people(body: &Value, limit: usize) -> Vec<PersonSummary> {
    results(body, "results")
        .iter()
        .filter_map(|p| {
            Some(PersonSummary {
                id: p.get("id")?.as_u64()?,
                name: str_field(p, "name")?,
                known_for_department: str_field(p, "known_for_department"),
                known_for: results(p, "known_for")
                    .iter()
                    .filter_map(|w| str_field(w, "title").or_else(|| str_field(w, "name")))
                    .collect(),
                popularity: f64_field(p, "popularity"),
                profile_path: str_field(p, "profile_path"),
            })
        })
        .take(limit)
        .collect()
}

pub fn parse_details(body: &Value) -> Option<MovieDetails> {
    let summary = parse_movie(body)?;
    let credits = body.get("credits");
    let director = credits
        .map(|c| results(c, "crew"))
        .unwrap_or_default()
        .iter()
        .find(|m| m.get("job").and_then(|j| j.as_str()) == Some("Director"))
        .and_then(|m| str_field(m, "name"));
    let cast = credits
        .map(|c| results(c, "cast"))
        .unwrap_or_default()
        .iter()
        .filter_map(|m| str_field(m, "name"))
        .take(5)
        .collect();
    let similar = body
        .get("similar")
        .map(|s| parse_movies(s, 5))
        .unwrap_or_default()
        .into_iter()
        .map(|m| m.title)
        .collect();

    Some(MovieDetails {
        summary,
        tagline: str_field(body, "tagline"),
        runtime_minutes: body
            .get("runtime")
            .and_then(|r| r.as_u64())
            .filter(|r| *r > 0)
            .map(|r| r as u32),
        genres: results(body, "genres")
            .iter()
            .filter_map(|g| str_field(g, "name"))
            .collect(),
        director,
        cast,
        similar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn movies_are_normalized_and_capped() {
        let body = json!({"results": [
            {"id": 1, "title": "Rush", "vote_average": 8.1, "release_date": "2013-09-02", "overview": "Hunt vs Lauda."},
            {"id": 2, "title": "Senna", "vote_average": 8.5},
            {"id": 3, "title": "Ford v Ferrari", "vote_average": 8.0}
        ]});
        let movies = parse_movies(&body, 2);
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Rush");
        assert_eq!(movies[0].year(), Some("2013"));
        assert!(movies[1].overview.is_none());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let body = json!({"results": [
            {"title": "no id"},
            {"id": 4, "title": "   "},
            {"id": 5, "title": "Heat"}
        ]});
        let movies = parse_movies(&body, 10);
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, 5);
    }

    #[test]
    fn missing_results_array_is_empty() {
        assert!(parse_movies(&json!({"status_message": "nope"}), 8).is_empty());
        assert!(parse_people(&json!(null), 5).is_empty());
    }

    #[test]
    fn people_collect_known_for_titles() {
        let body = json!({"results": [{
            "id": 287, "name": "Brad Pitt", "known_for_department": "Acting", "popularity": 23.456,
            "known_for": [{"title": "Fight Club"}, {"name": "Friends"}, {"overview": "untitled"}]
        }]});
        let people = parse_people(&body, 5);
        assert_eq!(people[0].known_for, vec!["Fight Club", "Friends"]);
        assert!((people[0].popularity - 23.456).abs() < 1e-9);
    }

    #[test]
    fn details_pick_director_and_cast() {
        let body = json!({
            "id": 872585, "title": "Oppenheimer", "vote_average": 8.1, "runtime": 181,
            "genres": [{"name": "Drama"}, {"name": "History"}],
            "credits": {
                "cast": [{"name": "Cillian Murphy"}, {"name": "Emily Blunt"}],
                "crew": [{"name": "Hoyte van Hoytema", "job": "Director of Photography"},
                         {"name": "Christopher Nolan", "job": "Director"}]
            },
            "similar": {"results": [{"id": 9, "title": "Dunkirk"}]}
        });
        let d = parse_details(&body).unwrap();
        assert_eq!(d.director.as_deref(), Some("Christopher Nolan"));
        assert_eq!(d.cast, vec!["Cillian Murphy", "Emily Blunt"]);
        assert_eq!(d.runtime_minutes, Some(181));
        assert_eq!(d.similar, vec!["Dunkirk"]);
    }

    #[test]
    fn recency_is_matched_on_whole_words() {
        assert!(mentions_recency("any new thrillers?"));
        assert!(mentions_recency("Latest Marvel"));
        assert!(!mentions_recency("newspaper drama"));
    }
}
