//! Context Aggregator: fans out to the data sources a turn needs and merges
//! whatever comes back into a [`ContextBag`].
//!
//! `gather` has no error path. Every call goes through
//! [`RetryPolicy::run_or_default`], so a failed source leaves its field empty
//! without touching the others.

use std::collections::BTreeSet;

use cm_domain::context::ContextBag;
use cm_domain::mode::{Mode, SourceKind};
use cm_sources::{RetryPolicy, SourceSet};

use crate::classifier::is_trending;

/// Which endpoint of a movie or game source to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Search,
    Trending,
}

impl Variant {
    fn movie_label(self) -> &'static str {
        match self {
            Variant::Search => "search_movies",
            Variant::Trending => "trending_movies",
        }
    }

    fn game_label(self) -> &'static str {
        match self {
            Variant::Search => "search_games",
            Variant::Trending => "trending_games",
        }
    }
}

/// The calls one `gather` will make.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPlan {
    pub movies: Option<Variant>,
    pub people: bool,
    pub games: Option<Variant>,
    pub web: bool,
}

impl FetchPlan {
    /// Sources are the mode's implied source plus any hints. A trending
    /// marker switches movies and games to their trending endpoints, and an
    /// empty message skips every call that needs a query.
    pub fn new(mode: Mode, message: &str, hinted: &BTreeSet<SourceKind>) -> Self {
        let mut sources = hinted.clone();
        sources.extend(mode.implied_source());

        let trending = is_trending(message);
        let has_query = !message.trim().is_empty();
        let variant = |wanted: bool| match (wanted, trending, has_query) {
            (false, _, _) => None,
            (true, true, _) => Some(Variant::Trending),
            (true, false, true) => Some(Variant::Search),
            (true, false, false) => None,
        };

        let movies = variant(sources.contains(&SourceKind::Movies));
        Self {
            movies,
            people: has_query
                && (movies == Some(Variant::Search) || sources.contains(&SourceKind::People)),
            games: variant(sources.contains(&SourceKind::Games)),
            web: has_query && sources.contains(&SourceKind::WebSearch),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &FetchPlan::default()
    }
}

pub struct ContextAggregator {
    sources: SourceSet,
    policy: RetryPolicy,
}

impl ContextAggregator {
    pub fn new(sources: SourceSet, policy: RetryPolicy) -> Self {
        Self { sources, policy }
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Gather context for one turn. All planned calls run concurrently.
    pub async fn gather(
        &self,
        mode: Mode,
        message: &str,
        hinted: &BTreeSet<SourceKind>,
    ) -> ContextBag {
        let plan = FetchPlan::new(mode, message, hinted);
        tracing::debug!(mode = %mode, plan = ?plan, "gathering context");
        if plan.is_empty() {
            return ContextBag::default();
        }

        let query = message.trim();
        let policy = &self.policy;
        let movie_source = &self.sources.movies;
        let game_source = &self.sources.games;
        let web = &self.sources.web;

        let movies = async {
            match plan.movies {
                Some(v @ Variant::Trending) => {
                    policy
                        .run_or_default("movies", v.movie_label(), Vec::new(), move || {
                            movie_source.trending_movies()
                        })
                        .await
                }
                Some(v @ Variant::Search) => {
                    policy
                        .run_or_default("movies", v.movie_label(), Vec::new(), move || {
                            movie_source.search_movies(query)
                        })
                        .await
                }
                None => Vec::new(),
            }
        };

        let people = async {
            if !plan.people {
                return Vec::new();
            }
            policy
                .run_or_default("people", "search_people", Vec::new(), move || {
                    movie_source.search_people(query)
                })
                .await
        };

        let games = async {
            match plan.games {
                Some(v @ Variant::Trending) => {
                    policy
                        .run_or_default("games", v.game_label(), Vec::new(), move || {
                            game_source.trending_games()
                        })
                        .await
                }
                Some(v @ Variant::Search) => {
                    policy
                        .run_or_default("games", v.game_label(), Vec::new(), move || {
                            game_source.search_games(query)
                        })
                        .await
                }
                None => Vec::new(),
            }
        };

        let hits = async {
            if !plan.web {
                return Vec::new();
            }
            policy
                .run_or_default("web_search", "search", Vec::new(), move || web.search(query))
                .await
        };

        let (movies, people, games, hits) = tokio::join!(movies, people, games, hits);

        let mut bag = ContextBag::default();
        bag.set_movies(movies);
        bag.set_people(people);
        bag.set_games(games);
        bag.set_search_results(hits);
        tracing::debug!(
            movies = bag.movies().len(),
            people = bag.people().len(),
            games = bag.games().len(),
            hits = bag.search_results().len(),
            "context gathered"
        );
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> BTreeSet<SourceKind> {
        BTreeSet::new()
    }

    #[test]
    fn cinephile_search_also_searches_people() {
        let plan = FetchPlan::new(Mode::Cinephile, "movies with Tom Hanks", &none());
        assert_eq!(plan.movies, Some(Variant::Search));
        assert!(plan.people);
        assert_eq!(plan.games, None);
        assert!(!plan.web);
    }

    #[test]
    fn trending_marker_switches_variant_and_skips_people() {
        let plan = FetchPlan::new(Mode::Cinephile, "recommend trending movies", &none());
        assert_eq!(plan.movies, Some(Variant::Trending));
        assert!(!plan.people);

        let plan = FetchPlan::new(Mode::Game, "popular games", &none());
        assert_eq!(plan.games, Some(Variant::Trending));
    }

    #[test]
    fn hints_are_unioned_with_implied_source() {
        let hinted = BTreeSet::from([SourceKind::WebSearch, SourceKind::Movies]);
        let plan = FetchPlan::new(Mode::Cinephile, "Oppenheimer box office", &hinted);
        assert_eq!(plan.movies, Some(Variant::Search));
        assert!(plan.web);

        let plan = FetchPlan::new(Mode::Chat, "Zendaya", &BTreeSet::from([SourceKind::People]));
        assert!(plan.people);
        assert_eq!(plan.movies, None);
    }

    #[test]
    fn chat_without_hints_calls_nothing() {
        assert!(FetchPlan::new(Mode::Chat, "hello", &none()).is_empty());
    }

    #[test]
    fn empty_message_skips_query_calls() {
        for mode in Mode::ALL {
            assert!(FetchPlan::new(mode, "   ", &none()).is_empty(), "{mode}");
        }
    }
}
