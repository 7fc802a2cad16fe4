use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Normalized source DTOs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// `YYYY-MM-DD` as reported upstream; may be partial or missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// 0-10 scale.
    pub vote_average: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

impl MovieSummary {
    pub fn year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_for_department: Option<String>,
    /// Titles the person is best known for, most prominent first.
    #[serde(default)]
    pub known_for: Vec<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: u64,
    pub name: String,
    /// 0-5 scale.
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
    /// Hostname of `link`.
    pub source: String,
}

/// Extended record for a single movie, served outside the turn pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub summary: MovieSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub similar: Vec<String>,
}

fn release_year(date: Option<&str>) -> Option<&str> {
    let date = date?;
    let year = date.get(..4)?;
    year.chars().all(|c| c.is_ascii_digit()).then_some(year)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ContextBag
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-request collection of source results handed from aggregation to
/// synthesis.
///
/// A field is `None` when its source was not called *or* returned nothing;
/// the two are deliberately indistinguishable. The `set_*` methods keep the
/// invariant that a present field is never empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextBag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<MovieSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games: Option<Vec<GameSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<PersonSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Vec<SearchHit>>,
}

impl ContextBag {
    pub fn set_movies(&mut self, movies: Vec<MovieSummary>) {
        self.movies = non_empty(movies);
    }

    pub fn set_games(&mut self, games: Vec<GameSummary>) {
        self.games = non_empty(games);
    }

    pub fn set_people(&mut self, people: Vec<PersonSummary>) {
        self.people = non_empty(people);
    }

    pub fn set_search_results(&mut self, hits: Vec<SearchHit>) {
        self.search_results = non_empty(hits);
    }

    pub fn movies(&self) -> &[MovieSummary] {
        self.movies.as_deref().unwrap_or_default()
    }

    pub fn games(&self) -> &[GameSummary] {
        self.games.as_deref().unwrap_or_default()
    }

    pub fn people(&self) -> &[PersonSummary] {
        self.people.as_deref().unwrap_or_default()
    }

    pub fn search_results(&self) -> &[SearchHit] {
        self.search_results.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.movies().is_empty()
            && self.games().is_empty()
            && self.people().is_empty()
            && self.search_results().is_empty()
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(release_date: Option<&str>) -> MovieSummary {
        MovieSummary {
            id: 1,
            title: "Heat".into(),
            overview: None,
            release_date: release_date.map(String::from),
            vote_average: 7.9,
            poster_path: None,
        }
    }

    #[test]
    fn empty_results_leave_field_absent() {
        let mut bag = ContextBag::default();
        bag.set_movies(Vec::new());
        bag.set_search_results(Vec::new());
        assert!(bag.movies.is_none());
        assert!(bag.search_results.is_none());
        assert!(bag.is_empty());
    }

    #[test]
    fn absent_fields_are_skipped_when_serialized() {
        let mut bag = ContextBag::default();
        bag.set_movies(vec![movie(Some("1995-12-15"))]);
        let v = serde_json::to_value(&bag).unwrap();
        assert!(v.get("movies").is_some());
        assert!(v.get("games").is_none());
        assert!(v.get("search_results").is_none());
    }

    #[test]
    fn year_comes_from_release_date_prefix() {
        assert_eq!(movie(Some("1995-12-15")).year(), Some("1995"));
        assert_eq!(movie(Some("")).year(), None);
        assert_eq!(movie(Some("TBA")).year(), None);
        assert_eq!(movie(None).year(), None);
    }
}
