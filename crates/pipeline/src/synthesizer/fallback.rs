//! Deterministic fallback path: mode-specific templates, no network.
//!
//! [`FallbackSynthesizer::render`] is total. Every `(mode, context)` pair
//! yields a non-empty string; only pool selection is random, and the RNG is
//! injectable so tests can seed it.

use std::sync::LazyLock;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use regex::Regex;

use cm_domain::config::DisplayCaps;
use cm_domain::context::{ContextBag, GameSummary, MovieSummary, PersonSummary, SearchHit};
use cm_domain::mode::Mode;

use super::templates as t;

/// Messages at least this long get the reflective default instead of the
/// short "tell me more" pool.
const LONG_MESSAGE_CHARS: usize = 60;
const OVERVIEW_CHARS: usize = 220;
const LIST_ITEMS: usize = 3;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rating tiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tier phrase for a 10-point movie rating.
pub fn movie_tier(vote_average: f64) -> &'static str {
    if vote_average >= 7.0 {
        t::MOVIE_TIER_TOP
    } else if vote_average >= 6.0 {
        t::MOVIE_TIER_MID
    } else {
        t::MOVIE_TIER_LOW
    }
}

/// Tier phrase for a 5-point game rating.
pub fn game_tier(rating: f64) -> &'static str {
    if rating >= 4.0 {
        t::GAME_TIER_TOP
    } else if rating >= 3.0 {
        t::GAME_TIER_MID
    } else {
        t::GAME_TIER_LOW
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chat categories
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Keyword groups for chat replies, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCategory {
    Greeting,
    EmotionalNegative,
    EmotionalPositive,
    Joke,
    Identity,
    Advice,
}

impl ChatCategory {
    fn pool(self) -> &'static [&'static str] {
        match self {
            ChatCategory::Greeting => t::GREETING,
            ChatCategory::EmotionalNegative => t::EMOTIONAL_NEGATIVE,
            ChatCategory::EmotionalPositive => t::EMOTIONAL_POSITIVE,
            ChatCategory::Joke => t::JOKE,
            ChatCategory::Identity => t::IDENTITY,
            ChatCategory::Advice => t::ADVICE,
        }
    }
}

static CHAT_GROUPS: LazyLock<Vec<(ChatCategory, Regex)>> = LazyLock::new(|| {
    [
        (
            ChatCategory::Greeting,
            r"(?i)\b(?:hello|hi|hey|hiya|sup|what'?s\s+up|namaste|yo|good\s+(?:morning|afternoon|evening))\b",
        ),
        (
            ChatCategory::EmotionalNegative,
            r"(?i)\b(?:sad|depressed|lonely|upset|anxious|stressed|heartbroken|miserable)\b",
        ),
        (
            ChatCategory::EmotionalPositive,
            r"(?i)\b(?:happy|excited|great|awesome|amazing|glad|thrilled)\b",
        ),
        (ChatCategory::Joke, r"(?i)\b(?:jokes?|funny|humou?r|make\s+me\s+laugh)\b"),
        (
            ChatCategory::Identity,
            r"(?i)\b(?:who\s+are\s+you|your\s+name|what\s+are\s+you|are\s+you\s+(?:a\s+)?(?:bot|human|robot))\b",
        ),
        (
            ChatCategory::Advice,
            r"(?i)\b(?:advice|should\s+i|help\s+me\s+decide|what\s+do\s+you\s+think)\b",
        ),
    ]
    .into_iter()
    .map(|(cat, pat)| (cat, Regex::new(pat).expect("chat category regex")))
    .collect()
});

/// First keyword group the message matches.
pub fn chat_category(message: &str) -> Option<ChatCategory> {
    CHAT_GROUPS
        .iter()
        .find(|(_, re)| re.is_match(message))
        .map(|(cat, _)| *cat)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Renderer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct FallbackSynthesizer {
    rng: Mutex<Box<dyn RngCore + Send>>,
    caps: DisplayCaps,
}

impl FallbackSynthesizer {
    /// Seeded when `seed` is set, otherwise seeded from OS entropy.
    pub fn new(seed: Option<u64>, caps: DisplayCaps) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng, caps)
    }

    pub fn with_rng(rng: impl RngCore + Send + 'static, caps: DisplayCaps) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
            caps,
        }
    }

    fn pick(&self, pool: &'static [&'static str]) -> &'static str {
        let mut rng = self.rng.lock();
        pool.choose(&mut *rng).copied().unwrap_or("Tell me more?")
    }

    pub fn render(&self, mode: Mode, message: &str, context: &ContextBag) -> String {
        match mode {
            Mode::Cinephile => self.cinephile(context),
            Mode::Game => self.game(context),
            Mode::Research => self.research(context),
            Mode::Chat => self.chat(message),
        }
    }

    fn cinephile(&self, context: &ContextBag) -> String {
        let movies = context.movies();
        if !movies.is_empty() {
            let blocks = movies.iter().take(self.caps.movies).map(movie_block);
            return section(self.pick(t::MOVIE_HEADERS), blocks);
        }
        let people = context.people();
        if !people.is_empty() {
            let blocks = people.iter().take(self.caps.people).map(person_block);
            return section(self.pick(t::PEOPLE_HEADERS), blocks);
        }
        self.pick(t::CINEPHILE_EMPTY).to_string()
    }

    fn game(&self, context: &ContextBag) -> String {
        let games = context.games();
        if games.is_empty() {
            return self.pick(t::GAME_EMPTY).to_string();
        }
        let blocks = games.iter().take(self.caps.games).map(game_block);
        section(self.pick(t::GAME_HEADERS), blocks)
    }

    fn research(&self, context: &ContextBag) -> String {
        let hits = context.search_results();
        if hits.is_empty() {
            return self.pick(t::RESEARCH_EMPTY).to_string();
        }
        let blocks = hits.iter().take(self.caps.search_hits).map(hit_block);
        section(self.pick(t::RESEARCH_HEADERS), blocks)
    }

    fn chat(&self, message: &str) -> String {
        let pool = match chat_category(message) {
            Some(category) => category.pool(),
            None if message.trim().chars().count() >= LONG_MESSAGE_CHARS => t::LONG_DEFAULT,
            None => t::SHORT_DEFAULT,
        };
        self.pick(pool).to_string()
    }
}

fn section(header: &str, blocks: impl Iterator<Item = String>) -> String {
    let mut out = header.to_string();
    for block in blocks {
        out.push_str("\n\n");
        out.push_str(&block);
    }
    out
}

fn movie_block(movie: &MovieSummary) -> String {
    let mut block = match movie.year() {
        Some(year) => format!("🎬 **{}** ({year})", movie.title),
        None => format!("🎬 **{}**", movie.title),
    };
    block.push_str(&format!(
        "\n⭐ {:.1}/10 - {}",
        movie.vote_average,
        movie_tier(movie.vote_average)
    ));
    if let Some(overview) = &movie.overview {
        block.push('\n');
        block.push_str(&excerpt(overview, OVERVIEW_CHARS));
    }
    block
}

fn person_block(person: &PersonSummary) -> String {
    let mut block = format!(
        "🌟 **{}**\n🎭 Known for: {}",
        person.name,
        person.known_for_department.as_deref().unwrap_or("Acting")
    );
    if !person.known_for.is_empty() {
        block.push_str(&format!("\n🎬 Famous works: {}", first_n(&person.known_for)));
    }
    block.push_str(&format!("\n📈 Popularity: {:.1}", person.popularity));
    block
}

fn game_block(game: &GameSummary) -> String {
    let mut block = format!(
        "🎮 **{}**\n⭐ {:.1}/5 - {}\n📅 Released: {}",
        game.name,
        game.rating,
        game_tier(game.rating),
        game.released.as_deref().unwrap_or("TBA")
    );
    if !game.platforms.is_empty() {
        block.push_str(&format!("\n🕹️ Platforms: {}", first_n(&game.platforms)));
    }
    if !game.genres.is_empty() {
        block.push_str(&format!("\n🏷️ Genres: {}", first_n(&game.genres)));
    }
    block
}

fn hit_block(hit: &SearchHit) -> String {
    format!(
        "🔍 **{}**\n{}\nSource: {} | [Read more]({})",
        hit.title, hit.snippet, hit.source, hit.link
    )
}

fn first_n(items: &[String]) -> String {
    items
        .iter()
        .take(LIST_ITEMS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> FallbackSynthesizer {
        FallbackSynthesizer::new(Some(7), DisplayCaps::default())
    }

    fn movie(title: &str, vote_average: f64) -> MovieSummary {
        MovieSummary {
            id: 1,
            title: title.into(),
            overview: Some("A physicist builds a bomb.".into()),
            release_date: Some("2023-07-19".into()),
            vote_average,
            poster_path: None,
        }
    }

    fn game(rating: f64) -> GameSummary {
        GameSummary {
            id: 1,
            name: "Hades".into(),
            rating,
            released: None,
            platforms: vec!["PC".into(), "Switch".into(), "PS5".into(), "Xbox".into()],
            genres: vec![],
            background_image: None,
        }
    }

    #[test]
    fn movie_tier_boundaries() {
        assert_eq!(movie_tier(7.0), t::MOVIE_TIER_TOP);
        assert_eq!(movie_tier(6.99), t::MOVIE_TIER_MID);
        assert_eq!(movie_tier(6.0), t::MOVIE_TIER_MID);
        assert_eq!(movie_tier(5.9), t::MOVIE_TIER_LOW);
    }

    #[test]
    fn game_tier_boundary_is_inclusive() {
        assert_eq!(game_tier(4.0), t::GAME_TIER_TOP);
        assert_eq!(game_tier(3.9), t::GAME_TIER_MID);
        assert_eq!(game_tier(2.5), t::GAME_TIER_LOW);
    }

    #[test]
    fn single_high_rated_movie_is_must_watch() {
        let mut bag = ContextBag::default();
        bag.set_movies(vec![movie("Oppenheimer", 8.5)]);
        let out = synth().render(Mode::Cinephile, "oppenheimer", &bag);
        assert!(out.contains("Oppenheimer"));
        assert!(out.contains("(2023)"));
        assert!(out.contains("8.5/10"));
        assert!(out.to_lowercase().contains("must watch"));
    }

    #[test]
    fn people_render_when_no_movies() {
        let mut bag = ContextBag::default();
        bag.set_people(vec![PersonSummary {
            id: 2,
            name: "Cillian Murphy".into(),
            known_for_department: None,
            known_for: vec!["Oppenheimer".into(), "Inception".into(), "Dunkirk".into(), "Heat".into()],
            popularity: 88.456,
            profile_path: None,
        }]);
        let out = synth().render(Mode::Cinephile, "", &bag);
        assert!(out.contains("Cillian Murphy"));
        assert!(out.contains("Known for: Acting"));
        assert!(out.contains("Oppenheimer, Inception, Dunkirk"));
        assert!(!out.contains("Heat"));
        assert!(out.contains("Popularity: 88.5"));
    }

    #[test]
    fn game_block_caps_platforms() {
        let mut bag = ContextBag::default();
        bag.set_games(vec![game(4.0)]);
        let out = synth().render(Mode::Game, "", &bag);
        assert!(out.contains(t::GAME_TIER_TOP));
        assert!(out.contains("Platforms: PC, Switch, PS5"));
        assert!(out.contains("Released: TBA"));
        assert!(!out.contains("Genres"));
    }

    #[test]
    fn research_block_links_source() {
        let mut bag = ContextBag::default();
        bag.set_search_results(vec![SearchHit {
            title: "Paris".into(),
            link: "https://en.wikipedia.org/wiki/Paris".into(),
            snippet: "Paris is the capital of France.".into(),
            source: "en.wikipedia.org".into(),
        }]);
        let out = synth().render(Mode::Research, "", &bag);
        assert!(out.contains("Source: en.wikipedia.org | [Read more](https://en.wikipedia.org/wiki/Paris)"));
    }

    #[test]
    fn display_caps_bound_output() {
        let caps = DisplayCaps {
            movies: 2,
            ..DisplayCaps::default()
        };
        let mut bag = ContextBag::default();
        bag.set_movies((0..5).map(|i| movie(&format!("Film {i}"), 7.5)).collect());
        let out = FallbackSynthesizer::new(Some(1), caps).render(Mode::Cinephile, "", &bag);
        assert!(out.contains("Film 1"));
        assert!(!out.contains("Film 2"));
    }

    #[test]
    fn chat_categories_in_priority_order() {
        assert_eq!(chat_category("hi, I'm so sad"), Some(ChatCategory::Greeting));
        assert_eq!(chat_category("I feel lonely and happy"), Some(ChatCategory::EmotionalNegative));
        assert_eq!(chat_category("tell me a joke"), Some(ChatCategory::Joke));
        assert_eq!(chat_category("who are you?"), Some(ChatCategory::Identity));
        assert_eq!(chat_category("should I quit my job"), Some(ChatCategory::Advice));
        // "this" and "ship" must not read as greetings.
        assert_eq!(chat_category("this ship"), None);
    }

    #[test]
    fn chat_defaults_depend_on_length() {
        let s = synth();
        let short = s.render(Mode::Chat, "ok cool", &ContextBag::default());
        assert!(t::SHORT_DEFAULT.contains(&short.as_str()));
        let long = "I have been thinking a lot lately about where my career is going overall";
        let out = s.render(Mode::Chat, long, &ContextBag::default());
        assert!(t::LONG_DEFAULT.contains(&out.as_str()));
    }

    #[test]
    fn same_seed_same_choices() {
        let a = FallbackSynthesizer::new(Some(42), DisplayCaps::default());
        let b = FallbackSynthesizer::new(Some(42), DisplayCaps::default());
        for msg in ["hello", "tell me a joke", "hmm", "I'm sad"] {
            let bag = ContextBag::default();
            assert_eq!(a.render(Mode::Chat, msg, &bag), b.render(Mode::Chat, msg, &bag));
        }
    }

    #[test]
    fn every_mode_renders_something_for_empty_context() {
        let s = synth();
        for mode in Mode::ALL {
            for msg in ["", "hello", "what?"] {
                assert!(!s.render(mode, msg, &ContextBag::default()).trim().is_empty());
            }
        }
    }
}
