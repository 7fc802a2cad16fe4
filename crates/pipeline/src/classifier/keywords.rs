//! Deterministic keyword strategy.
//!
//! Never fails and never suspends. Categories are checked in priority order
//! research > cinephile > game; anything else is chat.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use cm_domain::mode::Mode;

use super::{Entities, Verdict};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Canonical keyword sets (compiled once)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn word_set(pattern: &str) -> Regex {
    Regex::new(pattern).expect("keyword regex")
}

static RESEARCH: LazyLock<Regex> = LazyLock::new(|| {
    word_set(
        r"(?i)\b(?:search|find|research|look\s+up|what\s+is|what's|who\s+is|who's|tell\s+me\s+about)\b",
    )
});

static CINEPHILE: LazyLock<Regex> = LazyLock::new(|| {
    word_set(
        r"(?i)\b(?:movies?|films?|cinema|actors?|actress(?:es)?|directors?|tv|series|bollywood|hollywood|netflix)\b",
    )
});

static GAME: LazyLock<Regex> = LazyLock::new(|| {
    word_set(r"(?i)\b(?:games?|gaming|gamers?|xbox|ps4|ps5|playstation|nintendo|steam|esports)\b")
});

static PEOPLE: LazyLock<Regex> = LazyLock::new(|| {
    word_set(r"(?i)\b(?:actors?|actress(?:es)?|directors?|stars?|celebrit(?:y|ies)|cast)\b")
});

static TRENDING: LazyLock<Regex> = LazyLock::new(|| word_set(r"(?i)\b(?:trending|popular)\b"));

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| word_set(r#"["“”]([^"“”]{2,80})["“”]"#));

static ABOUT_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    word_set(r"(?i)\b(?:tell\s+me\s+about|who\s+is|who's|what\s+is|what's|about)\s+([^?.!,;]+)")
});

/// Capitalized words that open questions or commands rather than name things.
const STOP_WORDS: &[&str] = &[
    "what", "what's", "whats", "who", "who's", "whom", "whose", "where", "when", "why", "how",
    "which", "is", "are", "was", "were", "do", "does", "did", "can", "could", "should", "would",
    "will", "tell", "show", "find", "search", "recommend", "suggest", "give", "list", "any",
    "some", "i", "i'm", "im", "i've", "hey", "hi", "hello", "yo", "please", "me", "my", "compare",
    "best", "top", "trending", "popular", "new", "latest", "ok", "okay", "thanks", "also", "but",
    "so", "let's", "lets", "if", "yes", "no", "maybe",
];

/// Lowercase words allowed inside a capitalized run ("Lord of the Rings").
const CONNECTORS: &[&str] = &["of", "the", "a", "an", "and", "in", "on", "at", "to", "vs", "v", "&"];

/// Words that make an "about ..." phrase a reference rather than a subject.
const REFERENCE_WORDS: &[&str] = &[
    "he", "she", "it", "they", "him", "her", "them", "that", "this", "those", "these", "his",
    "its", "their", "there", "up", "you", "your", "me", "my", "going", "happening",
];

const MAX_PHRASE_WORDS: usize = 6;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public predicates
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// First matching category in priority order; chat when nothing matches.
pub fn keyword_mode(message: &str) -> Mode {
    if RESEARCH.is_match(message) {
        Mode::Research
    } else if CINEPHILE.is_match(message) {
        Mode::Cinephile
    } else if GAME.is_match(message) {
        Mode::Game
    } else {
        Mode::Chat
    }
}

/// True when the message asks for what is trending rather than a search.
pub fn is_trending(message: &str) -> bool {
    TRENDING.is_match(message)
}

pub fn mentions_people(message: &str) -> bool {
    PEOPLE.is_match(message)
}

fn is_mode_keyword(word: &str) -> bool {
    CINEPHILE.is_match(word) || GAME.is_match(word) || TRENDING.is_match(word)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Verdicts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Keyword classification of `message`.
pub(crate) fn classify(message: &str) -> Verdict {
    verdict_for(message, keyword_mode(message))
}

/// Keyword entity extraction under an already decided mode.
pub(crate) fn verdict_for(message: &str, mode: Mode) -> Verdict {
    Verdict {
        mode,
        entities: entities_for(message, mode),
        suggested_sources: BTreeSet::new(),
        question_type: None,
    }
}

/// The subject slot depends on mode: cinephile messages about people fill
/// `person`, other cinephile messages fill `movie`, and so on.
fn entities_for(message: &str, mode: Mode) -> Entities {
    let Some(subject) = extract_subject(message) else {
        return Entities::default();
    };
    let mut entities = Entities::default();
    match mode {
        Mode::Cinephile if mentions_people(message) => entities.person = Some(subject),
        Mode::Cinephile => entities.movie = Some(subject),
        Mode::Game => entities.game = Some(subject),
        Mode::Research | Mode::Chat => entities.topic = Some(subject),
    }
    entities
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Subject extraction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The named subject of a message, if it has one.
///
/// Tried in order: a quoted phrase, the longest run of capitalized words,
/// then the object of "tell me about" / "what is" style phrases. Follow-ups
/// made only of pronouns yield `None`.
pub fn extract_subject(message: &str) -> Option<String> {
    if let Some(caps) = QUOTED.captures(message) {
        let quoted = caps[1].trim();
        if !quoted.is_empty() {
            return Some(quoted.to_string());
        }
    }
    capitalized_run(message).or_else(|| about_phrase(message))
}

fn capitalized_run(message: &str) -> Option<String> {
    let mut runs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut sentence_start = true;
    let mut opens_sentence = false;

    for raw in message.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '&');
        let trimmed = raw.trim_end_matches(['"', '”', '\'', ')']);
        let ends_clause = trimmed.ends_with([',', '.', ';', ':', '!', '?']);
        let ends_sentence = trimmed.ends_with(['.', '!', '?']);

        if !word.is_empty() {
            let lower = word.to_lowercase();
            let first = word.chars().next().unwrap_or_default();
            let capitalized = first.is_uppercase() || (first.is_ascii_digit() && !current.is_empty());
            let connector = CONNECTORS.contains(&lower.as_str());

            let extends = if capitalized && connector {
                true
            } else if capitalized {
                !STOP_WORDS.contains(&lower.as_str()) && !is_mode_keyword(&lower)
            } else {
                connector && !current.is_empty()
            };

            if extends {
                if current.is_empty() {
                    opens_sentence = sentence_start;
                }
                current.push(word);
            } else {
                close_run(&mut current, opens_sentence, &mut runs);
            }
            sentence_start = false;
        }

        if ends_clause {
            close_run(&mut current, opens_sentence, &mut runs);
        }
        if ends_sentence {
            sentence_start = true;
        }
    }
    close_run(&mut current, opens_sentence, &mut runs);

    // Longest run wins; ties go to the earliest.
    let mut best: Option<&Vec<&str>> = None;
    for run in &runs {
        if best.map_or(true, |b| run.len() > b.len()) {
            best = Some(run);
        }
    }
    best.map(|run| run.join(" "))
}

/// A lone capitalized word opening a sentence is only capitalized because of
/// where it sits ("Nice, ...", "Wow that was good"), so it does not count.
fn close_run<'a>(
    current: &mut Vec<&'a str>,
    opens_sentence: bool,
    runs: &mut Vec<Vec<&'a str>>,
) {
    while current
        .last()
        .is_some_and(|w| CONNECTORS.contains(&w.to_lowercase().as_str()))
    {
        current.pop();
    }
    let has_name = current
        .iter()
        .any(|w| !CONNECTORS.contains(&w.to_lowercase().as_str()));
    if has_name && !(opens_sentence && current.len() == 1) {
        runs.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

fn about_phrase(message: &str) -> Option<String> {
    let caps = ABOUT_PHRASE.captures(message)?;
    let phrase = caps[1].trim();
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let first = words.first()?.to_lowercase();
    if words.len() > MAX_PHRASE_WORDS
        || REFERENCE_WORDS.contains(&first.as_str())
        || (first == "the" && words.get(1).is_some_and(|w| w.eq_ignore_ascii_case("other")))
    {
        return None;
    }
    Some(words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_keywords_win_over_everything() {
        assert_eq!(keyword_mode("What is the capital of France"), Mode::Research);
        assert_eq!(keyword_mode("search for the best movie of 2023"), Mode::Research);
        assert_eq!(keyword_mode("tell me about the new xbox game"), Mode::Research);
    }

    #[test]
    fn cinephile_beats_game() {
        assert_eq!(keyword_mode("is the movie better than the game?"), Mode::Cinephile);
        assert_eq!(keyword_mode("Bollywood films on steam"), Mode::Cinephile);
    }

    #[test]
    fn game_and_chat() {
        assert_eq!(keyword_mode("best ps5 exclusives"), Mode::Game);
        assert_eq!(keyword_mode("I love gaming"), Mode::Game);
        assert_eq!(keyword_mode("hello there"), Mode::Chat);
    }

    #[test]
    fn whole_words_only() {
        // "filmy" and "endgame" are not keywords.
        assert_eq!(keyword_mode("such a filmy endgame"), Mode::Chat);
        assert_eq!(keyword_mode("the tvs are on"), Mode::Chat);
    }

    #[test]
    fn trending_markers() {
        assert!(is_trending("recommend trending movies"));
        assert!(is_trending("what's Popular right now"));
        assert!(!is_trending("popularity contest"));
    }

    #[test]
    fn subject_from_quotes() {
        assert_eq!(
            extract_subject(r#"have you seen "the matrix" yet"#).as_deref(),
            Some("the matrix")
        );
    }

    #[test]
    fn subject_from_capitalized_run() {
        assert_eq!(extract_subject("Tell me about Oppenheimer").as_deref(), Some("Oppenheimer"));
        assert_eq!(
            extract_subject("Is Lord of the Rings worth a rewatch?").as_deref(),
            Some("Lord of the Rings")
        );
        assert_eq!(
            extract_subject("Who is Christopher Nolan").as_deref(),
            Some("Christopher Nolan")
        );
        assert_eq!(extract_subject("The Dark Knight is great").as_deref(), Some("The Dark Knight"));
    }

    #[test]
    fn mode_keywords_are_not_subjects() {
        assert_eq!(extract_subject("Recommend trending movies"), None);
        assert_eq!(extract_subject("Bollywood or Hollywood?"), None);
    }

    #[test]
    fn subject_from_about_phrase() {
        assert_eq!(
            extract_subject("tell me about oppenheimer").as_deref(),
            Some("oppenheimer")
        );
        assert_eq!(extract_subject("what is up"), None);
    }

    #[test]
    fn pronoun_follow_up_has_no_subject() {
        assert_eq!(extract_subject("is he better than the other guy?"), None);
        assert_eq!(extract_subject("tell me about him"), None);
        assert_eq!(extract_subject("what about the other guy"), None);
    }

    #[test]
    fn sentence_opening_interjection_is_not_a_subject() {
        assert_eq!(extract_subject("Nice, is he better than the other guy?"), None);
        assert_eq!(extract_subject("Really? is he better"), None);
        assert_eq!(extract_subject("Wow that was good"), None);
        assert_eq!(
            extract_subject("Wow. Is Christopher Nolan directing it?").as_deref(),
            Some("Christopher Nolan")
        );
        assert_eq!(extract_subject("Great, what about Dune").as_deref(), Some("Dune"));
    }

    #[test]
    fn entity_slot_follows_mode() {
        let v = verdict_for("Who directed Dune", Mode::Cinephile);
        assert_eq!(v.entities.movie.as_deref(), Some("Dune"));
        let v = verdict_for("is the actor Zendaya in it", Mode::Cinephile);
        assert_eq!(v.entities.person.as_deref(), Some("Zendaya"));
        let v = verdict_for("Elden Ring tips", Mode::Game);
        assert_eq!(v.entities.game.as_deref(), Some("Elden Ring"));
        let v = classify("What is the capital of France");
        assert_eq!(v.mode, Mode::Research);
        assert_eq!(v.entities.topic.as_deref(), Some("France"));
        assert!(v.suggested_sources.is_empty());
    }
}
