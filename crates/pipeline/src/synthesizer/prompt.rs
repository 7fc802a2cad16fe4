//! Reply prompt construction and response cleanup for the model path.

use cm_domain::config::DisplayCaps;
use cm_domain::context::ContextBag;
use cm_domain::conversation::{Role, Turn};

pub const PERSONA: &str = "\
You are Mux, a warm, witty chat companion who speaks casual English sprinkled with Hinglish \
(yaar, arre, achha) when it fits. You love movies, TV and video games, and you can also look \
things up. Keep replies conversational and concise. Use the reference data below when it is \
relevant, never invent ratings or release dates, and when the user refers to \"he\", \"she\", \
\"it\" or \"that\" without naming anything, assume they mean the current topic.";

const OVERVIEW_CHARS: usize = 200;
const TURN_CHARS: usize = 500;

/// First words that make a message a question.
const QUESTION_OPENERS: &[&str] = &[
    "what", "who", "whom", "whose", "where", "when", "why", "how", "which", "is", "are", "was",
    "were", "do", "does", "did", "can", "could", "should", "would", "will", "shall", "may",
    "might", "have", "has", "compare", "better", "worse", "versus",
];

/// Labels a model sometimes echoes back at the start of its reply.
const ECHO_LABELS: &[&str] = &["assistant:", "mux:", "response:", "reply:", "answer:"];

/// Build the single prompt sent for one reply.
pub fn build_prompt(
    message: &str,
    context: &ContextBag,
    recent: &[Turn],
    topic: Option<&str>,
    caps: &DisplayCaps,
) -> String {
    let mut prompt = String::from(PERSONA);

    let reference = context_summary(context, caps);
    if !reference.is_empty() {
        prompt.push_str("\n\nReference data:\n");
        prompt.push_str(&reference);
    }

    if let Some(topic) = topic {
        prompt.push_str("\n\nCurrent topic: ");
        prompt.push_str(topic);
    }

    let dialogue: Vec<&Turn> = recent.iter().filter(|t| t.role.is_dialogue()).collect();
    if !dialogue.is_empty() {
        prompt.push_str("\n\nConversation so far:");
        for turn in dialogue {
            let speaker = if turn.role == Role::User { "User" } else { "Assistant" };
            prompt.push_str(&format!("\n{speaker}: {}", clip(&turn.content, TURN_CHARS)));
        }
    }

    prompt.push_str("\n\nUser: ");
    prompt.push_str(&normalize_question(message));
    prompt.push_str("\nAssistant:");
    prompt
}

/// One line per item, capped per field. Empty fields are skipped.
pub fn context_summary(context: &ContextBag, caps: &DisplayCaps) -> String {
    let mut sections: Vec<String> = Vec::new();

    let movies = context.movies();
    if !movies.is_empty() {
        let mut s = String::from("Movies:");
        for m in movies.iter().take(caps.movies) {
            s.push_str(&format!("\n- {}", m.title));
            if let Some(year) = m.year() {
                s.push_str(&format!(" ({year})"));
            }
            s.push_str(&format!(", rated {:.1}/10", m.vote_average));
            if let Some(overview) = &m.overview {
                s.push_str(&format!(": {}", clip(overview, OVERVIEW_CHARS)));
            }
        }
        sections.push(s);
    }

    let people = context.people();
    if !people.is_empty() {
        let mut s = String::from("People:");
        for p in people.iter().take(caps.people) {
            s.push_str(&format!("\n- {}", p.name));
            if let Some(dept) = &p.known_for_department {
                s.push_str(&format!(" ({dept})"));
            }
            if !p.known_for.is_empty() {
                s.push_str(&format!(", known for {}", p.known_for.join(", ")));
            }
        }
        sections.push(s);
    }

    let games = context.games();
    if !games.is_empty() {
        let mut s = String::from("Games:");
        for g in games.iter().take(caps.games) {
            s.push_str(&format!("\n- {}, rated {:.1}/5", g.name, g.rating));
            if let Some(released) = &g.released {
                s.push_str(&format!(", released {released}"));
            }
            if !g.platforms.is_empty() {
                s.push_str(&format!(", on {}", g.platforms.join(", ")));
            }
        }
        sections.push(s);
    }

    let hits = context.search_results();
    if !hits.is_empty() {
        let mut s = String::from("Web results:");
        for h in hits.iter().take(caps.search_hits) {
            s.push_str(&format!("\n- {} ({}): {} <{}>", h.title, h.source, h.snippet, h.link));
        }
        sections.push(s);
    }

    sections.join("\n\n")
}

/// Append "?" to a message that opens like a question but has no terminal
/// punctuation.
pub fn normalize_question(message: &str) -> String {
    let trimmed = message.trim();
    let first = trimmed
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .unwrap_or_default();
    let opens_question = QUESTION_OPENERS.contains(&first.as_str());
    let terminated = trimmed.ends_with(['.', '!', '?', '…']);
    if opens_question && !terminated {
        format!("{trimmed}?")
    } else {
        trimmed.to_string()
    }
}

/// Remove echoed speaker labels from the start of a model reply.
pub fn strip_echoed_labels(text: &str) -> &str {
    let mut rest = text.trim();
    loop {
        let lower = rest.get(..16).unwrap_or(rest).to_ascii_lowercase();
        match ECHO_LABELS.iter().find(|label| lower.starts_with(*label)) {
            Some(label) => rest = rest[label.len()..].trim_start(),
            None => return rest,
        }
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_domain::context::{MovieSummary, SearchHit};
    use cm_domain::conversation::NewTurn;
    use uuid::Uuid;

    #[test]
    fn question_mark_added_for_interrogative_openers() {
        assert_eq!(normalize_question("what is the capital of France"), "what is the capital of France?");
        assert_eq!(normalize_question("  Is he better  "), "Is he better?");
        assert_eq!(normalize_question("Compare Dune and Arrival"), "Compare Dune and Arrival?");
    }

    #[test]
    fn question_mark_not_doubled_or_invented() {
        assert_eq!(normalize_question("who is she?"), "who is she?");
        assert_eq!(normalize_question("how cool is that!"), "how cool is that!");
        assert_eq!(normalize_question("recommend a movie"), "recommend a movie");
        assert_eq!(normalize_question(""), "");
    }

    #[test]
    fn strips_stacked_labels() {
        assert_eq!(strip_echoed_labels("Assistant: Mux: Hey there"), "Hey there");
        assert_eq!(strip_echoed_labels("  RESPONSE:  ok"), "ok");
        assert_eq!(strip_echoed_labels("Answering your question"), "Answering your question");
    }

    #[test]
    fn strip_handles_multibyte_prefix() {
        assert_eq!(strip_echoed_labels("🎬🎬🎬🎬🎬 movies"), "🎬🎬🎬🎬🎬 movies");
    }

    #[test]
    fn summary_respects_caps_and_skips_empty_fields() {
        let mut bag = ContextBag::default();
        bag.set_movies(
            (0..10)
                .map(|i| MovieSummary {
                    id: i,
                    title: format!("Film {i}"),
                    overview: None,
                    release_date: None,
                    vote_average: 7.0,
                    poster_path: None,
                })
                .collect(),
        );
        let summary = context_summary(&bag, &DisplayCaps::default());
        assert!(summary.contains("Film 5"));
        assert!(!summary.contains("Film 6"));
        assert!(!summary.contains("Games:"));
        assert!(!summary.contains("Web results:"));
    }

    #[test]
    fn prompt_sections_in_order() {
        let id = Uuid::new_v4();
        let mut bag = ContextBag::default();
        bag.set_search_results(vec![SearchHit {
            title: "Paris".into(),
            link: "https://example.org/paris".into(),
            snippet: "Capital of France".into(),
            source: "example.org".into(),
        }]);
        let recent = vec![
            NewTurn::user("hi").into_turn(id),
        ];
        let prompt = build_prompt(
            "what is the capital of France",
            &bag,
            &recent,
            Some("France"),
            &DisplayCaps::default(),
        );
        let persona = prompt.find("You are Mux").unwrap();
        let data = prompt.find("Web results:").unwrap();
        let topic = prompt.find("Current topic: France").unwrap();
        let history = prompt.find("User: hi").unwrap();
        let question = prompt.find("User: what is the capital of France?").unwrap();
        assert!(persona < data && data < topic && topic < history && history < question);
        assert!(prompt.ends_with("Assistant:"));
    }
}
