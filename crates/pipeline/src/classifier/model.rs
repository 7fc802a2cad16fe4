//! Model-assisted strategy: one JSON-mode completion, parsed defensively.

use std::collections::BTreeSet;

use serde::Deserialize;

use cm_domain::conversation::{Role, Turn};
use cm_domain::mode::{Mode, SourceKind, UnknownMode};

use super::json::extract_json_object;
use super::{Entities, Verdict};

/// Longest slice of a previous turn replayed into the classification prompt.
const TURN_EXCERPT_CHARS: usize = 300;

const INSTRUCTIONS: &str = "\
Classify the user's latest message for a chat assistant with four modes:
- research: factual questions, news, anything that needs a web search
- cinephile: movies, TV shows, actors, directors
- game: video games, consoles, gaming
- chat: small talk and everything else

Reply with a single JSON object and nothing else:
{\"mode\": \"research|cinephile|game|chat\", \"entities\": {\"movie\": null, \"game\": null, \"person\": null, \"topic\": null}, \"apis\": [\"tmdb\", \"rawg\", \"serper\"], \"questionType\": \"short label\"}

Fill an entity only with a name that appears in or is clearly referred to by the message. List in \"apis\" only the data sources worth calling.";

pub(crate) fn build_prompt(message: &str, recent: &[Turn], current_topic: Option<&str>) -> String {
    let mut prompt = String::from(INSTRUCTIONS);

    if let Some(topic) = current_topic {
        prompt.push_str("\n\nCurrent topic: ");
        prompt.push_str(topic);
    }

    if !recent.is_empty() {
        prompt.push_str("\n\nRecent conversation:");
        for turn in recent {
            let speaker = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
                Role::System => continue,
            };
            let excerpt: String = turn.content.chars().take(TURN_EXCERPT_CHARS).collect();
            prompt.push_str(&format!("\n{speaker}: {excerpt}"));
        }
    }

    prompt.push_str("\n\nMessage: ");
    prompt.push_str(message.trim());
    prompt
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum VerdictError {
    #[error("no JSON object in model output")]
    NoObject,
    #[error("malformed classification JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    UnknownMode(#[from] UnknownMode),
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    mode: String,
    #[serde(default)]
    entities: Option<RawEntities>,
    #[serde(default)]
    apis: Option<Vec<String>>,
    #[serde(default, rename = "questionType", alias = "question_type")]
    question_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
    movie: Option<String>,
    game: Option<String>,
    person: Option<String>,
    topic: Option<String>,
}

/// Parse model output into a verdict. Unknown source names are ignored;
/// an unknown mode (including "auto") is an error.
pub(crate) fn parse_verdict(text: &str) -> Result<Verdict, VerdictError> {
    let object = extract_json_object(text).ok_or(VerdictError::NoObject)?;
    let raw: RawVerdict = serde_json::from_str(object)?;
    let mode: Mode = raw.mode.parse()?;

    let entities = raw.entities.unwrap_or_default();
    let suggested_sources: BTreeSet<SourceKind> = raw
        .apis
        .unwrap_or_default()
        .iter()
        .filter_map(|hint| SourceKind::from_hint(hint))
        .collect();

    Ok(Verdict {
        mode,
        entities: Entities {
            movie: clean(entities.movie),
            game: clean(entities.game),
            person: clean(entities.person),
            topic: clean(entities.topic),
        },
        suggested_sources,
        question_type: clean(raw.question_type),
    })
}

/// Blank strings and the literal "null" some models emit count as absent.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null") && !v.eq_ignore_ascii_case("none"))
}
