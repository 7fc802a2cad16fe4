use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Conversational posture. Decides which sources are consulted and which
/// fallback template family renders the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Research,
    Cinephile,
    Game,
    Chat,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Research, Mode::Cinephile, Mode::Game, Mode::Chat];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Research => "research",
            Mode::Cinephile => "cinephile",
            Mode::Game => "game",
            Mode::Chat => "chat",
        }
    }

    /// The data source a mode always consults, if any.
    pub fn implied_source(self) -> Option<SourceKind> {
        match self {
            Mode::Research => Some(SourceKind::WebSearch),
            Mode::Cinephile => Some(SourceKind::Movies),
            Mode::Game => Some(SourceKind::Games),
            Mode::Chat => None,
        }
    }

    /// Parse a caller-supplied mode selection. `"auto"` and the empty string
    /// mean "let the classifier decide" and yield `None`.
    pub fn parse_selection(raw: &str) -> Result<Option<Mode>, UnknownMode> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown mode \"{0}\" (expected research, cinephile, game, chat or auto)")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// One external data adapter family the aggregator can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Movies,
    People,
    Games,
    WebSearch,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Movies => "movies",
            SourceKind::People => "people",
            SourceKind::Games => "games",
            SourceKind::WebSearch => "web_search",
        }
    }

    /// Map a loosely named source hint (as a model might phrase it) to a kind.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "movies" | "movie" | "tmdb" | "films" | "film" => Some(SourceKind::Movies),
            "people" | "person" | "actors" | "cast" => Some(SourceKind::People),
            "games" | "game" | "rawg" => Some(SourceKind::Games),
            "web_search" | "web" | "search" | "serper" | "google" => Some(SourceKind::WebSearch),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Cinephile".parse::<Mode>().unwrap(), Mode::Cinephile);
        assert_eq!(" GAME ".parse::<Mode>().unwrap(), Mode::Game);
        assert!("movies".parse::<Mode>().is_err());
    }

    #[test]
    fn auto_is_not_a_mode() {
        assert!("auto".parse::<Mode>().is_err());
        assert_eq!(Mode::parse_selection("auto").unwrap(), None);
        assert_eq!(Mode::parse_selection("").unwrap(), None);
        assert_eq!(Mode::parse_selection("research").unwrap(), Some(Mode::Research));
        assert!(Mode::parse_selection("anime").is_err());
    }

    #[test]
    fn chat_implies_no_source() {
        assert_eq!(Mode::Chat.implied_source(), None);
        assert_eq!(Mode::Cinephile.implied_source(), Some(SourceKind::Movies));
    }

    #[test]
    fn source_hints_accept_vendor_names() {
        assert_eq!(SourceKind::from_hint("TMDB"), Some(SourceKind::Movies));
        assert_eq!(SourceKind::from_hint("rawg"), Some(SourceKind::Games));
        assert_eq!(SourceKind::from_hint("serper"), Some(SourceKind::WebSearch));
        assert_eq!(SourceKind::from_hint("weather"), None);
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Game).unwrap(), "\"game\"");
    }
}
