use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn pipeline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Conversation turns replayed into the reply prompt.
    #[serde(default = "d_6")]
    pub history_turns: usize,
    /// Model replies shorter than this (in chars, trimmed) are discarded.
    #[serde(default = "d_20")]
    pub min_reply_chars: usize,
    /// Use the model to detect the mode when the caller asks for auto mode.
    #[serde(default = "d_true")]
    pub model_classification: bool,
    /// Fixed seed for fallback template selection. Unset means entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Characters of the first message kept as the conversation title.
    #[serde(default = "d_50")]
    pub title_chars: usize,
    #[serde(default)]
    pub display: DisplayCaps,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_turns: 6,
            min_reply_chars: 20,
            model_classification: true,
            seed: None,
            title_chars: 50,
            display: DisplayCaps::default(),
        }
    }
}

/// Per-field caps applied when context is serialized into a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayCaps {
    #[serde(default = "d_6")]
    pub movies: usize,
    #[serde(default = "d_5")]
    pub people: usize,
    #[serde(default = "d_6")]
    pub games: usize,
    #[serde(default = "d_5")]
    pub search_hits: usize,
}

impl Default for DisplayCaps {
    fn default() -> Self {
        Self {
            movies: 6,
            people: 5,
            games: 6,
            search_hits: 5,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_true() -> bool {
    true
}
fn d_5() -> usize {
    5
}
fn d_6() -> usize {
    6
}
fn d_20() -> usize {
    20
}
fn d_50() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_optional() {
        let cfg: PipelineConfig = toml::from_str("seed = 7").unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.history_turns, 6);

        let cfg: PipelineConfig = toml::from_str("").unwrap();
        assert!(cfg.seed.is_none());
    }
}
