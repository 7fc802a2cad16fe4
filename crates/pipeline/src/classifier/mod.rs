//! Intent Classifier: decides the turn's [`Mode`], extracts entity hints and
//! maintains the conversation's current topic.
//!
//! Two strategies:
//! - **keyword** ([`keywords`]): deterministic, infallible;
//! - **model** ([`model`]): a JSON-mode completion, used only for automatic
//!   mode detection and falling back to keywords on any failure.

pub mod json;
pub mod keywords;
mod model;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cm_domain::conversation::Turn;
use cm_domain::mode::{Mode, SourceKind};
use cm_providers::{CompletionRequest, GenerationConfig, LlmProvider};

pub use json::extract_json_object;
pub use keywords::{extract_subject, is_trending, keyword_mode};

/// Named entities hinted by the message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl Entities {
    /// The named subject, checked movie, game, person, then topic.
    pub fn subject(&self) -> Option<&str> {
        self.movie
            .as_deref()
            .or(self.game.as_deref())
            .or(self.person.as_deref())
            .or(self.topic.as_deref())
    }
}

/// Which strategy produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Mode given by the caller; entities from keywords.
    Explicit,
    Keyword,
    Model,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Explicit => "explicit",
            Strategy::Keyword => "keyword",
            Strategy::Model => "model",
        }
    }
}

/// Raw output of one strategy, before topic continuity is applied.
#[derive(Debug, Clone)]
pub(crate) struct Verdict {
    pub mode: Mode,
    pub entities: Entities,
    pub suggested_sources: BTreeSet<SourceKind>,
    pub question_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub mode: Mode,
    pub entities: Entities,
    /// Extra sources suggested by the model strategy; empty otherwise.
    pub suggested_sources: BTreeSet<SourceKind>,
    pub question_type: Option<String>,
    /// Current topic after this message.
    pub topic: Option<String>,
    /// Whether `topic` differs from the topic before this message.
    pub topic_changed: bool,
    pub strategy: Strategy,
}

/// Apply the topic continuity rule: a new named subject replaces the
/// current topic, anything else keeps it.
pub fn resolve_topic(current: Option<&str>, subject: Option<&str>) -> (Option<String>, bool) {
    match subject {
        Some(s) if current.map_or(true, |c| !c.eq_ignore_ascii_case(s)) => (Some(s.to_string()), true),
        _ => (current.map(str::to_string), false),
    }
}

fn finish(verdict: Verdict, strategy: Strategy, current_topic: Option<&str>) -> Classification {
    let (topic, topic_changed) = resolve_topic(current_topic, verdict.entities.subject());
    Classification {
        mode: verdict.mode,
        entities: verdict.entities,
        suggested_sources: verdict.suggested_sources,
        question_type: verdict.question_type,
        topic,
        topic_changed,
        strategy,
    }
}

/// Keyword-only classification. Never fails.
pub fn classify_keywords(message: &str, current_topic: Option<&str>) -> Classification {
    finish(keywords::classify(message), Strategy::Keyword, current_topic)
}

pub struct IntentClassifier {
    llm: Option<Arc<dyn LlmProvider>>,
    generation: GenerationConfig,
    model_enabled: bool,
}

impl IntentClassifier {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, generation: GenerationConfig) -> Self {
        Self {
            llm,
            generation,
            model_enabled: true,
        }
    }

    pub fn keyword_only() -> Self {
        Self {
            llm: None,
            generation: GenerationConfig::default(),
            model_enabled: false,
        }
    }

    pub fn with_model_classification(mut self, enabled: bool) -> Self {
        self.model_enabled = enabled;
        self
    }

    /// Classify one message.
    ///
    /// With an `explicit_mode` the mode is fixed and only entities are
    /// extracted. Without one, the model strategy runs when a provider is
    /// available, falling back to keywords on any adapter or parse failure.
    pub async fn classify(
        &self,
        message: &str,
        recent: &[Turn],
        current_topic: Option<&str>,
        explicit_mode: Option<Mode>,
    ) -> Classification {
        if let Some(mode) = explicit_mode {
            return finish(keywords::verdict_for(message, mode), Strategy::Explicit, current_topic);
        }

        let llm = match &self.llm {
            Some(llm) if self.model_enabled => llm,
            _ => return classify_keywords(message, current_topic),
        };

        match self.classify_with_model(llm.as_ref(), message, recent, current_topic).await {
            Ok(verdict) => finish(verdict, Strategy::Model, current_topic),
            Err(reason) => {
                tracing::warn!(reason = %reason, "model classification failed, using keywords");
                classify_keywords(message, current_topic)
            }
        }
    }

    async fn classify_with_model(
        &self,
        llm: &dyn LlmProvider,
        message: &str,
        recent: &[Turn],
        current_topic: Option<&str>,
    ) -> Result<Verdict, String> {
        let req = CompletionRequest {
            prompt: model::build_prompt(message, recent, current_topic),
            generation: self.generation.clone(),
            json_mode: true,
            purpose: "classify",
        };
        let resp = llm.complete(&req).await.map_err(|e| e.to_string())?;
        tracing::debug!(raw = %resp.text, "classification response");
        model::parse_verdict(&resp.text).map_err(|e| e.to_string())
    }
}
