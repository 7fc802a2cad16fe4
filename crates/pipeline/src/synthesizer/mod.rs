//! Response Synthesizer: one model attempt, deterministic templates second.

pub mod fallback;
pub mod prompt;
pub mod templates;

use std::sync::Arc;

use cm_domain::config::DisplayCaps;
use cm_domain::context::ContextBag;
use cm_domain::conversation::{Generation, Turn};
use cm_domain::mode::Mode;
use cm_domain::trace::TraceEvent;
use cm_providers::{CompletionRequest, GenerationConfig, LlmProvider};

pub use fallback::{chat_category, game_tier, movie_tier, ChatCategory, FallbackSynthesizer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub text: String,
    pub generation: Generation,
}

pub struct ResponseSynthesizer {
    llm: Option<Arc<dyn LlmProvider>>,
    generation: GenerationConfig,
    caps: DisplayCaps,
    min_reply_chars: usize,
    fallback: FallbackSynthesizer,
}

impl ResponseSynthesizer {
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        generation: GenerationConfig,
        caps: DisplayCaps,
        min_reply_chars: usize,
        fallback: FallbackSynthesizer,
    ) -> Self {
        Self {
            llm,
            generation,
            caps,
            min_reply_chars,
            fallback,
        }
    }

    /// Produce the reply for one turn. Always non-empty.
    ///
    /// The model is asked once; an adapter error, an empty candidate or a
    /// reply shorter than `min_reply_chars` switches to the templates.
    pub async fn synthesize(
        &self,
        mode: Mode,
        message: &str,
        context: &ContextBag,
        recent: &[Turn],
        topic: Option<&str>,
    ) -> Synthesis {
        let reason = match &self.llm {
            None => "model unavailable".to_string(),
            Some(llm) => match self.ask_model(llm.as_ref(), message, context, recent, topic).await {
                Ok(text) => {
                    return Synthesis {
                        text,
                        generation: Generation::Model,
                    }
                }
                Err(reason) => reason,
            },
        };

        tracing::info!(mode = %mode, reason = %reason, "using fallback reply");
        TraceEvent::SynthesisFallback {
            mode: mode.as_str().to_owned(),
            reason,
        }
        .emit();

        Synthesis {
            text: self.fallback.render(mode, message, context),
            generation: Generation::Fallback,
        }
    }

    async fn ask_model(
        &self,
        llm: &dyn LlmProvider,
        message: &str,
        context: &ContextBag,
        recent: &[Turn],
        topic: Option<&str>,
    ) -> Result<String, String> {
        let req = CompletionRequest {
            prompt: prompt::build_prompt(message, context, recent, topic, &self.caps),
            generation: self.generation.clone(),
            json_mode: false,
            purpose: "reply",
        };
        let resp = llm.complete(&req).await.map_err(|e| e.to_string())?;
        let text = prompt::strip_echoed_labels(&resp.text);
        let chars = text.chars().count();
        if chars < self.min_reply_chars.max(1) {
            return Err(format!("reply too short ({chars} chars)"));
        }
        Ok(text.to_string())
    }
}
