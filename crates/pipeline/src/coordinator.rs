//! Turn coordinator: one message in, one reply out.
//!
//! classify → gather → synthesize, sequentially, under the conversation's
//! run lock. Nothing is written until the reply exists; then the user turn,
//! the assistant turn and the topic/title update are persisted together.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use cm_domain::config::Config;
use cm_domain::context::ContextBag;
use cm_domain::conversation::{
    title_from_message, Conversation, ConversationUpdate, Generation, NewTurn, Turn, TurnMetadata,
};
use cm_domain::error::Error;
use cm_domain::mode::Mode;
use cm_domain::trace::TraceEvent;
use cm_providers::{GenerationConfig, LlmProvider};
use cm_sessions::{ConversationState, ConversationStore};
use cm_sources::{RetryPolicy, SourceSet};

use crate::aggregator::ContextAggregator;
use crate::classifier::{Classification, IntentClassifier};
use crate::lock::{ConversationBusy, ConversationLocks};
use crate::synthesizer::{FallbackSynthesizer, ResponseSynthesizer};

#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub conversation_id: Uuid,
    pub message: String,
    /// `None` means automatic mode detection.
    pub explicit_mode: Option<Mode>,
}

/// What the user gets back, persisted or not.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub conversation_id: Uuid,
    pub mode: Mode,
    pub generation: Generation,
    pub text: String,
    pub topic: Option<String>,
    pub context: ContextBag,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: Reply,
    pub classification: Classification,
    pub user_turn: Turn,
    pub assistant_turn: Turn,
    pub conversation: Conversation,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("conversation {0} not found")]
    ConversationNotFound(Uuid),

    #[error(transparent)]
    Busy(#[from] ConversationBusy),

    /// Nothing was persisted; the turn can be retried as a whole.
    #[error("turn failed: {0}")]
    Processing(#[source] Error),

    /// The reply exists but the turn log does not have it.
    #[error("reply generated but not saved: {source}")]
    NotPersisted {
        reply: Box<Reply>,
        #[source]
        source: Error,
    },
}

pub struct TurnCoordinator {
    state: ConversationState,
    classifier: IntentClassifier,
    aggregator: ContextAggregator,
    synthesizer: ResponseSynthesizer,
    locks: ConversationLocks,
    history_turns: usize,
    title_chars: usize,
}

impl TurnCoordinator {
    pub fn new(
        state: ConversationState,
        classifier: IntentClassifier,
        aggregator: ContextAggregator,
        synthesizer: ResponseSynthesizer,
        history_turns: usize,
        title_chars: usize,
    ) -> Self {
        Self {
            state,
            classifier,
            aggregator,
            synthesizer,
            locks: ConversationLocks::new(),
            history_turns,
            title_chars,
        }
    }

    /// Wire every stage from config. `llm` is `None` when the model is
    /// disabled or has no credential; both stages then use their
    /// deterministic paths.
    pub fn from_config(
        cfg: &Config,
        store: Arc<dyn ConversationStore>,
        llm: Option<Arc<dyn LlmProvider>>,
        sources: SourceSet,
    ) -> Self {
        let p = &cfg.pipeline;
        let classifier = IntentClassifier::new(
            llm.clone(),
            GenerationConfig::from(&cfg.llm.classification),
        )
        .with_model_classification(p.model_classification);
        let aggregator =
            ContextAggregator::new(sources, RetryPolicy::from_config(&cfg.sources));
        let synthesizer = ResponseSynthesizer::new(
            llm,
            GenerationConfig::from(&cfg.llm.generation),
            p.display.clone(),
            p.min_reply_chars,
            FallbackSynthesizer::new(p.seed, p.display.clone()),
        );
        Self::new(
            ConversationState::new(store),
            classifier,
            aggregator,
            synthesizer,
            p.history_turns,
            p.title_chars,
        )
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        self.state.store()
    }

    pub fn sources(&self) -> &SourceSet {
        self.aggregator.sources()
    }

    pub fn locks(&self) -> &ConversationLocks {
        &self.locks
    }

    /// Process one message end to end.
    pub async fn handle_message(&self, req: TurnRequest) -> Result<TurnOutcome, TurnError> {
        let message = req.message.trim();
        if message.is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        let id = req.conversation_id;
        // Unknown ids never get a lock slot.
        self.load_conversation(id).await?;

        let permit = self.locks.acquire(id).await?;
        let result = self.run_turn(id, message, req.explicit_mode).await;
        drop(permit);
        self.locks.prune_idle();
        result
    }

    async fn load_conversation(&self, id: Uuid) -> Result<Conversation, TurnError> {
        self.store()
            .get_conversation(id)
            .await
            .map_err(TurnError::Processing)?
            .ok_or(TurnError::ConversationNotFound(id))
    }

    /// The turn proper; runs with the conversation's permit held.
    async fn run_turn(
        &self,
        id: Uuid,
        message: &str,
        explicit_mode: Option<Mode>,
    ) -> Result<TurnOutcome, TurnError> {
        let start = Instant::now();
        // Reload under the lock: the previous turn may have moved the topic.
        let conversation = self.load_conversation(id).await?;
        let recent = self
            .state
            .recent_turns(id, self.history_turns)
            .await
            .map_err(TurnError::Processing)?;
        let first_exchange = recent.is_empty();

        let classification = self
            .classifier
            .classify(
                message,
                &recent,
                conversation.current_topic.as_deref(),
                explicit_mode,
            )
            .await;
        TraceEvent::TurnClassified {
            conversation_id: id.to_string(),
            mode: classification.mode.as_str().to_owned(),
            strategy: classification.strategy.as_str().to_owned(),
            topic: classification.topic.clone(),
            topic_changed: classification.topic_changed,
        }
        .emit();

        let mode = classification.mode;
        let context = self
            .aggregator
            .gather(mode, message, &classification.suggested_sources)
            .await;
        let synthesis = self
            .synthesizer
            .synthesize(
                mode,
                message,
                &context,
                &recent,
                classification.topic.as_deref(),
            )
            .await;

        let reply = Reply {
            conversation_id: id,
            mode,
            generation: synthesis.generation,
            text: synthesis.text,
            topic: classification.topic.clone(),
            context,
        };

        let title = (first_exchange && conversation.has_default_title())
            .then(|| title_from_message(message, self.title_chars));
        let persisted = self
            .persist(id, message, &reply, classification.topic_changed, title)
            .await;

        TraceEvent::TurnCompleted {
            conversation_id: id.to_string(),
            mode: mode.as_str().to_owned(),
            generation: reply.generation.as_str().to_owned(),
            persisted: persisted.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
        }
        .emit();

        match persisted {
            Ok((user_turn, assistant_turn, conversation)) => Ok(TurnOutcome {
                reply,
                classification,
                user_turn,
                assistant_turn,
                conversation,
            }),
            Err(source) => {
                tracing::error!(conversation_id = %id, error = %source, "turn not persisted");
                Err(TurnError::NotPersisted {
                    reply: Box::new(reply),
                    source,
                })
            }
        }
    }

    async fn persist(
        &self,
        id: Uuid,
        message: &str,
        reply: &Reply,
        topic_changed: bool,
        title: Option<String>,
    ) -> Result<(Turn, Turn, Conversation), Error> {
        let metadata = TurnMetadata::from_context(reply.mode, reply.generation, &reply.context);
        let turns = vec![
            NewTurn::user(message),
            NewTurn::assistant(reply.text.clone(), metadata),
        ];
        let update = ConversationUpdate {
            current_topic: topic_changed.then(|| reply.topic.clone()),
            title,
        };
        let (turns, conversation) = self.state.commit_exchange(id, turns, update).await?;
        let mut turns = turns.into_iter();
        let (Some(user_turn), Some(assistant_turn)) = (turns.next(), turns.next()) else {
            return Err(Error::Storage("store returned an incomplete exchange".into()));
        };
        Ok((user_turn, assistant_turn, conversation))
    }
}
