use serde::Serialize;

/// Structured trace events emitted across all chatmux crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    TurnClassified {
        conversation_id: String,
        mode: String,
        strategy: String,
        topic: Option<String>,
        topic_changed: bool,
    },
    SourceCall {
        source: String,
        variant: String,
        attempt: u32,
        ok: bool,
        duration_ms: u64,
    },
    SourceGaveUp {
        source: String,
        variant: String,
        attempts: u32,
        reason: String,
    },
    LlmRequest {
        provider: String,
        model: String,
        purpose: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    SynthesisFallback {
        mode: String,
        reason: String,
    },
    TurnCompleted {
        conversation_id: String,
        mode: String,
        generation: String,
        persisted: bool,
        duration_ms: u64,
    },
    ConversationCreated {
        conversation_id: String,
    },
    ConversationDeleted {
        conversation_id: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "cm_event");
    }
}
