use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{ContextBag, GameSummary, MovieSummary, PersonSummary, SearchHit};
use crate::mode::Mode;

pub const DEFAULT_TITLE: &str = "New Chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    /// Last established subject; overwritten, never stacked.
    #[serde(default)]
    pub current_topic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            current_topic: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Roles that take part in the dialogue window.
    pub fn is_dialogue(self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }
}

/// Which path produced an assistant reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    Model,
    Fallback,
}

impl Generation {
    pub fn as_str(self) -> &'static str {
        match self {
            Generation::Model => "model",
            Generation::Fallback => "fallback",
        }
    }
}

/// Audit record attached to assistant turns. Display only: classification
/// never reads it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub mode: Mode,
    pub generation: Generation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SearchHit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub movies: Vec<MovieSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub games: Vec<GameSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub people: Vec<PersonSummary>,
    pub generated_at: DateTime<Utc>,
}

impl TurnMetadata {
    pub fn from_context(mode: Mode, generation: Generation, context: &ContextBag) -> Self {
        Self {
            mode,
            generation,
            sources: context.search_results().to_vec(),
            movies: context.movies().to_vec(),
            games: context.games().to_vec(),
            people: context.people().to_vec(),
            generated_at: Utc::now(),
        }
    }
}

/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TurnMetadata>,
}

/// Input for appending a turn; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub role: Role,
    pub content: String,
    pub metadata: Option<TurnMetadata>,
}

impl NewTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            metadata: None,
        }
    }

    pub fn assistant(content: impl Into<String>, metadata: TurnMetadata) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            metadata: Some(metadata),
        }
    }

    pub fn into_turn(self, conversation_id: Uuid) -> Turn {
        Turn {
            id: Uuid::new_v4(),
            conversation_id,
            role: self.role,
            content: self.content,
            created_at: Utc::now(),
            metadata: self.metadata,
        }
    }
}

/// Partial update. `current_topic: Some(None)` clears the topic.
#[derive(Debug, Clone, Default)]
pub struct ConversationUpdate {
    pub current_topic: Option<Option<String>>,
    pub title: Option<String>,
}

impl ConversationUpdate {
    pub fn apply(self, conversation: &mut Conversation) {
        if let Some(topic) = self.current_topic {
            conversation.current_topic = topic;
        }
        if let Some(title) = self.title {
            conversation.title = title;
        }
        conversation.updated_at = Utc::now();
    }
}

/// Title derived from the first user message: the first `max_chars`
/// characters, with "..." appended when truncated.
pub fn title_from_message(message: &str, max_chars: usize) -> String {
    let trimmed = message.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", head.trim_end())
}
