//! Conversation persistence collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use cm_domain::conversation::{Conversation, ConversationUpdate, NewTurn, Turn};
use cm_domain::error::{Error, Result};
use cm_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Storage for conversations and their turns. The turn pipeline only needs
/// `get_conversation`, `list_turns` and `commit_exchange`; the rest serves
/// the HTTP API and tools.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, title: Option<String>) -> Result<Conversation>;

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    /// Most recently updated first.
    async fn list_conversations(&self) -> Result<Vec<Conversation>>;

    /// Fails with [`Error::NotFound`] for unknown ids.
    async fn update_conversation(&self, id: Uuid, update: ConversationUpdate)
        -> Result<Conversation>;

    /// Removes the conversation and its turns. `false` if it did not exist.
    async fn delete_conversation(&self, id: Uuid) -> Result<bool>;

    /// Appends a turn and bumps the conversation's `updated_at`.
    async fn create_turn(&self, conversation_id: Uuid, turn: NewTurn) -> Result<Turn>;

    /// All turns in append order.
    async fn list_turns(&self, conversation_id: Uuid) -> Result<Vec<Turn>>;

    /// Append `turns` and apply `update` as one unit: either all of it is
    /// stored or none of it is.
    async fn commit_exchange(
        &self,
        conversation_id: Uuid,
        turns: Vec<NewTurn>,
        update: ConversationUpdate,
    ) -> Result<(Vec<Turn>, Conversation)>;
}

pub(crate) fn not_found(id: Uuid) -> Error {
    Error::NotFound(format!("conversation {id}"))
}

pub(crate) fn sort_recent_first(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Entry {
    conversation: Conversation,
    turns: Vec<Turn>,
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<Uuid, Entry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn create_conversation(&self, title: Option<String>) -> Result<Conversation> {
        let conversation = Conversation::new(title);
        self.entries.write().insert(
            conversation.id,
            Entry {
                conversation: conversation.clone(),
                turns: Vec::new(),
            },
        );
        TraceEvent::ConversationCreated {
            conversation_id: conversation.id.to_string(),
        }
        .emit();
        Ok(conversation)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self
            .entries
            .read()
            .get(&id)
            .map(|e| e.conversation.clone()))
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let mut all: Vec<Conversation> = self
            .entries
            .read()
            .values()
            .map(|e| e.conversation.clone())
            .collect();
        sort_recent_first(&mut all);
        Ok(all)
    }

    async fn update_conversation(
        &self,
        id: Uuid,
        update: ConversationUpdate,
    ) -> Result<Conversation> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(&id).ok_or_else(|| not_found(id))?;
        update.apply(&mut entry.conversation);
        Ok(entry.conversation.clone())
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let removed = self.entries.write().remove(&id).is_some();
        if removed {
            TraceEvent::ConversationDeleted {
                conversation_id: id.to_string(),
            }
            .emit();
        }
        Ok(removed)
    }

    async fn create_turn(&self, conversation_id: Uuid, turn: NewTurn) -> Result<Turn> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&conversation_id)
            .ok_or_else(|| not_found(conversation_id))?;
        let turn = turn.into_turn(conversation_id);
        entry.turns.push(turn.clone());
        entry.conversation.updated_at = Utc::now();
        Ok(turn)
    }

    async fn list_turns(&self, conversation_id: Uuid) -> Result<Vec<Turn>> {
        Ok(self
            .entries
            .read()
            .get(&conversation_id)
            .map(|e| e.turns.clone())
            .unwrap_or_default())
    }

    async fn commit_exchange(
        &self,
        conversation_id: Uuid,
        turns: Vec<NewTurn>,
        update: ConversationUpdate,
    ) -> Result<(Vec<Turn>, Conversation)> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&conversation_id)
            .ok_or_else(|| not_found(conversation_id))?;
        let turns: Vec<Turn> = turns
            .into_iter()
            .map(|t| t.into_turn(conversation_id))
            .collect();
        entry.turns.extend(turns.iter().cloned());
        update.apply(&mut entry.conversation);
        Ok((turns, entry.conversation.clone()))
    }
}
