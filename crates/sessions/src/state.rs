//! Conversation State: the turn log and the single "current topic" slot of
//! one conversation, on top of any [`ConversationStore`].

use std::sync::Arc;

use uuid::Uuid;

use cm_domain::conversation::{Conversation, ConversationUpdate, NewTurn, Turn};
use cm_domain::error::Result;

use crate::store::{not_found, ConversationStore};

#[derive(Clone)]
pub struct ConversationState {
    store: Arc<dyn ConversationStore>,
}

impl ConversationState {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Turns are append-only; there is no edit or removal of a single turn.
    pub async fn append_turn(&self, conversation_id: Uuid, turn: NewTurn) -> Result<Turn> {
        self.store.create_turn(conversation_id, turn).await
    }

    /// Store a whole exchange and its topic/title update at once.
    pub async fn commit_exchange(
        &self,
        conversation_id: Uuid,
        turns: Vec<NewTurn>,
        update: ConversationUpdate,
    ) -> Result<(Vec<Turn>, Conversation)> {
        self.store.commit_exchange(conversation_id, turns, update).await
    }

    /// The last `n` dialogue turns, oldest first.
    pub async fn recent_turns(&self, conversation_id: Uuid, n: usize) -> Result<Vec<Turn>> {
        let turns = self.store.list_turns(conversation_id).await?;
        Ok(recent_window(&turns, n))
    }

    pub async fn get_topic(&self, conversation_id: Uuid) -> Result<Option<String>> {
        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| not_found(conversation_id))?;
        Ok(conversation.current_topic)
    }

    /// Overwrites the slot. `None` clears it.
    pub async fn set_topic(&self, conversation_id: Uuid, topic: Option<String>) -> Result<()> {
        self.store
            .update_conversation(
                conversation_id,
                ConversationUpdate {
                    current_topic: Some(topic),
                    title: None,
                },
            )
            .await?;
        Ok(())
    }
}

/// Keep only user/assistant turns, then the last `n` of those in their
/// original order.
pub fn recent_window(turns: &[Turn], n: usize) -> Vec<Turn> {
    let dialogue: Vec<&Turn> = turns.iter().filter(|t| t.role.is_dialogue()).collect();
    let skip = dialogue.len().saturating_sub(n);
    dialogue.into_iter().skip(skip).cloned().collect()
}
