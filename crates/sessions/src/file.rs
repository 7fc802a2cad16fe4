//! File-backed conversation store.
//!
//! Conversation records live in `conversations.json` under
//! `<state_path>/conversations/`; turns go to one JSONL transcript per
//! conversation next to it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use cm_domain::conversation::{Conversation, ConversationUpdate, NewTurn, Turn};
use cm_domain::error::{Error, Result};
use cm_domain::trace::TraceEvent;

use crate::store::{not_found, sort_recent_first, ConversationStore};
use crate::transcript::TranscriptWriter;

pub struct FileStore {
    index_path: PathBuf,
    conversations: RwLock<HashMap<Uuid, Conversation>>,
    transcripts: TranscriptWriter,
    /// Serializes index rewrites so an older snapshot never lands last.
    flush_lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    /// Load or create the store at `state_path/conversations/`.
    pub fn open(state_path: &Path) -> Result<Self> {
        let dir = state_path.join("conversations");
        std::fs::create_dir_all(&dir)?;

        let index_path = dir.join("conversations.json");
        let conversations: HashMap<Uuid, Conversation> = if index_path.exists() {
            let raw = std::fs::read_to_string(&index_path)?;
            serde_json::from_str(&raw).map_err(|e| {
                Error::Storage(format!("{}: {e}", index_path.display()))
            })?
        } else {
            HashMap::new()
        };

        tracing::info!(
            conversations = conversations.len(),
            path = %index_path.display(),
            "conversation store loaded"
        );

        Ok(Self {
            index_path,
            conversations: RwLock::new(conversations),
            transcripts: TranscriptWriter::new(&dir),
            flush_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Rewrite the index atomically (temp file + rename).
    async fn flush(&self) -> Result<()> {
        let _guard = self.flush_lock.lock().await;
        let json = {
            let conversations = self.conversations.read();
            serde_json::to_string_pretty(&*conversations)?
        };
        let path = self.index_path.clone();
        tokio::task::spawn_blocking(move || {
            let tmp = path.with_extension("json.tmp");
            std::fs::write(&tmp, json)?;
            std::fs::rename(&tmp, &path)?;
            Ok::<(), Error>(())
        })
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
    }

    fn restore(&self, previous: Conversation) {
        if let Some(c) = self.conversations.write().get_mut(&previous.id) {
            *c = previous;
        }
    }
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn create_conversation(&self, title: Option<String>) -> Result<Conversation> {
        let conversation = Conversation::new(title);
        self.conversations
            .write()
            .insert(conversation.id, conversation.clone());
        self.flush().await?;
        TraceEvent::ConversationCreated {
            conversation_id: conversation.id.to_string(),
        }
        .emit();
        Ok(conversation)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.conversations.read().get(&id).cloned())
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        let mut all: Vec<Conversation> = self.conversations.read().values().cloned().collect();
        sort_recent_first(&mut all);
        Ok(all)
    }

    async fn update_conversation(
        &self,
        id: Uuid,
        update: ConversationUpdate,
    ) -> Result<Conversation> {
        let updated = {
            let mut conversations = self.conversations.write();
            let conversation = conversations.get_mut(&id).ok_or_else(|| not_found(id))?;
            update.apply(conversation);
            conversation.clone()
        };
        self.flush().await?;
        Ok(updated)
    }

    async fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let removed = self.conversations.write().remove(&id).is_some();
        if !removed {
            return Ok(false);
        }
        self.flush().await?;
        self.transcripts.remove(id).await?;
        TraceEvent::ConversationDeleted {
            conversation_id: id.to_string(),
        }
        .emit();
        Ok(true)
    }

    async fn create_turn(&self, conversation_id: Uuid, turn: NewTurn) -> Result<Turn> {
        if !self.conversations.read().contains_key(&conversation_id) {
            return Err(not_found(conversation_id));
        }
        let turn = turn.into_turn(conversation_id);
        self.transcripts
            .append(conversation_id, std::slice::from_ref(&turn))
            .await?;

        let touched = match self.conversations.write().get_mut(&conversation_id) {
            Some(c) => {
                c.updated_at = Utc::now();
                true
            }
            None => false,
        };
        if touched {
            self.flush().await?;
        }
        Ok(turn)
    }

    async fn list_turns(&self, conversation_id: Uuid) -> Result<Vec<Turn>> {
        if !self.conversations.read().contains_key(&conversation_id) {
            return Ok(Vec::new());
        }
        self.transcripts.read(conversation_id).await
    }

    /// The index is rewritten first; if the transcript append then fails the
    /// previous record is restored, so neither file shows half an exchange.
    async fn commit_exchange(
        &self,
        conversation_id: Uuid,
        turns: Vec<NewTurn>,
        update: ConversationUpdate,
    ) -> Result<(Vec<Turn>, Conversation)> {
        let (previous, updated) = {
            let mut conversations = self.conversations.write();
            let conversation = conversations
                .get_mut(&conversation_id)
                .ok_or_else(|| not_found(conversation_id))?;
            let previous = conversation.clone();
            update.apply(conversation);
            (previous, conversation.clone())
        };
        let turns: Vec<Turn> = turns
            .into_iter()
            .map(|t| t.into_turn(conversation_id))
            .collect();

        if let Err(e) = self.flush().await {
            self.restore(previous);
            return Err(e);
        }
        if let Err(e) = self.transcripts.append(conversation_id, &turns).await {
            self.restore(previous);
            if let Err(flush_err) = self.flush().await {
                tracing::error!(
                    %conversation_id,
                    error = %flush_err,
                    "could not roll back conversation index"
                );
            }
            return Err(e);
        }
        Ok((turns, updated))
    }
}
