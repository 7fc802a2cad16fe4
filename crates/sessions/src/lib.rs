//! Conversation persistence for chatmux.
//!
//! A [`ConversationStore`] holds conversations and their append-only turn
//! logs; [`ConversationState`] layers the turn-window and topic operations
//! the pipeline uses on top of it.

pub mod file;
pub mod state;
pub mod store;
pub mod transcript;

use std::sync::Arc;

use cm_domain::config::{StorageBackend, StorageConfig};
use cm_domain::error::Result;

pub use file::FileStore;
pub use state::{recent_window, ConversationState};
pub use store::{ConversationStore, InMemoryStore};
pub use transcript::TranscriptWriter;

/// Open the store selected by config.
pub fn open_store(cfg: &StorageConfig) -> Result<Arc<dyn ConversationStore>> {
    Ok(match cfg.backend {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::File => Arc::new(FileStore::open(&cfg.state_path)?),
    })
}
