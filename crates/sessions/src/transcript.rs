//! Append-only JSONL transcripts.
//!
//! Each conversation gets a `<conversationId>.jsonl` file. Every turn is
//! appended as a single JSON line. An in-memory write-through cache avoids
//! re-reading from disk, and all file I/O runs on `spawn_blocking`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use uuid::Uuid;

use cm_domain::conversation::Turn;
use cm_domain::error::{Error, Result};

pub struct TranscriptWriter {
    base_dir: PathBuf,
    cache: RwLock<HashMap<Uuid, Vec<Turn>>>,
}

impl TranscriptWriter {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn path(&self, conversation_id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{conversation_id}.jsonl"))
    }

    /// Append turns. The cache is only updated once the write succeeded.
    pub async fn append(&self, conversation_id: Uuid, turns: &[Turn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }

        let buf = serialize_lines(turns)?;
        let path = self.path(conversation_id);

        tokio::task::spawn_blocking(move || {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            file.write_all(buf.as_bytes())?;
            file.sync_data()?;
            Ok::<(), Error>(())
        })
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        // Only extend an already-loaded cache; otherwise the next read loads
        // the full file including these lines.
        if let Some(cached) = self.cache.write().get_mut(&conversation_id) {
            cached.extend(turns.iter().cloned());
        }

        tracing::debug!(%conversation_id, lines = turns.len(), "transcript appended");
        Ok(())
    }

    /// Read back a transcript, from cache when possible.
    pub async fn read(&self, conversation_id: Uuid) -> Result<Vec<Turn>> {
        if let Some(turns) = self.cache.read().get(&conversation_id) {
            return Ok(turns.clone());
        }

        let path = self.path(conversation_id);
        let turns = tokio::task::spawn_blocking(move || read_jsonl_file(&path, conversation_id))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        self.cache.write().insert(conversation_id, turns.clone());
        Ok(turns)
    }

    pub async fn remove(&self, conversation_id: Uuid) -> Result<()> {
        self.cache.write().remove(&conversation_id);
        let path = self.path(conversation_id);
        tokio::task::spawn_blocking(move || match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        })
        .await
        .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))?
    }
}

fn serialize_lines(turns: &[Turn]) -> Result<String> {
    let mut buf = String::new();
    for turn in turns {
        buf.push_str(&serde_json::to_string(turn)?);
        buf.push('\n');
    }
    Ok(buf)
}

fn read_jsonl_file(path: &Path, conversation_id: Uuid) -> Result<Vec<Turn>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path)?;
    let mut turns = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Turn>(line) {
            Ok(t) => turns.push(t),
            Err(e) => {
                tracing::warn!(
                    %conversation_id,
                    error = %e,
                    "skipping malformed transcript line"
                );
            }
        }
    }
    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_domain::conversation::NewTurn;

    #[tokio::test]
    async fn append_then_read_from_fresh_writer() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let writer = TranscriptWriter::new(dir.path());
        writer
            .append(id, &[NewTurn::user("hello").into_turn(id)])
            .await
            .unwrap();

        let reopened = TranscriptWriter::new(dir.path());
        let turns = reopened.read(id).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "hello");
    }

    #[tokio::test]
    async fn cached_read_sees_later_appends() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let writer = TranscriptWriter::new(dir.path());
        assert!(writer.read(id).await.unwrap().is_empty());

        writer
            .append(id, &[NewTurn::user("a").into_turn(id), NewTurn::user("b").into_turn(id)])
            .await
            .unwrap();
        assert_eq!(writer.read(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let turn = NewTurn::user("ok").into_turn(id);
        let body = format!("{}\nnot json\n\n", serde_json::to_string(&turn).unwrap());
        std::fs::write(dir.path().join(format!("{id}.jsonl")), body).unwrap();

        let turns = TranscriptWriter::new(dir.path()).read(id).await.unwrap();
        assert_eq!(turns.len(), 1);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let id = Uuid::new_v4();
        let writer = TranscriptWriter::new(dir.path());
        writer.append(id, &[NewTurn::user("x").into_turn(id)]).await.unwrap();
        writer.remove(id).await.unwrap();
        writer.remove(id).await.unwrap();
        assert!(writer.read(id).await.unwrap().is_empty());
    }
}
