//! Per-conversation concurrency control.
//!
//! Only one turn runs per conversation at a time. A second message arriving
//! while a turn is in flight waits for it; a third is rejected as busy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

struct Slot {
    sem: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
}

/// Maps each conversation id to a `Semaphore(1)` plus a waiter count.
///
/// Slots are claimed and registered while the map is locked, so
/// [`prune_idle`](Self::prune_idle) never drops a slot someone is about to use.
pub struct ConversationLocks {
    slots: Mutex<HashMap<Uuid, Slot>>,
}

impl Default for ConversationLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts one queued waiter; the count drops with it even if the waiting
/// future is cancelled.
struct Queued(Arc<AtomicUsize>);

impl Drop for Queued {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the run lock for a conversation. Hold the permit for the whole
    /// turn; it releases on drop.
    ///
    /// Returns [`ConversationBusy`] when a turn is running and another one is
    /// already queued behind it.
    pub async fn acquire(&self, id: Uuid) -> Result<OwnedSemaphorePermit, ConversationBusy> {
        let (sem, queued) = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(id).or_insert_with(|| Slot {
                sem: Arc::new(Semaphore::new(1)),
                waiting: Arc::new(AtomicUsize::new(0)),
            });
            if let Ok(permit) = slot.sem.clone().try_acquire_owned() {
                return Ok(permit);
            }
            // Queue depth is one.
            if slot.waiting.load(Ordering::SeqCst) >= 1 {
                return Err(ConversationBusy(id));
            }
            slot.waiting.fetch_add(1, Ordering::SeqCst);
            (slot.sem.clone(), Queued(slot.waiting.clone()))
        };

        let permit = sem.acquire_owned().await;
        drop(queued);
        permit.map_err(|_| ConversationBusy(id))
    }

    /// Number of tracked conversations.
    pub fn conversation_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Drop slots nobody holds or waits on.
    pub fn prune_idle(&self) {
        let mut slots = self.slots.lock();
        slots.retain(|_, slot| {
            slot.sem.available_permits() == 0 || slot.waiting.load(Ordering::SeqCst) > 0
        });
    }

    /// Forget a conversation entirely (after deletion).
    pub fn forget(&self, id: Uuid) {
        self.slots.lock().remove(&id);
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("conversation {0} is busy with another message")]
pub struct ConversationBusy(pub Uuid);

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn sequential_access() {
        let locks = ConversationLocks::new();
        let id = Uuid::new_v4();
        let p1 = locks.acquire(id).await.unwrap();
        drop(p1);
        let p2 = locks.acquire(id).await.unwrap();
        drop(p2);
    }

    #[tokio::test]
    async fn different_conversations_run_concurrently() {
        let locks = ConversationLocks::new();
        let _p1 = locks.acquire(Uuid::new_v4()).await.unwrap();
        let _p2 = locks.acquire(Uuid::new_v4()).await.unwrap();
        assert_eq!(locks.conversation_count(), 2);
    }

    #[tokio::test]
    async fn same_conversation_waits_for_running_turn() {
        let locks = Arc::new(ConversationLocks::new());
        let id = Uuid::new_v4();
        let p1 = locks.acquire(id).await.unwrap();

        let locks2 = locks.clone();
        let handle = tokio::spawn(async move {
            let _p = locks2.acquire(id).await.unwrap();
            "acquired"
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        drop(p1);
        assert_eq!(handle.await.unwrap(), "acquired");
    }

    #[tokio::test]
    async fn third_message_is_rejected_as_busy() {
        let locks = Arc::new(ConversationLocks::new());
        let id = Uuid::new_v4();
        let p1 = locks.acquire(id).await.unwrap();

        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move { locks2.acquire(id).await.map(drop) });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = locks.acquire(id).await.unwrap_err();
        assert_eq!(err.0, id);

        drop(p1);
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn cancelled_waiter_frees_the_queue() {
        let locks = Arc::new(ConversationLocks::new());
        let id = Uuid::new_v4();
        let p1 = locks.acquire(id).await.unwrap();

        let locks2 = locks.clone();
        let abandoned = tokio::spawn(async move { locks2.acquire(id).await.map(drop) });
        tokio::time::sleep(Duration::from_millis(50)).await;
        abandoned.abort();
        assert!(abandoned.await.unwrap_err().is_cancelled());

        // The next message must queue again, not be turned away.
        let locks3 = locks.clone();
        let waiter = tokio::spawn(async move { locks3.acquire(id).await.map(drop) });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(p1);
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_queued_slots() {
        let locks = Arc::new(ConversationLocks::new());
        let id = Uuid::new_v4();
        let p1 = locks.acquire(id).await.unwrap();
        let locks2 = locks.clone();
        let waiter = tokio::spawn(async move { locks2.acquire(id).await.map(drop) });
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(p1);
        locks.prune_idle();
        assert!(waiter.await.unwrap().is_ok());
        locks.prune_idle();
        assert_eq!(locks.conversation_count(), 0);
    }

    #[tokio::test]
    async fn prune_keeps_held_slots() {
        let locks = ConversationLocks::new();
        let held = Uuid::new_v4();
        let _p = locks.acquire(held).await.unwrap();
        drop(locks.acquire(Uuid::new_v4()).await.unwrap());
        locks.prune_idle();
        assert_eq!(locks.conversation_count(), 1);
    }
}
