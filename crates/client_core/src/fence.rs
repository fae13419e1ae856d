//! Per-document serialization of remote operations.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::domain::DocumentId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

struct SlotEntry {
    lock: Slot,
    users: usize,
}

/// Hands out one async lock per document id.
///
/// Waiters are queued in arrival order, so operations on the same id apply
/// their results in the order they were started. Slots are dropped once no
/// operation holds or waits on them.
#[derive(Default)]
pub(crate) struct OperationFence {
    slots: Mutex<HashMap<DocumentId, SlotEntry>>,
}

/// Counts one holder or waiter of a slot; the last one out removes it.
struct SlotClaim<'a> {
    fence: &'a OperationFence,
    id: DocumentId,
}

impl Drop for SlotClaim<'_> {
    fn drop(&mut self) {
        let mut slots = self.fence.slots();
        if let Some(entry) = slots.get_mut(&self.id) {
            entry.users -= 1;
            if entry.users == 0 {
                slots.remove(&self.id);
            }
        }
    }
}

pub(crate) struct FenceGuard<'a> {
    // Field order matters: the lock is released before the claim is dropped.
    _guard: OwnedMutexGuard<()>,
    _claim: SlotClaim<'a>,
}

impl OperationFence {
    pub(crate) async fn enter(&self, id: &DocumentId) -> FenceGuard<'_> {
        let (claim, lock) = self.claim(id);
        let guard = lock.lock_owned().await;
        FenceGuard {
            _guard: guard,
            _claim: claim,
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_ids(&self) -> usize {
        self.slots().len()
    }

    fn claim(&self, id: &DocumentId) -> (SlotClaim<'_>, Slot) {
        let mut slots = self.slots();
        let entry = slots.entry(id.clone()).or_insert_with(|| SlotEntry {
            lock: Slot::default(),
            users: 0,
        });
        entry.users += 1;
        let lock = entry.lock.clone();
        drop(slots);
        (
            SlotClaim {
                fence: self,
                id: id.clone(),
            },
            lock,
        )
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<DocumentId, SlotEntry>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
