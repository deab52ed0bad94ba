//! Single-slot, latest-value-wins hand-off between the poller and its consumer.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;

use crate::models::Snapshot;

#[derive(Debug, Default)]
struct SlotInner {
    value: Mutex<Option<Snapshot>>,
    notify: Notify,
}

/// Capacity-1 buffer holding at most one pending [`Snapshot`].
///
/// Publishing overwrites any unconsumed value; taking empties the slot.
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSlot {
    inner: Arc<SlotInner>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Snapshot>> {
        // Critical sections are a single replace/take, so a poisoned value is still whole.
        self.inner.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `snapshot`, returning the unconsumed value it replaced, if any.
    pub fn publish(&self, snapshot: Snapshot) -> Option<Snapshot> {
        let displaced = self.lock().replace(snapshot);
        self.inner.notify.notify_one();
        displaced
    }

    /// Drain the slot without waiting.
    pub fn try_take(&self) -> Option<Snapshot> {
        self.lock().take()
    }

    /// Wait until a snapshot is available, then drain it.
    pub async fn take(&self) -> Snapshot {
        loop {
            if let Some(snapshot) = self.try_take() {
                return snapshot;
            }
            // notify_one stores a permit when nobody is waiting, so a publish
            // between try_take and this await is not lost.
            self.inner.notify.notified().await;
        }
    }

    /// Like [`take`](Self::take) but gives up after `timeout`.
    pub async fn take_timeout(&self, timeout: Duration) -> Option<Snapshot> {
        tokio::time::timeout(timeout, self.take()).await.ok()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }
}
