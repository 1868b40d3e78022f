//! Per-thread critical sections.
//!
//! Turns on the same thread run one at a time; turns on different threads
//! never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::ThreadId;

/// Lazily created lock per thread id.
#[derive(Debug, Clone, Default)]
pub struct ThreadLocks {
    locks: Arc<Mutex<HashMap<ThreadId, Arc<Mutex<()>>>>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `thread_id`.
    ///
    /// Access is held until the returned guard is dropped. Waiters are
    /// served in FIFO order.
    pub async fn acquire(&self, thread_id: &ThreadId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(thread_id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Drops locks nobody holds or waits on.
    ///
    /// # Returns
    /// The number of locks removed
    pub async fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock().await;
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    /// Number of threads with a lock entry.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
