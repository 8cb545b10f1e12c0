//! Per-thread async locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Exclusive hold on one thread id, released on drop.
pub type ThreadLease = OwnedMutexGuard<()>;

/// Hands out one exclusive lease per thread id.
///
/// Work on different threads never contends; work on the same thread runs
/// one holder at a time, in lock acquisition order.
#[derive(Debug, Clone, Default)]
pub struct ThreadLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `thread_id`. Released when the guard drops.
    pub async fn acquire(&self, thread_id: &str) -> ThreadLease {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Idle entries are only referenced by the map.
            map.retain(|key, lock| key == thread_id || Arc::strong_count(lock) > 1);
            map.entry(thread_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of threads with a live or waiting lease.
    pub fn active(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.values().filter(|lock| Arc::strong_count(lock) > 1).count()
    }
}
