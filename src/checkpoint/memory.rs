//! Process-local checkpoint store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::locks::{ThreadLease, ThreadLocks};
use super::{ensure_extends, ensure_thread_id, CheckpointStore};
use crate::error::ThreadloopError;
use crate::types::ConversationState;

/// Keeps snapshots in memory. Lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    threads: RwLock<HashMap<String, ConversationState>>,
    leases: ThreadLocks,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, ThreadloopError> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, state: &ConversationState) -> Result<(), ThreadloopError> {
        ensure_thread_id(&state.thread_id)?;
        let mut threads = self.threads.write().await;
        ensure_extends(threads.get(&state.thread_id), state)?;
        threads.insert(state.thread_id.clone(), state.clone());
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<String>, ThreadloopError> {
        let mut ids: Vec<String> = self.threads.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn lease(&self, thread_id: &str) -> ThreadLease {
        self.leases.acquire(thread_id).await
    }
}
