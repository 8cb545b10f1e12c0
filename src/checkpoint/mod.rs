//! Durable per-thread conversation snapshots.
//!
//! A store keeps the latest [`ConversationState`] of each thread. Saves must
//! extend what is already stored: a snapshot that drops or rewrites earlier
//! messages is rejected instead of silently replacing history.

pub mod file;
pub mod locks;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ThreadloopError;
use crate::types::{ConversationState, Message};

pub use file::FileCheckpointStore;
pub use locks::{ThreadLease, ThreadLocks};
pub use memory::InMemoryCheckpointStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCheckpointStore;

/// Current on-disk snapshot format.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Storage abstraction for thread snapshots.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Latest snapshot of `thread_id`, or `None` for an unknown thread.
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, ThreadloopError>;

    /// Persist `state` as the latest snapshot of its thread.
    async fn save(&self, state: &ConversationState) -> Result<(), ThreadloopError>;

    /// Ids of every thread with a snapshot, sorted.
    async fn list_threads(&self) -> Result<Vec<String>, ThreadloopError>;

    /// Exclusive lease on `thread_id` spanning a whole load-run-save cycle.
    ///
    /// Every caller sharing this store instance waits for the current holder.
    /// Independent of the short lock each `save` takes.
    async fn lease(&self, thread_id: &str) -> ThreadLease;
}

/// Serialized form of one thread snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub thread_id: String,
    pub saved_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Checkpoint {
    pub fn new(state: &ConversationState) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            thread_id: state.thread_id.clone(),
            saved_at: Utc::now(),
            messages: state.messages().to_vec(),
        }
    }

    /// Rebuild the state, refusing snapshots that break the message invariants.
    pub fn into_state(self) -> Result<ConversationState, ThreadloopError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(ThreadloopError::checkpoint(
                &self.thread_id,
                format!("unsupported checkpoint version {}", self.version),
            ));
        }
        let state = ConversationState::from_messages(self.thread_id, self.messages);
        state
            .validate()
            .map_err(|e| ThreadloopError::checkpoint(&state.thread_id, format!("corrupt snapshot: {e}")))?;
        Ok(state)
    }
}

/// Reject a save that does not extend the stored snapshot.
pub(crate) fn ensure_extends(
    stored: Option<&ConversationState>,
    next: &ConversationState,
) -> Result<(), ThreadloopError> {
    match stored {
        Some(stored) if !stored.is_prefix_of(next) => Err(ThreadloopError::checkpoint(
            &next.thread_id,
            format!(
                "snapshot of {} messages does not extend the stored {} messages",
                next.len(),
                stored.len()
            ),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn ensure_thread_id(thread_id: &str) -> Result<(), ThreadloopError> {
    if thread_id.trim().is_empty() {
        return Err(ThreadloopError::checkpoint(thread_id, "thread id must not be empty"));
    }
    Ok(())
}
