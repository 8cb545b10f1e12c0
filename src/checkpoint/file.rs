//! JSON-file checkpoint store: one file per thread.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::locks::{ThreadLease, ThreadLocks};
use super::{ensure_extends, ensure_thread_id, Checkpoint, CheckpointStore};
use crate::error::ThreadloopError;
use crate::types::ConversationState;

const EXTENSION: &str = "json";

/// Stores each thread as `<dir>/<encoded id>.json`.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
    locks: ThreadLocks,
    leases: ThreadLocks,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: ThreadLocks::new(),
            leases: ThreadLocks::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn thread_path(&self, thread_id: &str) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", encode_file_stem(thread_id)))
    }

    async fn read(&self, thread_id: &str) -> Result<Option<ConversationState>, ThreadloopError> {
        let path = self.thread_path(thread_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(thread_id, &path, err)),
        };
        let checkpoint: Checkpoint = serde_json::from_str(&raw).map_err(|err| {
            ThreadloopError::checkpoint(thread_id, format!("unreadable {}: {err}", path.display()))
        })?;
        if checkpoint.thread_id != thread_id {
            return Err(ThreadloopError::checkpoint(
                thread_id,
                format!("{} belongs to thread '{}'", path.display(), checkpoint.thread_id),
            ));
        }
        checkpoint.into_state().map(Some)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, ThreadloopError> {
        ensure_thread_id(thread_id)?;
        self.read(thread_id).await
    }

    async fn save(&self, state: &ConversationState) -> Result<(), ThreadloopError> {
        let thread_id = state.thread_id.as_str();
        ensure_thread_id(thread_id)?;
        let _guard = self.locks.acquire(thread_id).await;

        let stored = self.read(thread_id).await?;
        ensure_extends(stored.as_ref(), state)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| io_error(thread_id, &self.dir, err))?;
        let path = self.thread_path(thread_id);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        let serialized = serde_json::to_string_pretty(&Checkpoint::new(state))
            .map_err(|err| ThreadloopError::checkpoint(thread_id, err.to_string()))?;
        tokio::fs::write(&tmp, serialized)
            .await
            .map_err(|err| io_error(thread_id, &tmp, err))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|err| io_error(thread_id, &path, err))?;
        Ok(())
    }

    async fn list_threads(&self) -> Result<Vec<String>, ThreadloopError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error("*", &self.dir, err)),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| io_error("*", &self.dir, err))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_file_stem)
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn lease(&self, thread_id: &str) -> ThreadLease {
        self.leases.acquire(thread_id).await
    }
}

fn io_error(thread_id: &str, path: &Path, err: std::io::Error) -> ThreadloopError {
    ThreadloopError::checkpoint(thread_id, format!("{}: {err}", path.display()))
}

/// Map a thread id to a portable, collision-free file stem.
///
/// ASCII alphanumerics and `-` pass through; every other byte becomes `_xx`.
fn encode_file_stem(thread_id: &str) -> String {
    let mut out = String::with_capacity(thread_id.len());
    for byte in thread_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{byte:02x}"));
        }
    }
    out
}

fn decode_file_stem(stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut chars = stem.bytes();
    while let Some(byte) = chars.next() {
        if byte == b'_' {
            let hi = chars.next()?;
            let lo = chars.next()?;
            let hex = std::str::from_utf8(&[hi, lo]).ok()?.to_owned();
            bytes.push(u8::from_str_radix(&hex, 16).ok()?);
        } else {
            bytes.push(byte);
        }
    }
    String::from_utf8(bytes).ok()
}
