//! Convenience re-exports for common use.

pub use crate::checkpoint::{CheckpointStore, FileCheckpointStore, InMemoryCheckpointStore};
pub use crate::config::{CheckpointBackend, ThreadloopConfig};
pub use crate::error::{AgentInvocationError, ErrorKind, Result, ThreadloopError};
pub use crate::orchestrator::{AgentEvent, InvocationOutcome, Orchestrator, Phase};
pub use crate::prompt::PromptConfig;
pub use crate::provider::{ChatModel, GenerationSettings, ModelRequest};
pub use crate::router::Route;
pub use crate::tools::{AgentTool, Tool, ToolArguments, ToolParameters, ToolRegistry};
pub use crate::types::{ConversationState, Message, Role, ToolCallRequest};

#[cfg(feature = "sqlite")]
pub use crate::checkpoint::SqliteCheckpointStore;
