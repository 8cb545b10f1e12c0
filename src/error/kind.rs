//! Error classification for the orchestration loop.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Broad error kind deciding whether an invocation can continue.
///
/// Tool-side kinds are folded into the conversation as tool messages; every
/// other kind aborts the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Model call failed, timed out, or returned an unusable response.
    RemoteModel,
    /// A registered tool failed or rejected its arguments.
    ToolInvocation,
    /// The model asked for a tool that is not registered.
    UnknownTool,
    /// The step budget ran out before the model finished.
    RecursionLimitExceeded,
    /// Loading or saving a checkpoint failed.
    Checkpoint,
    /// Invalid configuration detected while building components.
    Configuration,
}

impl ErrorKind {
    /// Whether this kind aborts the current invocation.
    pub fn is_fatal(self) -> bool {
        !matches!(self, Self::ToolInvocation | Self::UnknownTool)
    }
}
