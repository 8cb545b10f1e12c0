//! Error types for threadloop.

pub mod kind;

pub use kind::ErrorKind;

use thiserror::Error;

/// Primary error type for all threadloop operations.
#[derive(Error, Debug)]
pub enum ThreadloopError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Recursion limit of {limit} steps reached without a final answer")]
    RecursionLimitExceeded { limit: usize },

    #[error("Checkpoint error for thread '{thread_id}': {message}")]
    Checkpoint { thread_id: String, message: String },

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ThreadloopError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a checkpoint error for a thread.
    pub fn checkpoint(thread_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Checkpoint {
            thread_id: thread_id.into(),
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Api { .. }
            | Self::Network(_)
            | Self::Authentication(_)
            | Self::RateLimited { .. }
            | Self::MalformedResponse(_) => ErrorKind::RemoteModel,
            Self::ToolExecution { .. } | Self::InvalidArgument(_) => ErrorKind::ToolInvocation,
            Self::UnknownTool(_) => ErrorKind::UnknownTool,
            Self::RecursionLimitExceeded { .. } => ErrorKind::RecursionLimitExceeded,
            Self::Checkpoint { .. } => ErrorKind::Checkpoint,
            #[cfg(feature = "sqlite")]
            Self::Database(_) => ErrorKind::Checkpoint,
        }
    }

    /// Whether this error aborts an invocation.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

/// Failure of a whole `invoke` call on one thread.
///
/// Only fatal kinds ever surface here; recovered tool failures live in the
/// conversation instead.
#[derive(Error, Debug)]
#[error("invocation on thread '{thread_id}' failed: {source}")]
pub struct AgentInvocationError {
    pub thread_id: String,
    #[source]
    pub source: ThreadloopError,
}

impl AgentInvocationError {
    pub fn new(thread_id: impl Into<String>, source: ThreadloopError) -> Self {
        Self {
            thread_id: thread_id.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ThreadloopError>;
