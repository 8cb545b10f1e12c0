//! Tool-executor node: answer every tool request of the latest assistant turn.

use std::sync::Arc;

use futures::future;
use tracing::{debug, warn};

use crate::error::{ErrorKind, ThreadloopError};
use crate::tools::format::{error_to_text, result_to_text};
use crate::tools::validation::validate_arguments;
use crate::tools::{ToolArguments, ToolExecutionContext, ToolRegistry};
use crate::types::{ConversationState, Message, ToolCallRequest};

/// One answered tool request.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub call: ToolCallRequest,
    /// The tool message answering `call`.
    pub message: Message,
    /// Set when the call failed and was recovered into an error message.
    pub error: Option<ErrorKind>,
}

#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run the tool requests carried by the last message of `state`.
    ///
    /// Calls run concurrently; outcomes come back in request order. Tool
    /// failures never escape: they become error tool messages.
    pub async fn run(&self, state: &ConversationState) -> Vec<ToolOutcome> {
        let Some(last) = state.last().filter(|m| m.has_tool_calls()) else {
            return Vec::new();
        };
        let calls = last.tool_calls.iter().map(|call| self.execute_call(&state.thread_id, call));
        future::join_all(calls).await
    }

    async fn execute_call(&self, thread_id: &str, call: &ToolCallRequest) -> ToolOutcome {
        match self.invoke(thread_id, call).await {
            Ok(value) => {
                debug!(thread_id, tool = %call.name, call_id = %call.id, "tool call succeeded");
                ToolOutcome {
                    call: call.clone(),
                    message: Message::tool_result(&call.id, result_to_text(&value), false),
                    error: None,
                }
            }
            Err(err) => {
                warn!(
                    thread_id,
                    tool = %call.name,
                    call_id = %call.id,
                    error = %err,
                    "tool call failed; reporting error to the model"
                );
                ToolOutcome {
                    call: call.clone(),
                    message: Message::tool_result(&call.id, error_to_text(&error_text(&err)), true),
                    error: Some(recovered_kind(&err)),
                }
            }
        }
    }

    async fn invoke(
        &self,
        thread_id: &str,
        call: &ToolCallRequest,
    ) -> Result<serde_json::Value, ThreadloopError> {
        let tool = self
            .registry
            .get(&call.name)
            .ok_or_else(|| ThreadloopError::UnknownTool(call.name.clone()))?;

        validate_arguments(&call.arguments, &tool.parameters().schema).map_err(|e| {
            ThreadloopError::InvalidArgument(format!("Argument validation failed: {e}"))
        })?;

        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolExecutionContext {
            thread_id: thread_id.to_string(),
            tool_call_id: call.id.clone(),
        };
        tool.execute(&args, &ctx).await
    }
}

/// Kind recorded for a failure that was folded into a tool message.
fn recovered_kind(err: &ThreadloopError) -> ErrorKind {
    match err {
        ThreadloopError::UnknownTool(_) => ErrorKind::UnknownTool,
        _ => ErrorKind::ToolInvocation,
    }
}

/// Text the model sees for a failed call.
fn error_text(err: &ThreadloopError) -> String {
    match err {
        ThreadloopError::UnknownTool(name) => format!("Tool '{name}' not found"),
        ThreadloopError::InvalidArgument(message) => message.clone(),
        ThreadloopError::ToolExecution { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
