use std::sync::Arc;

use serde::Serialize;

use super::phase::Phase;
use crate::error::ErrorKind;
use crate::types::ToolCallRequest;

/// Progress notifications emitted during an invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    PhaseEntered {
        thread_id: String,
        phase: Phase,
        /// Budget units used so far in this invocation.
        step: usize,
    },
    ToolCallStarted {
        thread_id: String,
        call: ToolCallRequest,
    },
    ToolCallCompleted {
        thread_id: String,
        tool_call_id: String,
        tool_name: String,
        is_error: bool,
    },
    InvocationCompleted {
        thread_id: String,
        reason_steps: usize,
        act_steps: usize,
    },
    InvocationFailed {
        thread_id: String,
        kind: ErrorKind,
        message: String,
    },
}

/// Callback receiving every [`AgentEvent`].
pub type AgentEventSink = Arc<dyn Fn(AgentEvent) + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct AgentEventEmitter {
    sink: Option<AgentEventSink>,
}

impl AgentEventEmitter {
    pub(crate) fn new(sink: Option<AgentEventSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn emit(&self, event: AgentEvent) {
        if let Some(sink) = &self.sink {
            (sink)(event);
        }
    }
}
