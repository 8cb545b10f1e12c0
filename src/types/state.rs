//! Append-only per-thread conversation state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::message::{Message, Role, ToolCallRequest};

/// A thread's message log.
///
/// Messages are only ever concatenated to the end; their order is the prompt
/// order sent to the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: String,
    messages: Vec<Message>,
}

impl ConversationState {
    /// Empty state for a thread with no checkpoint.
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
        }
    }

    /// Rebuild a state from stored messages.
    pub fn from_messages(thread_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages,
        }
    }

    /// Return a new state with `new_messages` appended in arrival order.
    pub fn append(&self, new_messages: impl IntoIterator<Item = Message>) -> Self {
        let mut messages = self.messages.clone();
        messages.extend(new_messages);
        Self {
            thread_id: self.thread_id.clone(),
            messages,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether `other` keeps every message of `self` unchanged at the front.
    pub fn is_prefix_of(&self, other: &ConversationState) -> bool {
        self.thread_id == other.thread_id
            && other.messages.len() >= self.messages.len()
            && other.messages[..self.messages.len()] == self.messages[..]
    }

    /// Tool requests of the latest assistant turn that no tool message answers yet.
    ///
    /// Non-empty only when the log ends in an interrupted Act step.
    pub fn pending_tool_calls(&self) -> Vec<&ToolCallRequest> {
        let Some(turn) = self.messages.iter().rposition(|m| m.role != Role::Tool) else {
            return Vec::new();
        };
        let answered: HashSet<&str> = self.messages[turn + 1..]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        self.messages[turn]
            .tool_calls
            .iter()
            .filter(|call| !answered.contains(call.id.as_str()))
            .collect()
    }

    /// Check the tool-call linkage invariant.
    ///
    /// Every tool message must answer a request emitted by an earlier
    /// assistant message, and every request must be answered before the next
    /// user or assistant message. System messages never belong to a thread.
    pub fn validate(&self) -> Result<(), String> {
        let mut requested: HashSet<&str> = HashSet::new();
        let mut pending: HashSet<&str> = HashSet::new();
        for (index, message) in self.messages.iter().enumerate() {
            if message.role != Role::Tool && !pending.is_empty() {
                let mut ids: Vec<_> = pending.iter().copied().collect();
                ids.sort_unstable();
                return Err(format!(
                    "message {index} follows unanswered tool requests {ids:?}"
                ));
            }
            match message.role {
                Role::System => {
                    return Err(format!("message {index} has system role"));
                }
                Role::Assistant => {
                    requested.extend(message.tool_calls.iter().map(|c| c.id.as_str()));
                    pending.extend(message.tool_calls.iter().map(|c| c.id.as_str()));
                }
                Role::Tool => {
                    let Some(id) = message.tool_call_id.as_deref() else {
                        return Err(format!("tool message {index} has no tool_call_id"));
                    };
                    if !requested.contains(id) {
                        return Err(format!(
                            "tool message {index} answers unknown request '{id}'"
                        ));
                    }
                    pending.remove(id);
                }
                Role::User => {}
            }
        }
        Ok(())
    }
}
