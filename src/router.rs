//! Routing decision after each reasoning step.

use crate::types::ConversationState;

/// What the loop does after the reasoner has spoken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The last message requests tools; run them and reason again.
    Continue,
    /// The last message is the answer.
    Finish(String),
}

/// Classify the most recent message of `state`.
///
/// Only structured tool requests matter; the text is never inspected for
/// markers.
pub fn route(state: &ConversationState) -> Route {
    match state.last() {
        Some(last) if last.has_tool_calls() => Route::Continue,
        Some(last) => Route::Finish(last.content.clone()),
        None => Route::Finish(String::new()),
    }
}
