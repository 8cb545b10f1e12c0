//! Reasoner node: one model call producing one assistant message.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{ErrorKind, ThreadloopError};
use crate::prompt::{render_system_directive, PromptConfig};
use crate::provider::{ChatModel, GenerationSettings, ModelRequest};
use crate::tools::{ToolDefinition, ToolRegistry};
use crate::types::{ConversationState, Message, Role};

pub struct Reasoner {
    model: Arc<dyn ChatModel>,
    prompt: PromptConfig,
    tools: Vec<ToolDefinition>,
    settings: GenerationSettings,
}

impl Reasoner {
    /// The tool list is captured once; it never changes between invocations.
    pub fn new(
        model: Arc<dyn ChatModel>,
        prompt: PromptConfig,
        registry: &ToolRegistry,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            model,
            prompt,
            tools: registry.definitions(),
            settings,
        }
    }

    /// System directive followed by the full thread history.
    pub fn format_context(&self, state: &ConversationState, now: DateTime<Utc>) -> Vec<Message> {
        let names: Vec<&str> = self.tools.iter().map(|t| t.name.as_str()).collect();
        let mut messages = Vec::with_capacity(state.len() + 1);
        messages.push(Message::system(render_system_directive(&self.prompt, &names, now)));
        messages.extend(state.messages().iter().cloned());
        messages
    }

    /// Ask the model for the next assistant message.
    ///
    /// Every failure is reported as a remote-model error, which is fatal to
    /// the invocation.
    pub async fn run(&self, state: &ConversationState) -> Result<Message, ThreadloopError> {
        let request = ModelRequest {
            messages: self.format_context(state, Utc::now()),
            tools: self.tools.clone(),
            settings: self.settings.clone(),
        };

        let message = self.model.generate(&request).await.map_err(|err| {
            if err.kind() == ErrorKind::RemoteModel {
                err
            } else {
                ThreadloopError::MalformedResponse(err.to_string())
            }
        })?;
        check_response(&message)?;

        debug!(
            thread_id = %state.thread_id,
            model = self.model.model_id(),
            tool_calls = message.tool_calls.len(),
            text_len = message.content.len(),
            "reasoner produced message"
        );
        Ok(message)
    }
}

fn check_response(message: &Message) -> Result<(), ThreadloopError> {
    if message.role != Role::Assistant {
        return Err(ThreadloopError::MalformedResponse(format!(
            "expected assistant message, got {}",
            message.role
        )));
    }
    if message.tool_call_id.is_some() {
        return Err(ThreadloopError::MalformedResponse(
            "assistant message carries a tool_call_id".into(),
        ));
    }
    let mut seen = HashSet::new();
    for call in &message.tool_calls {
        if call.id.trim().is_empty() || call.name.trim().is_empty() {
            return Err(ThreadloopError::MalformedResponse(
                "tool call without id or name".into(),
            ));
        }
        if !seen.insert(call.id.as_str()) {
            return Err(ThreadloopError::MalformedResponse(format!(
                "duplicate tool call id '{}'",
                call.id
            )));
        }
    }
    Ok(())
}
