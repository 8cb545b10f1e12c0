//! Language-model provider trait and implementations.

pub mod http;

#[cfg(feature = "openai")]
pub mod openai;

use async_trait::async_trait;
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ThreadloopError;
use crate::tools::ToolDefinition;
use crate::types::Message;

/// Settings controlling a single generation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub seed: Option<u64>,
    pub user: Option<String>,
}

/// A request sent to a chat model: formatted context plus the tools it may call.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System directive first, then the thread history.
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub settings: GenerationSettings,
}

/// Core trait implemented by all chat model providers.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Produce the next assistant message, possibly carrying tool requests.
    async fn generate(&self, request: &ModelRequest) -> Result<Message, ThreadloopError>;
}
