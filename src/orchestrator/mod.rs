//! The agent loop: a Start/Reason/Act/End state machine over one thread.

pub mod budget;
pub mod events;
pub mod phase;

pub use budget::StepBudget;
pub use events::{AgentEvent, AgentEventSink};
pub use phase::Phase;

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::checkpoint::{CheckpointStore, InMemoryCheckpointStore};
use crate::config::{CheckpointBackend, ThreadloopConfig, DEFAULT_FALLBACK_MESSAGE, DEFAULT_MAX_STEPS};
use crate::error::{AgentInvocationError, ThreadloopError};
use crate::nodes::{Reasoner, ToolExecutor};
use crate::prompt::PromptConfig;
use crate::provider::{ChatModel, GenerationSettings};
use crate::router::{route, Route};
use crate::tools::format::error_to_text;
use crate::tools::{Tool, ToolRegistry};
use crate::types::{ConversationState, Message};

use events::AgentEventEmitter;

const INTERRUPTED_TOOL_CALL: &str = "tool call interrupted";

/// Result of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    pub thread_id: String,
    /// Content of the final assistant message.
    pub response: String,
    pub reason_steps: usize,
    pub act_steps: usize,
    /// Thread state as persisted at the end of the invocation.
    pub state: ConversationState,
}

/// Drives invocations against a shared model, tool registry and store.
///
/// Invocations on the same thread are serialized end to end through the
/// store's lease, so orchestrators sharing one store also take turns.
/// Different threads proceed in parallel.
pub struct Orchestrator {
    reasoner: Reasoner,
    executor: ToolExecutor,
    store: Arc<dyn CheckpointStore>,
    max_steps: usize,
    fallback_message: String,
    events: AgentEventEmitter,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Wire the OpenAI model, the web-search tool and the configured store.
    #[cfg(feature = "openai")]
    pub async fn from_config(config: &ThreadloopConfig) -> Result<Self, ThreadloopError> {
        OrchestratorBuilder::from_config(config).await?.build()
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback_message
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.executor.registry()
    }

    /// Stored history of a thread, if any.
    pub async fn history(
        &self,
        thread_id: &str,
    ) -> Result<Option<ConversationState>, ThreadloopError> {
        self.store.load(thread_id).await
    }

    /// Run one invocation, returning the user-safe fallback on fatal failure.
    pub async fn invoke(&self, thread_id: &str, user_message: &str) -> String {
        match self.try_invoke(thread_id, user_message).await {
            Ok(outcome) => outcome.response,
            Err(err) => {
                error!(
                    thread_id = %err.thread_id,
                    kind = %err.kind(),
                    error = %err.source,
                    "invocation failed; returning fallback message"
                );
                self.fallback_message.clone()
            }
        }
    }

    /// Run one invocation, surfacing fatal failures to the caller.
    ///
    /// Progress saved before a failure stays in the store.
    pub async fn try_invoke(
        &self,
        thread_id: &str,
        user_message: &str,
    ) -> Result<InvocationOutcome, AgentInvocationError> {
        let _lease = self.store.lease(thread_id).await;

        match self.run(thread_id, user_message).await {
            Ok(outcome) => {
                self.events.emit(AgentEvent::InvocationCompleted {
                    thread_id: thread_id.to_string(),
                    reason_steps: outcome.reason_steps,
                    act_steps: outcome.act_steps,
                });
                info!(
                    thread_id,
                    reason_steps = outcome.reason_steps,
                    act_steps = outcome.act_steps,
                    messages = outcome.state.len(),
                    "invocation completed"
                );
                Ok(outcome)
            }
            Err(err) => {
                self.events.emit(AgentEvent::InvocationFailed {
                    thread_id: thread_id.to_string(),
                    kind: err.kind(),
                    message: err.to_string(),
                });
                Err(AgentInvocationError::new(thread_id, err))
            }
        }
    }

    async fn run(
        &self,
        thread_id: &str,
        user_message: &str,
    ) -> Result<InvocationOutcome, ThreadloopError> {
        let mut budget = StepBudget::new(self.max_steps);
        self.enter(thread_id, Phase::Start, &budget);

        let prior = self
            .store
            .load(thread_id)
            .await?
            .unwrap_or_else(|| ConversationState::new(thread_id));
        let interrupted: Vec<Message> = prior
            .pending_tool_calls()
            .into_iter()
            .map(|call| {
                warn!(
                    thread_id,
                    tool = %call.name,
                    call_id = %call.id,
                    "answering tool call left pending by an earlier invocation"
                );
                Message::tool_result(&call.id, error_to_text(INTERRUPTED_TOOL_CALL), true)
            })
            .collect();
        let mut state = prior.append(interrupted.into_iter().chain([Message::user(user_message)]));
        self.store.save(&state).await?;

        let mut reason_steps = 0;
        let mut act_steps = 0;
        loop {
            budget.consume()?;
            self.enter(thread_id, Phase::Reason, &budget);
            let reply = self.reasoner.run(&state).await?;
            reason_steps += 1;
            state = state.append([reply]);
            self.store.save(&state).await?;

            match route(&state) {
                Route::Finish(response) => {
                    self.enter(thread_id, Phase::End, &budget);
                    return Ok(InvocationOutcome {
                        thread_id: thread_id.to_string(),
                        response,
                        reason_steps,
                        act_steps,
                        state,
                    });
                }
                Route::Continue => {
                    self.enter(thread_id, Phase::Act, &budget);
                    if let Some(last) = state.last() {
                        for call in &last.tool_calls {
                            self.events.emit(AgentEvent::ToolCallStarted {
                                thread_id: thread_id.to_string(),
                                call: call.clone(),
                            });
                        }
                    }
                    let outcomes = self.executor.run(&state).await;
                    act_steps += 1;
                    let mut results = Vec::with_capacity(outcomes.len());
                    for outcome in outcomes {
                        self.events.emit(AgentEvent::ToolCallCompleted {
                            thread_id: thread_id.to_string(),
                            tool_call_id: outcome.call.id,
                            tool_name: outcome.call.name,
                            is_error: outcome.error.is_some(),
                        });
                        results.push(outcome.message);
                    }
                    state = state.append(results);
                    self.store.save(&state).await?;
                }
            }
        }
    }

    fn enter(&self, thread_id: &str, phase: Phase, budget: &StepBudget) {
        debug!(
            thread_id,
            %phase,
            step = budget.used(),
            limit = budget.limit(),
            remaining = budget.remaining(),
            "entering phase"
        );
        self.events.emit(AgentEvent::PhaseEntered {
            thread_id: thread_id.to_string(),
            phase,
            step: budget.used(),
        });
    }
}

#[cfg(feature = "tavily")]
fn with_search_tool(builder: OrchestratorBuilder, config: &ThreadloopConfig) -> OrchestratorBuilder {
    match config.tavily_api_key.as_deref() {
        Some(key) => {
            let search = crate::tools::TavilySearchTool::new(key, config.search.base_url.clone())
                .with_max_results(config.search.max_results);
            builder.with_tool(Arc::new(search))
        }
        None => {
            tracing::warn!("TAVILY_API_KEY is not set; web search is disabled");
            builder
        }
    }
}

#[cfg(not(feature = "tavily"))]
fn with_search_tool(builder: OrchestratorBuilder, _config: &ThreadloopConfig) -> OrchestratorBuilder {
    builder
}

/// Open the store selected in configuration.
pub async fn open_store(
    backend: &CheckpointBackend,
) -> Result<Arc<dyn CheckpointStore>, ThreadloopError> {
    match backend {
        CheckpointBackend::Memory => Ok(Arc::new(InMemoryCheckpointStore::new())),
        CheckpointBackend::File { dir } => {
            Ok(Arc::new(crate::checkpoint::FileCheckpointStore::new(dir.clone())))
        }
        #[cfg(feature = "sqlite")]
        CheckpointBackend::Sqlite { path } => Ok(Arc::new(
            crate::checkpoint::SqliteCheckpointStore::open(path).await?,
        )),
        #[cfg(not(feature = "sqlite"))]
        CheckpointBackend::Sqlite { .. } => Err(ThreadloopError::Configuration(
            "sqlite checkpoints require the `sqlite` feature".into(),
        )),
    }
}

/// Builder for [`Orchestrator`]. A model is required; everything else has a default.
pub struct OrchestratorBuilder {
    model: Option<Arc<dyn ChatModel>>,
    tools: Vec<Arc<dyn Tool>>,
    store: Option<Arc<dyn CheckpointStore>>,
    prompt: PromptConfig,
    settings: GenerationSettings,
    max_steps: usize,
    fallback_message: String,
    event_sink: Option<AgentEventSink>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self {
            model: None,
            tools: Vec::new(),
            store: None,
            prompt: PromptConfig::default(),
            settings: GenerationSettings::builder().temperature(0.0).build(),
            max_steps: DEFAULT_MAX_STEPS,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            event_sink: None,
        }
    }
}

impl OrchestratorBuilder {
    /// Builder preloaded from configuration; callers may still add a sink or tools.
    #[cfg(feature = "openai")]
    pub async fn from_config(config: &ThreadloopConfig) -> Result<Self, ThreadloopError> {
        config.validate()?;
        let model = crate::provider::openai::OpenAiProvider::new(
            config.model.clone(),
            config.require_openai_key()?.to_string(),
            config.openai_base_url.clone(),
        );

        let builder = Self::default()
            .with_model(Arc::new(model))
            .with_store(open_store(&config.checkpoint).await?)
            .with_prompt(config.prompt.clone())
            .with_settings(config.generation_settings())
            .with_max_steps(config.max_steps)
            .with_fallback_message(config.fallback_message.clone());
        Ok(with_search_tool(builder, config))
    }

    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_prompt(mut self, prompt: PromptConfig) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn with_event_sink(mut self, sink: AgentEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<Orchestrator, ThreadloopError> {
        let model = self
            .model
            .ok_or_else(|| ThreadloopError::Configuration("a chat model is required".into()))?;
        if self.max_steps == 0 {
            return Err(ThreadloopError::Configuration(
                "max_steps must be at least 1".into(),
            ));
        }

        let mut registry = ToolRegistry::new();
        for tool in self.tools {
            registry.register(tool)?;
        }
        let registry = Arc::new(registry);

        Ok(Orchestrator {
            reasoner: Reasoner::new(model, self.prompt, &registry, self.settings),
            executor: ToolExecutor::new(registry),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryCheckpointStore::new())),
            max_steps: self.max_steps,
            fallback_message: self.fallback_message,
            events: AgentEventEmitter::new(self.event_sink),
        })
    }
}
