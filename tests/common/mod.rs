//! Shared test helpers: scripted model, fake tools and stores.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use threadloop::checkpoint::{CheckpointStore, InMemoryCheckpointStore, ThreadLease};
use threadloop::error::ThreadloopError;
use threadloop::orchestrator::{AgentEvent, AgentEventSink};
use threadloop::provider::{ChatModel, ModelRequest};
use threadloop::tools::{AgentTool, Tool, ToolParameters};
use threadloop::types::{ConversationState, Message, ToolCallRequest};

pub const SEARCH_TOOL: &str = "tavily_search_results_json";

enum Step {
    Reply(Message),
    Fail(ThreadloopError),
}

/// A chat model that plays back queued replies and records every request.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Step>>,
    /// Reply with a fresh tool call forever once the script runs out.
    perpetual_tool: Mutex<Option<(String, serde_json::Value)>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            perpetual_tool: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            latency: Mutex::new(None),
        })
    }

    /// Sleep this long before answering each request.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Queue a plain text answer.
    pub fn reply_text(&self, text: &str) {
        self.push(Step::Reply(Message::assistant(text)));
    }

    /// Queue an assistant turn requesting one tool.
    pub fn reply_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.reply_tool_calls(vec![ToolCallRequest::new(id, name, args)]);
    }

    pub fn reply_tool_calls(&self, calls: Vec<ToolCallRequest>) {
        self.push(Step::Reply(Message::assistant_with_tool_calls("", calls)));
    }

    pub fn reply_message(&self, message: Message) {
        self.push(Step::Reply(message));
    }

    /// Queue a failure of the model call.
    pub fn fail(&self, err: ThreadloopError) {
        self.push(Step::Fail(err));
    }

    pub fn always_call_tool(&self, name: &str, args: serde_json::Value) {
        *self.perpetual_tool.lock().unwrap() = Some((name.to_string(), args));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<Message, ThreadloopError> {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(step) = self.script.lock().unwrap().pop_front() {
            return match step {
                Step::Reply(message) => Ok(message),
                Step::Fail(err) => Err(err),
            };
        }
        if let Some((name, args)) = self.perpetual_tool.lock().unwrap().clone() {
            return Ok(Message::assistant_with_tool_calls(
                "",
                vec![ToolCallRequest::new(format!("call_{n}"), name, args)],
            ));
        }
        Err(ThreadloopError::MalformedResponse("script exhausted".into()))
    }
}

/// Fake web search returning two ranked hits for any query.
pub fn fake_search_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        SEARCH_TOOL,
        "web search",
        ToolParameters::object()
            .string("query", "Search query", true)
            .integer("max_results", "Maximum results", false)
            .build(),
        |args, _ctx| async move {
            let query = args.get_str("query")?.to_string();
            Ok(json!([
                { "rank": 1, "title": format!("{query} - LAUSD"), "url": "https://www.lausd.org/calendar", "content": "El año escolar empieza el 14 de agosto.", "score": 0.9 },
                { "rank": 2, "title": "Noticias", "url": "https://example.org/news", "content": "…", "score": 0.4 }
            ]))
        },
    ))
}

/// Tool that answers only after `delay`.
pub fn slow_tool(name: &str, delay: Duration) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        name,
        "answers slowly",
        ToolParameters::empty(),
        move |_args, _ctx| async move {
            tokio::time::sleep(delay).await;
            Ok(json!("late"))
        },
    ))
}

/// Tool that always fails.
pub fn failing_tool(name: &str) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        name,
        "always fails",
        ToolParameters::empty(),
        |_args, _ctx| async move { Err(ThreadloopError::tool("failing", "service unavailable")) },
    ))
}

/// Collect emitted events for later inspection.
pub fn event_recorder() -> (AgentEventSink, Arc<Mutex<Vec<AgentEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();
    let sink: AgentEventSink = Arc::new(move |event: AgentEvent| sink_events.lock().unwrap().push(event));
    (sink, events)
}

/// In-memory store whose saves start failing after `ok_saves` successes.
pub struct FlakyStore {
    inner: InMemoryCheckpointStore,
    remaining: AtomicUsize,
}

impl FlakyStore {
    pub fn new(ok_saves: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryCheckpointStore::new(),
            remaining: AtomicUsize::new(ok_saves),
        })
    }

    /// Let the next `ok_saves` saves succeed again.
    pub fn recover(&self, ok_saves: usize) {
        self.remaining.store(ok_saves, Ordering::SeqCst);
    }
}

#[async_trait]
impl CheckpointStore for FlakyStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>, ThreadloopError> {
        self.inner.load(thread_id).await
    }

    async fn save(&self, state: &ConversationState) -> Result<(), ThreadloopError> {
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return Err(ThreadloopError::checkpoint(&state.thread_id, "disk full"));
        }
        self.remaining.store(left - 1, Ordering::SeqCst);
        self.inner.save(state).await
    }

    async fn list_threads(&self) -> Result<Vec<String>, ThreadloopError> {
        self.inner.list_threads().await
    }

    async fn lease(&self, thread_id: &str) -> ThreadLease {
        self.inner.lease(thread_id).await
    }
}
