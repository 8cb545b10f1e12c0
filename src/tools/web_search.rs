//! Web search tool backed by the Tavily search API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolParameters;
use crate::error::ThreadloopError;
use crate::provider::http::{bearer_headers, shared_client};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
const DEFAULT_MAX_RESULTS: u64 = 5;
/// Name the model sees; kept stable so stored threads stay meaningful.
pub const WEB_SEARCH_TOOL_NAME: &str = "tavily_search_results_json";

/// One ranked hit returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub rank: usize,
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
}

pub struct TavilySearchTool {
    api_key: String,
    base_url: String,
    max_results: u64,
    parameters: ToolParameters,
}

impl TavilySearchTool {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_results: DEFAULT_MAX_RESULTS,
            parameters: ToolParameters::object()
                .string("query", "Search query", true)
                .integer("max_results", "Maximum number of results to return", false)
                .build(),
        }
    }

    pub fn with_max_results(mut self, max_results: u64) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    async fn search(&self, query: &str, max_results: u64) -> Result<Vec<SearchHit>, ThreadloopError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "query": query,
            "max_results": max_results,
            "search_depth": "basic",
            "include_answer": false,
        });

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ThreadloopError::tool(WEB_SEARCH_TOOL_NAME, e.to_string()))?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(ThreadloopError::tool(
                WEB_SEARCH_TOOL_NAME,
                format!("search API returned status {status}: {body_text}"),
            ));
        }

        let data: TavilyResponse = resp
            .json()
            .await
            .map_err(|e| ThreadloopError::tool(WEB_SEARCH_TOOL_NAME, e.to_string()))?;
        Ok(rank_results(data.results, max_results as usize))
    }
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "A search engine optimized for comprehensive, accurate, and trusted results. \
         Useful for answering questions about current events. Returns ranked results \
         with their source URLs."
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<serde_json::Value, ThreadloopError> {
        let query = args.get_str("query")?.trim();
        if query.is_empty() {
            return Err(ThreadloopError::InvalidArgument("query must not be empty".into()));
        }
        let max_results = args
            .get_u64_opt("max_results")
            .unwrap_or(self.max_results)
            .clamp(1, 20);

        debug!(thread_id = %ctx.thread_id, query, max_results, "web search");
        let hits = self.search(query, max_results).await?;
        serde_json::to_value(hits)
            .map_err(|e| ThreadloopError::tool(WEB_SEARCH_TOOL_NAME, e.to_string()))
    }
}

fn rank_results(mut results: Vec<TavilyResult>, limit: usize) -> Vec<SearchHit> {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, r)| SearchHit {
            rank: i + 1,
            title: r.title,
            url: r.url,
            content: r.content,
            score: r.score,
        })
        .collect()
}

// Tavily API response types (internal)

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}
