#![cfg(feature = "tavily")]

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use threadloop::error::{ErrorKind, ThreadloopError};
use threadloop::tools::{Tool, ToolArguments, ToolExecutionContext, TavilySearchTool, WEB_SEARCH_TOOL_NAME};

fn ctx() -> ToolExecutionContext {
    ToolExecutionContext {
        thread_id: "t1".into(),
        tool_call_id: "call_1".into(),
    }
}

fn tavily_body() -> serde_json::Value {
    json!({
        "query": "calendario LAUSD",
        "results": [
            { "title": "Noticias", "url": "https://example.org/news", "content": "otros", "score": 0.31 },
            { "title": "Calendario LAUSD", "url": "https://www.lausd.org/calendar", "content": "El año escolar empieza el 14 de agosto.", "score": 0.97 },
            { "title": "Blog", "url": "https://example.org/blog", "content": "…", "score": 0.55 }
        ]
    })
}

#[tokio::test]
async fn returns_ranked_hits_with_urls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer tvly-test"))
        .and(body_partial_json(json!({ "query": "calendario LAUSD", "max_results": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tavily_body()))
        .expect(1)
        .mount(&server)
        .await;

    let tool = TavilySearchTool::new("tvly-test", Some(server.uri()));
    let args = ToolArguments::new(json!({ "query": "calendario LAUSD", "max_results": 2 }));

    let value = tool.execute(&args, &ctx()).await.unwrap();

    let hits = value.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["rank"], 1);
    assert_eq!(hits[0]["url"], "https://www.lausd.org/calendar");
    assert_eq!(hits[1]["rank"], 2);
    assert_eq!(hits[1]["url"], "https://example.org/blog");
}

#[tokio::test]
async fn default_result_count_is_configurable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({ "max_results": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tavily_body()))
        .expect(1)
        .mount(&server)
        .await;

    let tool = TavilySearchTool::new("tvly-test", Some(server.uri())).with_max_results(1);

    let value = tool
        .execute(&ToolArguments::new(json!({ "query": "calendario LAUSD" })), &ctx())
        .await
        .unwrap();

    assert_eq!(value.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upstream_failure_is_a_recoverable_tool_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let tool = TavilySearchTool::new("tvly-test", Some(server.uri()));

    let err = tool
        .execute(&ToolArguments::new(json!({ "query": "x" })), &ctx())
        .await
        .unwrap_err();

    assert!(matches!(err, ThreadloopError::ToolExecution { .. }));
    assert_eq!(err.kind(), ErrorKind::ToolInvocation);
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn blank_query_is_rejected_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tavily_body()))
        .expect(0)
        .mount(&server)
        .await;

    let tool = TavilySearchTool::new("tvly-test", Some(server.uri()));

    let err = tool
        .execute(&ToolArguments::new(json!({ "query": "   " })), &ctx())
        .await
        .unwrap_err();

    assert!(matches!(err, ThreadloopError::InvalidArgument(_)));
}

#[test]
fn advertises_the_stable_tool_name() {
    let tool = TavilySearchTool::new("k", None);

    assert_eq!(tool.name(), WEB_SEARCH_TOOL_NAME);
    assert_eq!(tool.definition().parameters["required"], json!(["query"]));
}
