//! Integration tests for the stateless HTTP transport.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mcp_server_chart::mcp::transport::StreamableTransport;

use common::{CountingRenderer, EchoRenderer, PendingRenderer};

fn call(id: u64, title: &str, delay_ms: u64) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {
            "name": "generate_line_chart",
            "arguments": {
                "data": [{"time": "2015", "value": delay_ms}],
                "title": title
            }
        }
    })
    .to_string()
}

async fn send(router: &Router, method: &str, body: String) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn same_request_id_never_crosses_requests() {
    let transport = StreamableTransport::new(common::dispatcher(Arc::new(EchoRenderer)));
    let router = transport.router();

    // the slow one is sent first and finishes last
    let (slow, fast) = tokio::join!(
        send(&router, "POST", call(1, "slow", 80)),
        send(&router, "POST", call(1, "fast", 5)),
    );

    assert_eq!(slow.status(), StatusCode::OK);
    assert_eq!(fast.status(), StatusCode::OK);
    assert_eq!(
        slow.headers()["content-type"],
        "application/json"
    );

    let slow = json_body(slow).await;
    let fast = json_body(fast).await;
    assert_eq!(slow["id"], 1);
    assert_eq!(fast["id"], 1);
    assert_eq!(slow["result"]["content"][0]["text"], "slow");
    assert_eq!(fast["result"]["content"][0]["text"], "fast");
    assert_eq!(transport.live_requests(), 0);
}

#[tokio::test]
async fn tools_list_without_handshake() {
    let transport = StreamableTransport::new(common::dispatcher(Arc::new(EchoRenderer)));
    let response = send(
        &transport.router(),
        "POST",
        r#"{"jsonrpc":"2.0","id":"list","method":"tools/list"}"#.to_string(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], "list");
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    let transport = StreamableTransport::new(common::dispatcher(Arc::new(EchoRenderer)));
    let router = transport.router();

    for method in ["GET", "DELETE", "PUT"] {
        let response = send(&router, method, String::new()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        let body = json_body(response).await;
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(body["id"], Value::Null);
    }
}

#[tokio::test]
async fn client_disconnect_releases_the_request_session() {
    let renderer = PendingRenderer::new();
    let counter = Arc::clone(&renderer.counter);
    let transport = StreamableTransport::new(common::dispatcher(Arc::new(renderer)));
    let router = transport.router();

    // dropping the response future stands in for the client going away
    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        send(&router, "POST", call(1, "never", 0)),
    )
    .await;

    assert!(outcome.is_err());
    assert_eq!(counter.started(), 1);
    assert_eq!(counter.live(), 0);
    assert_eq!(transport.live_requests(), 0);
}

#[tokio::test]
async fn completed_requests_leave_nothing_behind() {
    let renderer = CountingRenderer::new();
    let counter = Arc::clone(&renderer.counter);
    let transport = StreamableTransport::new(common::dispatcher(Arc::new(renderer)));
    let router = transport.router();

    for id in 1..=3 {
        let response = send(&router, "POST", call(id, "done", 0)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["result"]["content"][0]["text"],
            "https://chart.example/counted"
        );
    }

    assert_eq!(counter.started(), 3);
    assert_eq!(counter.live(), 0);
    assert_eq!(transport.live_requests(), 0);
}

#[tokio::test]
async fn invalid_request_is_bad_request() {
    let transport = StreamableTransport::new(common::dispatcher(Arc::new(EchoRenderer)));
    let response = send(
        &transport.router(),
        "POST",
        r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#.to_string(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], -32600);
}

#[tokio::test]
async fn health_and_landing_page() {
    let router = StreamableTransport::new(common::dispatcher(Arc::new(EchoRenderer))).router();

    let health = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(json_body(health).await["status"], "ok");

    let landing = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(landing.status(), StatusCode::OK);
    let text = landing.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&text).contains("/mcp"));
}
