//! Integration tests for the stdio transport over in-memory pipes.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mcp_server_chart::mcp::server::McpServer;
use mcp_server_chart::mcp::session::{Session, TransportKind};
use mcp_server_chart::mcp::transport::StdioTransport;

use common::{EchoRenderer, StubRenderer, INIT, INITIALIZED};

/// A call whose render takes `delay_ms` milliseconds and echoes `title`.
fn delayed_call(id: u64, delay_ms: u64, title: &str) -> String {
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

#[tokio::test]
async fn replies_follow_request_order() {
    let (client, server_end) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_end);
    let (client_read, mut client_write) = tokio::io::split(client);

    let server = McpServer::new(
        common::dispatcher(Arc::new(EchoRenderer)),
        Session::open(TransportKind::Stdio),
    );
    let transport = StdioTransport::from_parts(BufReader::new(server_read), server_write);
    let serving = tokio::spawn(transport.serve(server, std::future::pending()));

    let mut input = format!("{INIT}\n{INITIALIZED}\n");
    // Earlier requests render slower than later ones
    for id in 1..=5u64 {
        input.push_str(&delayed_call(id, (6 - id) * 10, &format!("chart-{id}")));
        input.push('\n');
    }
    client_write.write_all(input.as_bytes()).await.unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let init: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(init["id"], 0);

    for id in 1..=5u64 {
        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let reply: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(reply["id"], id);
        assert_eq!(reply["result"]["content"][0]["text"], format!("chart-{id}"));
    }

    // both halves must go for the server to see EOF
    drop(lines);
    drop(client_write);
    serving.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_line_does_not_end_session() {
    let mut input = b"\xff\xfe garbage\nthis is not json\n\n".to_vec();
    input.extend_from_slice(
        format!(
            "{INIT}\n{INITIALIZED}\n{}\n",
            r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#
        )
        .as_bytes(),
    );
    let mut output = Vec::new();

    let server = McpServer::new(
        common::dispatcher(Arc::new(StubRenderer::content("x"))),
        Session::open(TransportKind::Stdio),
    );
    StdioTransport::from_parts(&input[..], &mut output)
        .serve(server, std::future::pending())
        .await
        .unwrap();

    let replies: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    // two parse errors, initialize, ping; blank lines and notifications get nothing
    assert_eq!(replies.len(), 4);
    for reply in &replies[..2] {
        assert_eq!(reply["error"]["code"], -32700);
        assert_eq!(reply["id"], Value::Null);
    }
    assert_eq!(replies[2]["id"], 0);
    assert_eq!(replies[3]["id"], "p");
}

#[tokio::test]
async fn unknown_tool_is_a_failure_result() {
    let call = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"generate_nothing","arguments":{}}}"#;
    let input = format!("{INIT}\n{INITIALIZED}\n{call}\n");
    let mut output = Vec::new();

    let server = McpServer::new(
        common::dispatcher(Arc::new(StubRenderer::content("x"))),
        Session::open(TransportKind::Stdio),
    );
    StdioTransport::from_parts(input.as_bytes(), &mut output)
        .serve(server, std::future::pending())
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    let last: Value = serde_json::from_str(text.lines().last().unwrap()).unwrap();
    assert_eq!(last["result"]["isError"], true);
    assert_eq!(
        last["result"]["content"][0]["text"],
        "Unknown tool: generate_nothing"
    );
}

#[tokio::test]
async fn shutdown_abandons_in_flight_request() {
    let (client, server_end) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_end);
    let (client_read, mut client_write) = tokio::io::split(client);

    let renderer = Arc::new(common::PendingRenderer::new());
    let counter = Arc::clone(&renderer.counter);
    // a stateless session accepts tools/call without the handshake
    let server = McpServer::new(
        common::dispatcher(renderer),
        Session::open(TransportKind::StatelessHttp),
    );

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let transport = StdioTransport::from_parts(BufReader::new(server_read), server_write);
    let serving = tokio::spawn(transport.serve(server, async move {
        let _ = stop_rx.await;
    }));

    client_write
        .write_all(format!("{}\n", common::line_chart_call(1, "t")).as_bytes())
        .await
        .unwrap();

    while counter.live() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    stop_tx.send(()).unwrap();
    serving.await.unwrap().unwrap();

    assert_eq!(counter.live(), 0);
    let mut lines = BufReader::new(client_read).lines();
    assert!(lines.next_line().await.unwrap().is_none());
}
