//! Stub render backends shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use mcp_server_chart::bootstrap::dispatcher_for;
use mcp_server_chart::error::RenderError;
use mcp_server_chart::mcp::Dispatcher;
use mcp_server_chart::render::{RenderArtifact, RenderBackend, RenderResponse};

pub const INIT: &str = r#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{"protocolVersion":"2025-03-26","capabilities":{},"clientInfo":{"name":"test-client","version":"1.0.0"}}}"#;
pub const INITIALIZED: &str = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

/// Builds a dispatcher over the full chart catalog.
pub fn dispatcher(renderer: Arc<dyn RenderBackend>) -> Arc<Dispatcher> {
    dispatcher_for(renderer, &Default::default()).unwrap()
}

/// A `tools/call` request line for `generate_line_chart`.
pub fn line_chart_call(id: u64, title: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {
            "name": "generate_line_chart",
            "arguments": {
                "data": [{"time": "2015", "value": 23}],
                "title": title
            }
        }
    })
    .to_string()
}

/// Answers every render with a fixed response envelope.
pub struct StubRenderer {
    response: Value,
    calls: AtomicUsize,
}

impl StubRenderer {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn content(text: &str) -> Self {
        Self::new(json!({
            "success": true,
            "resultObj": { "content": [{ "type": "text", "text": text }] }
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderBackend for StubRenderer {
    async fn render(&self, _tool: &str, _parameters: &Value) -> Result<RenderArtifact, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let envelope: RenderResponse =
            serde_json::from_value(self.response.clone()).map_err(|e| {
                RenderError::InvalidResponse {
                    message: e.to_string(),
                }
            })?;
        envelope.into_result()
    }
}

/// Echoes the chart title back as text after an optional delay.
///
/// The delay is read from the first data point's value in milliseconds, so
/// tests can make later requests finish first.
pub struct EchoRenderer;

#[async_trait]
impl RenderBackend for EchoRenderer {
    async fn render(&self, _tool: &str, parameters: &Value) -> Result<RenderArtifact, RenderError> {
        let delay = parameters["data"][0]["value"].as_f64().unwrap_or(0.0);
        if delay > 0.0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        let title = parameters["title"].as_str().unwrap_or_default().to_string();
        Ok(RenderArtifact::Url(title))
    }
}

/// Counts instances alive inside `render`.
#[derive(Debug, Default)]
pub struct InstanceCounter {
    live: AtomicUsize,
    started: AtomicUsize,
}

impl InstanceCounter {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

struct Instance(Arc<InstanceCounter>);

impl Instance {
    fn new(counter: &Arc<InstanceCounter>) -> Self {
        counter.live.fetch_add(1, Ordering::SeqCst);
        counter.started.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Never finishes rendering; tracks how many calls are still pending.
pub struct PendingRenderer {
    pub counter: Arc<InstanceCounter>,
}

impl PendingRenderer {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(InstanceCounter::default()),
        }
    }
}

#[async_trait]
impl RenderBackend for PendingRenderer {
    async fn render(&self, _tool: &str, _parameters: &Value) -> Result<RenderArtifact, RenderError> {
        let _instance = Instance::new(&self.counter);
        std::future::pending().await
    }
}

/// Completes normally while counting live instances.
pub struct CountingRenderer {
    pub counter: Arc<InstanceCounter>,
}

impl CountingRenderer {
    pub fn new() -> Self {
        Self {
            counter: Arc::new(InstanceCounter::default()),
        }
    }
}

#[async_trait]
impl RenderBackend for CountingRenderer {
    async fn render(&self, _tool: &str, _parameters: &Value) -> Result<RenderArtifact, RenderError> {
        let _instance = Instance::new(&self.counter);
        tokio::task::yield_now().await;
        Ok(RenderArtifact::Url("https://chart.example/counted".to_string()))
    }
}
