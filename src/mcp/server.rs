//! MCP protocol host.
//!
//! One [`McpServer`] serves one session. It implements the MCP lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling `tools/list`, `tools/call` and `ping`
//! 3. **Shutdown**: The owning transport closes the session
//!
//! The host is transport-agnostic: it turns one incoming message into at
//! most one outgoing message and leaves framing to the transport adapter.
//! Stateless HTTP sessions have no handshake, so their hosts start in
//! [`ServerState::Running`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::mcp::dispatch::{Dispatcher, ToolCallResult};
use crate::mcp::protocol::{
    parse_message, parse_slice, ErrorCode, IncomingMessage, JsonRpcError, JsonRpcErrorData,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, OutgoingMessage, RequestId,
    MCP_PROTOCOL_VERSION, SERVER_NAME, SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::mcp::session::Session;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// The protocol host for one session.
#[derive(Debug)]
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// The session this host serves.
    session: Session,
    /// Shared tool dispatcher.
    dispatcher: Arc<Dispatcher>,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
}

impl McpServer {
    /// Creates a protocol host for `session`.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, session: Session) -> Self {
        let state = if session.kind().is_stateful() {
            ServerState::AwaitingInit
        } else {
            ServerState::Running
        };

        Self {
            state,
            session,
            dispatcher,
            protocol_version: None,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the session served by this host.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the negotiated protocol version, if any.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Marks the host as shutting down and closes its session.
    pub fn shutdown(&mut self) {
        self.state = ServerState::ShuttingDown;
        self.session.close();
    }

    /// Handles a single line of input.
    ///
    /// Malformed input yields an error envelope rather than a failure.
    pub async fn handle_line(&mut self, line: &str) -> Option<OutgoingMessage> {
        match parse_message(line) {
            Ok(msg) => self.handle_message(msg).await,
            Err(error) => {
                tracing::debug!(session = %self.session.id(), "Rejected malformed message");
                Some(error.into())
            }
        }
    }

    /// Handles one raw frame, which need not be valid UTF-8.
    ///
    /// Undecodable bytes yield a parse-error envelope like any other
    /// malformed input.
    pub async fn handle_frame(&mut self, frame: &[u8]) -> Option<OutgoingMessage> {
        match parse_slice(frame) {
            Ok(msg) => self.handle_message(msg).await,
            Err(error) => {
                tracing::debug!(session = %self.session.id(), "Rejected malformed frame");
                Some(error.into())
            }
        }
    }

    /// Handles a parsed incoming message.
    ///
    /// Returns the reply for requests and `None` for notifications.
    pub async fn handle_message(&mut self, msg: IncomingMessage) -> Option<OutgoingMessage> {
        self.session.activate();

        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(ref notif) => {
                self.handle_notification(notif);
                None
            }
        }
    }

    /// Handles an incoming request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> OutgoingMessage {
        tracing::debug!(
            session = %self.session.id(),
            id = %req.id,
            method = %req.method,
            "Handling request"
        );

        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            "ping" => Ok(Self::handle_ping(&req)),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        };

        match response {
            Ok(resp) => resp.into(),
            Err(error) => error.into(),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            self.state = ServerState::Running;
            tracing::info!(session = %self.session.id(), "Client initialised");
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.session.kind().is_stateful() && self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let params: InitializeParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(
                    req.id.clone(),
                    format!("Invalid initialize params: {e}"),
                )
            })?
            .ok_or_else(|| {
                JsonRpcError::invalid_params(req.id.clone(), "Missing initialize params")
            })?;

        let negotiated_version = negotiate_version(&params.protocol_version);

        if let Some(client) = &params.client_info {
            tracing::info!(
                session = %self.session.id(),
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                protocol = negotiated_version,
                "Client connected"
            );
        }

        self.protocol_version = Some(negotiated_version.to_string());
        if self.session.kind().is_stateful() {
            self.state = ServerState::Initialising;
        }

        let result = json!({
            "protocolVersion": negotiated_version,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let result = json!({
            "tools": self.dispatcher.list(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(
        &self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(
                    req.id.clone(),
                    format!("Invalid tool call params: {e}"),
                )
            })?
            .ok_or_else(|| {
                JsonRpcError::invalid_params(req.id.clone(), "Missing tool call params")
            })?;

        tracing::info!(session = %self.session.id(), tool = %params.name, "Tool call");

        let result = ToolCallResult::from(
            self.dispatcher
                .invoke(&params.name, params.arguments)
                .await,
        );

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        let message = match self.state {
            ServerState::Running => return Ok(()),
            ServerState::ShuttingDown => "Server shutting down",
            ServerState::AwaitingInit | ServerState::Initialising => "Server not initialised",
        };
        Err(JsonRpcError::new(
            Some(id.clone()),
            JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, message),
        ))
    }
}

/// Picks the protocol version to answer an initialize request with.
fn negotiate_version(requested: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|v| *v == requested)
        .unwrap_or(MCP_PROTOCOL_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::mcp::catalog::{ToolCatalog, ToolDefinition, ToolHandler};
    use crate::mcp::dispatch::ToolOutput;
    use crate::mcp::session::{SessionState, TransportKind};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text(arguments.to_string()))
        }
    }

    fn dispatcher() -> Arc<Dispatcher> {
        let mut catalog = ToolCatalog::new();
        catalog
            .register(
                ToolDefinition {
                    name: "echo".to_string(),
                    description: "Echoes its arguments".to_string(),
                    input_schema: json!({ "type": "object" }),
                },
                Arc::new(Echo),
            )
            .unwrap();
        Arc::new(Dispatcher::new(catalog))
    }

    fn server(kind: TransportKind) -> McpServer {
        McpServer::new(dispatcher(), Session::open(kind))
    }

    async fn reply(server: &mut McpServer, line: &str) -> Value {
        let msg = server.handle_line(line).await.expect("expected a reply");
        serde_json::to_value(msg).unwrap()
    }

    const INIT: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"1"}}}"#;
    const INITIALIZED: &str = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

    #[test]
    fn server_initial_state() {
        assert_eq!(server(TransportKind::Stdio).state(), ServerState::AwaitingInit);
        assert_eq!(
            server(TransportKind::StatelessHttp).state(),
            ServerState::Running
        );
    }

    #[tokio::test]
    async fn handshake_then_list() {
        let mut server = server(TransportKind::Stdio);

        let init = reply(&mut server, INIT).await;
        assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(init["result"]["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(server.state(), ServerState::Initialising);

        assert!(server.handle_line(INITIALIZED).await.is_none());
        assert_eq!(server.state(), ServerState::Running);
        assert_eq!(server.session().state(), SessionState::Active);

        let list = reply(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        assert_eq!(list["result"]["tools"][0]["name"], "echo");
    }

    #[tokio::test]
    async fn invalid_utf8_frame_is_a_parse_error() {
        let mut server = server(TransportKind::Stdio);

        let msg = server.handle_frame(b"\xff\xfe garbage").await.unwrap();
        let value = serde_json::to_value(msg).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["id"], Value::Null);

        let init = server.handle_frame(INIT.as_bytes()).await.unwrap();
        assert_eq!(serde_json::to_value(init).unwrap()["id"], 1);
    }

    #[tokio::test]
    async fn unsupported_version_gets_latest() {
        let mut server = server(TransportKind::Stdio);
        let init = reply(
            &mut server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"1999-01-01"}}"#,
        )
        .await;
        assert_eq!(init["result"]["protocolVersion"], MCP_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn stateful_requires_handshake() {
        let mut server = server(TransportKind::EventStream);
        let list = reply(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        assert_eq!(list["error"]["code"], ErrorCode::InvalidRequest.code());
    }

    #[tokio::test]
    async fn stateful_rejects_second_initialize() {
        let mut server = server(TransportKind::Stdio);
        reply(&mut server, INIT).await;
        let again = reply(&mut server, INIT).await;
        assert_eq!(again["error"]["code"], ErrorCode::InvalidRequest.code());
    }

    #[tokio::test]
    async fn stateless_serves_without_handshake() {
        let mut server = server(TransportKind::StatelessHttp);
        let call = reply(
            &mut server,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"echo","arguments":{"x":1}}}"#,
        )
        .await;
        assert_eq!(call["id"], 7);
        assert_eq!(call["result"]["content"][0]["text"], r#"{"x":1}"#);

        // initialize is still answered on a stateless host
        let init = reply(&mut server, INIT).await;
        assert!(init.get("result").is_some());
    }

    #[tokio::test]
    async fn unknown_tool_is_error_result_not_rpc_error() {
        let mut server = server(TransportKind::StatelessHttp);
        let call = reply(
            &mut server,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"missing","arguments":{}}}"#,
        )
        .await;
        assert!(call.get("error").is_none());
        assert_eq!(call["result"]["isError"], true);
        assert!(call["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("missing"));
    }

    #[tokio::test]
    async fn missing_call_params_is_invalid_params() {
        let mut server = server(TransportKind::StatelessHttp);
        let call = reply(&mut server, r#"{"jsonrpc":"2.0","id":3,"method":"tools/call"}"#).await;
        assert_eq!(call["error"]["code"], ErrorCode::InvalidParams.code());
    }

    #[tokio::test]
    async fn unknown_method_and_parse_error() {
        let mut server = server(TransportKind::StatelessHttp);
        let unknown = reply(&mut server, r#"{"jsonrpc":"2.0","id":4,"method":"resources/list"}"#).await;
        assert_eq!(unknown["error"]["code"], ErrorCode::MethodNotFound.code());

        let garbage = reply(&mut server, "{oops").await;
        assert_eq!(garbage["error"]["code"], ErrorCode::ParseError.code());
        assert_eq!(garbage["id"], Value::Null);
    }

    #[tokio::test]
    async fn ping_and_shutdown() {
        let mut server = server(TransportKind::StatelessHttp);
        let pong = reply(&mut server, r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#).await;
        assert_eq!(pong["result"], json!({}));

        server.shutdown();
        assert!(server.session().is_closed());
        let list = reply(&mut server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        assert_eq!(list["error"]["message"], "Server shutting down");
    }
}
