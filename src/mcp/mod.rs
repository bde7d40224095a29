//! Model Context Protocol (MCP) host.
//!
//! Exposes the chart tool catalog over JSON-RPC 2.0 through three
//! interchangeable transports. Whatever the transport, a message takes the
//! same path:
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐
//! │ Transport  │──▶│ McpServer  │──▶│ Dispatcher │──▶│  Catalog   │
//! │ stdio/sse/ │   │ (session   │   │ (one call, │   │ (name ->   │
//! │ streamable)│◀──│ lifecycle) │◀──│ no faults) │   │  handler)  │
//! └────────────┘   └────────────┘   └────────────┘   └────────────┘
//! ```
//!
//! The catalog and dispatcher are shared read-only by every session. The
//! session registry is used only by the event-stream transport.
//!
//! # Protocol Version
//!
//! Targets MCP `2025-03-26` and also accepts clients speaking `2024-11-05`.

pub mod catalog;
pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;

pub use catalog::{ToolCatalog, ToolDefinition, ToolHandler};
pub use dispatch::{Dispatcher, InvocationResult, ToolCallResult, ToolContent, ToolOutput};
pub use protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    OutgoingMessage, RequestId, MCP_PROTOCOL_VERSION,
};
pub use server::McpServer;
pub use session::{Session, SessionId, SessionRegistry, TransportKind};
pub use transport::{SseTransport, StdioTransport, StreamableTransport};
