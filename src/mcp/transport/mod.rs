//! Transport adapters.
//!
//! Every adapter feeds decoded messages into an [`McpServer`] and writes its
//! replies back through the connection that carried the request:
//!
//! - [`stdio`]: one session over newline-delimited JSON on stdin/stdout
//! - [`sse`]: one session per event stream, messages posted to `/messages`
//! - [`streamable`]: one throwaway session per `POST` request
//!
//! [`McpServer`]: crate::mcp::server::McpServer

pub mod sse;
pub mod stdio;
pub mod streamable;

pub use sse::SseTransport;
pub use stdio::{LinkState, StdioTransport};
pub use streamable::StreamableTransport;

use axum::http::HeaderName;
use axum::Json;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ServerError;

/// Header carrying the session id on streamable HTTP.
pub const SESSION_ID_HEADER: &str = "mcp-session-id";

/// Resolves once the process is asked to stop.
///
/// Listens for SIGINT and SIGTERM on Unix and Ctrl+C elsewhere. If a handler
/// cannot be installed the failure is logged and that source never fires.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let interrupt = async {
            match signal(SignalKind::interrupt()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGINT handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        let terminate = async {
            match signal(SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            () = interrupt => tracing::info!("Received SIGINT, initiating graceful shutdown"),
            () = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    }
}

/// Resolves `host:port` and binds a listener on the first address.
///
/// # Errors
///
/// Returns [`ServerError::InvalidAddress`] if the host does not resolve and
/// [`ServerError::Bind`] if the socket cannot be bound.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    let addr = tokio::net::lookup_host((host, port))
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| ServerError::InvalidAddress {
            addr: format!("{host}:{port}"),
        })?;

    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::bind(addr, e))
}

/// CORS policy shared by the HTTP transports.
pub(crate) fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_ID_HEADER)])
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) fn landing_text(transport: &str, endpoint: &str) -> String {
    format!(
        "{} {} ({transport}) is running. Connect your MCP client to {endpoint}\n",
        crate::mcp::protocol::SERVER_NAME,
        env!("CARGO_PKG_VERSION"),
    )
}
