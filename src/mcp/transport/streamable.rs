//! Stateless streamable HTTP transport.
//!
//! Every `POST` builds a fresh [`McpServer`] and [`Session`] that live only
//! for that request, so callers reusing the same JSON-RPC id can never
//! receive each other's replies. Nothing is registered and no session id is
//! handed out.
//!
//! | Request                    | Response                           |
//! |----------------------------|------------------------------------|
//! | `POST` request message     | `200` with the JSON reply          |
//! | `POST` notification        | `202` with an empty body           |
//! | `POST` malformed body      | `400` with code -32700 / -32600    |
//! | any other method           | `405` with code -32000             |
//! | reply cannot be encoded    | `500` with code -32603             |

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{cors_layer, health, landing_text};
use crate::error::ServerError;
use crate::mcp::dispatch::Dispatcher;
use crate::mcp::protocol::{parse_slice, JsonRpcError};
use crate::mcp::server::McpServer;
use crate::mcp::session::{Session, TransportKind};

/// Default invocation endpoint.
pub const DEFAULT_STREAMABLE_ENDPOINT: &str = "/mcp";

#[derive(Clone)]
struct StreamableState {
    dispatcher: Arc<Dispatcher>,
    endpoint: Arc<str>,
    live: Arc<AtomicUsize>,
}

/// Stateless HTTP transport.
pub struct StreamableTransport {
    state: StreamableState,
}

impl StreamableTransport {
    /// Creates a transport on the default `/mcp` endpoint.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            state: StreamableState {
                dispatcher,
                endpoint: Arc::from(DEFAULT_STREAMABLE_ENDPOINT),
                live: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    /// Serves invocations on `endpoint` instead of `/mcp`.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.state.endpoint = Arc::from(endpoint);
        self
    }

    /// Number of per-request sessions currently alive.
    #[must_use]
    pub fn live_requests(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Builds the axum router for this transport.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route(
                &self.state.endpoint,
                post(handle_post).fallback(method_not_allowed),
            )
            .route("/health", get(health));

        if &*self.state.endpoint != "/" {
            router = router.route(
                "/",
                get(|State(state): State<StreamableState>| async move {
                    landing_text("streamable", &state.endpoint)
                }),
            );
        }

        router
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer())
            .with_state(self.state.clone())
    }

    /// Serves until `shutdown` resolves, letting in-flight requests finish.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the server loop fails.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoint = %self.state.endpoint,
            "Streamable HTTP server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Streamable HTTP server stopped");
        Ok(())
    }
}

/// Owns the per-request host and releases it on drop.
///
/// Dropping happens both when the handler returns and when the client
/// disconnects and the handler future is cancelled.
struct RequestScope {
    server: McpServer,
    live: Arc<AtomicUsize>,
}

impl RequestScope {
    fn open(state: &StreamableState) -> Self {
        state.live.fetch_add(1, Ordering::SeqCst);
        Self {
            server: McpServer::new(
                Arc::clone(&state.dispatcher),
                Session::open(TransportKind::StatelessHttp),
            ),
            live: Arc::clone(&state.live),
        }
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        self.server.shutdown();
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(session = %self.server.session().id(), "Request session released");
    }
}

async fn handle_post(State(state): State<StreamableState>, body: Bytes) -> Response {
    let message = match parse_slice(&body) {
        Ok(message) => message,
        Err(error) => {
            tracing::debug!("Rejected malformed request body");
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };

    let mut scope = RequestScope::open(&state);
    let reply = scope.server.handle_message(message).await;
    drop(scope);

    let Some(reply) = reply else {
        return StatusCode::ACCEPTED.into_response();
    };

    match reply.to_json() {
        Ok(json) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            json,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode reply");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(JsonRpcError::internal_error_unbound()),
            )
                .into_response()
        }
    }
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(JsonRpcError::method_not_allowed()),
    )
        .into_response()
}
