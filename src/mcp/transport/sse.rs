//! Event-stream (SSE) transport.
//!
//! A client opens `GET <endpoint>` and receives an `endpoint` event naming
//! the URL to post messages to. Each posted message is queued on the
//! session and answered later as a `message` event on the stream:
//!
//! ```text
//! GET  /sse                      -> event: endpoint, data: /messages?sessionId=<id>
//! POST /messages?sessionId=<id>  -> 202 Accepted
//!                                -> event: message, data: {"jsonrpc":"2.0",...}
//! ```
//!
//! Every session owns one worker task that handles its messages in order.
//! Dropping the stream removes the session from the registry, which closes
//! the inbound channel and stops the worker.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::{cors_layer, health, landing_text};
use crate::error::ServerError;
use crate::mcp::dispatch::Dispatcher;
use crate::mcp::protocol::{parse_slice, IncomingMessage, OutgoingMessage};
use crate::mcp::server::McpServer;
use crate::mcp::session::{
    Session, SessionHandle, SessionId, SessionRegistry, TransportKind,
};

/// Default stream endpoint.
pub const DEFAULT_SSE_ENDPOINT: &str = "/sse";

/// Path clients post messages to.
pub const MESSAGES_PATH: &str = "/messages";

/// Interval between keep-alive comments on idle streams.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Messages that may wait for a busy session before posts block.
const INBOUND_CAPACITY: usize = 32;

/// Replies that may wait for a slow reader.
const OUTBOUND_CAPACITY: usize = 32;

#[derive(Clone)]
struct SseState {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<Dispatcher>,
    endpoint: Arc<str>,
}

/// Event-stream transport serving many concurrent sessions.
pub struct SseTransport {
    state: SseState,
}

impl SseTransport {
    /// Creates a transport on the default `/sse` endpoint.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            state: SseState {
                registry: Arc::new(SessionRegistry::new()),
                dispatcher,
                endpoint: Arc::from(DEFAULT_SSE_ENDPOINT),
            },
        }
    }

    /// Serves the stream on `endpoint` instead of `/sse`.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.state.endpoint = Arc::from(endpoint);
        self
    }

    /// Returns the live session registry.
    #[must_use]
    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Builds the axum router for this transport.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route(&self.state.endpoint, get(open_stream))
            .route(MESSAGES_PATH, post(post_message))
            .route("/health", get(health));

        if &*self.state.endpoint != "/" {
            router = router.route(
                "/",
                get(|State(state): State<SseState>| async move {
                    landing_text("sse", &state.endpoint)
                }),
            );
        }

        router
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer())
            .with_state(self.state.clone())
    }

    /// Serves until `shutdown` resolves.
    ///
    /// On shutdown every session is closed so open streams end and the
    /// graceful shutdown can complete.
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
            "SSE server listening"
        );

        let registry = self.registry();
        let shutdown = async move {
            shutdown.await;
            registry.close_all();
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("SSE server stopped");
        Ok(())
    }
}

/// Unregisters its session when the stream is dropped.
struct StreamGuard {
    registry: Arc<SessionRegistry>,
    id: SessionId,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if self.registry.unregister(&self.id).is_some() {
            tracing::info!(session = %self.id, "Event stream closed");
        }
    }
}

async fn open_stream(
    State(state): State<SseState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let session = Session::open(TransportKind::EventStream);
    let id = session.id().clone();

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);

    state
        .registry
        .register(SessionHandle::new(id.clone(), inbound_tx))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to register session");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let guard = StreamGuard {
        registry: Arc::clone(&state.registry),
        id: id.clone(),
    };

    let server = McpServer::new(Arc::clone(&state.dispatcher), session);
    tokio::spawn(run_session(server, inbound_rx, outbound_tx));

    tracing::info!(session = %id, "Event stream opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?sessionId={id}"));

    let replies = stream::unfold((outbound_rx, guard), |(mut rx, guard)| async move {
        let message = rx.recv().await?;
        Some((Ok::<_, Infallible>(message_event(&message)), (rx, guard)))
    });

    let events = stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(replies);

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

fn message_event(message: &OutgoingMessage) -> Event {
    match message.to_json() {
        Ok(json) => Event::default().event("message").data(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode reply");
            Event::default().comment("encode error")
        }
    }
}

/// Handles one session's messages in arrival order.
async fn run_session(
    mut server: McpServer,
    mut inbound: mpsc::Receiver<IncomingMessage>,
    outbound: mpsc::Sender<OutgoingMessage>,
) {
    loop {
        let message = tokio::select! {
            () = outbound.closed() => break,
            message = inbound.recv() => message,
        };
        let Some(message) = message else { break };

        let reply = tokio::select! {
            () = outbound.closed() => {
                tracing::debug!(session = %server.session().id(), "Stream closed mid-request");
                break;
            }
            reply = server.handle_message(message) => reply,
        };

        if let Some(reply) = reply {
            if outbound.send(reply).await.is_err() {
                break;
            }
        }
    }

    server.shutdown();
    tracing::debug!(session = %server.session().id(), "Session worker stopped");
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageQuery {
    session_id: Option<String>,
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(raw_id) = query.session_id.filter(|id| !id.is_empty()) else {
        tracing::warn!("sessionId parameter is missing");
        return (StatusCode::BAD_REQUEST, "Missing sessionId parameter").into_response();
    };
    let id = SessionId::from(raw_id);

    let handle = match state.registry.lookup(&id) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(session = %id, "Session not found");
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }
    };

    let message = match parse_slice(&body) {
        Ok(message) => message,
        Err(error) => {
            tracing::debug!(session = %id, "Rejected malformed message");
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };

    tracing::debug!(session = %id, method = %message.method(), "Queueing message");

    match handle.deliver(message).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}
