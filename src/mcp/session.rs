//! Session identity, lifecycle and the event-stream session registry.
//!
//! A [`Session`] is owned by the transport adapter that created it. The
//! [`SessionRegistry`] only stores a [`SessionHandle`]: a lookup entry that
//! can queue messages into the session but does not keep it alive. Dropping
//! the last handle closes the session's inbound channel.

use std::fmt;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::SessionError;
use crate::mcp::protocol::IncomingMessage;

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The transport a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Single implicit session over stdin/stdout.
    Stdio,
    /// Long-lived server-sent event stream.
    EventStream,
    /// One session per HTTP request.
    StatelessHttp,
}

impl TransportKind {
    /// Returns `true` if sessions of this kind keep state across requests.
    #[must_use]
    pub const fn is_stateful(self) -> bool {
        !matches!(self, Self::StatelessHttp)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stdio => "stdio",
            Self::EventStream => "sse",
            Self::StatelessHttp => "streamable",
        };
        f.write_str(name)
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created by the transport handshake.
    Open,
    /// Accepting and dispatching requests.
    Active,
    /// Disconnected or shut down. Terminal.
    Closed,
}

/// Server-side state for one logical client connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    kind: TransportKind,
    state: SessionState,
}

impl Session {
    /// Opens a new session with a generated id.
    #[must_use]
    pub fn open(kind: TransportKind) -> Self {
        Self::with_id(SessionId::generate(), kind)
    }

    /// Opens a new session with a caller-chosen id.
    #[must_use]
    pub fn with_id(id: SessionId, kind: TransportKind) -> Self {
        tracing::debug!(session = %id, transport = %kind, "Session opened");
        Self {
            id,
            kind,
            state: SessionState::Open,
        }
    }

    /// Returns the session id.
    #[must_use]
    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the transport kind.
    #[must_use]
    pub const fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Moves an open session to `Active`. No effect in any other state.
    pub fn activate(&mut self) {
        if self.state == SessionState::Open {
            self.state = SessionState::Active;
            tracing::debug!(session = %self.id, "Session active");
        }
    }

    /// Moves the session to `Closed`.
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closed;
            tracing::debug!(session = %self.id, transport = %self.kind, "Session closed");
        }
    }

    /// Returns `true` once the session has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}

/// Registry entry used to route messages into a live session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    inbound: mpsc::Sender<IncomingMessage>,
}

impl SessionHandle {
    /// Creates a handle that queues messages on `inbound`.
    #[must_use]
    pub const fn new(id: SessionId, inbound: mpsc::Sender<IncomingMessage>) -> Self {
        Self { id, inbound }
    }

    /// Returns the session id.
    #[must_use]
    pub const fn id(&self) -> &SessionId {
        &self.id
    }

    /// Queues a message for the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the session has already shut
    /// down its inbound channel.
    pub async fn deliver(&self, message: IncomingMessage) -> Result<(), SessionError> {
        self.inbound
            .send(message)
            .await
            .map_err(|_| SessionError::NotFound {
                id: self.id.to_string(),
            })
    }

    /// Returns `true` if the session no longer accepts messages.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inbound.is_closed()
    }
}

/// Live event-stream sessions keyed by id.
///
/// All operations are atomic per key: a lookup never observes a partially
/// inserted or partially removed entry.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionHandle>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session handle.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Duplicate`] if the id is already live.
    pub fn register(&self, handle: SessionHandle) -> Result<(), SessionError> {
        match self.sessions.entry(handle.id().clone()) {
            Entry::Occupied(entry) => Err(SessionError::Duplicate {
                id: entry.key().to_string(),
            }),
            Entry::Vacant(entry) => {
                tracing::debug!(session = %handle.id(), "Session registered");
                entry.insert(handle);
                Ok(())
            }
        }
    }

    /// Looks up a live session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if no session has this id.
    pub fn lookup(&self, id: &SessionId) -> Result<SessionHandle, SessionError> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::NotFound { id: id.to_string() })
    }

    /// Removes a session and returns its handle if it was present.
    pub fn unregister(&self, id: &SessionId) -> Option<SessionHandle> {
        let removed = self.sessions.remove(id).map(|(_, handle)| handle);
        if removed.is_some() {
            tracing::debug!(session = %id, "Session unregistered");
        }
        removed
    }

    /// Drops every entry, closing each session's inbound channel.
    ///
    /// Returns the number of sessions removed.
    pub fn close_all(&self) -> usize {
        let count = self.sessions.len();
        self.sessions.clear();
        if count > 0 {
            tracing::info!(sessions = count, "Closed all sessions");
        }
        count
    }

    /// Returns `true` if `id` names a live session.
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Returns the number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
