//! Error types for mcp-server-chart.
//!
//! Tool-level errors ([`ToolError`], [`RenderError`]) never cross a transport
//! boundary: the dispatcher turns them into `isError` tool results. Only
//! [`ServerError`] and [`ConfigError`] are allowed to end the process.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors raised while assembling the tool catalog.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// Two descriptors were registered under the same name.
    #[error("duplicate tool name: {name}")]
    DuplicateTool {
        /// The conflicting tool name.
        name: String,
    },
}

/// Session registry and delivery errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// A session with this id is already registered.
    #[error("session already registered: {id}")]
    Duplicate {
        /// The conflicting session id.
        id: String,
    },

    /// No live session has this id.
    #[error("Session not found")]
    NotFound {
        /// The requested session id.
        id: String,
    },
}

/// Failures of the external render collaborator.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The HTTP client could not be constructed.
    #[error("failed to build render client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("render service timed out after {secs}s")]
    Timeout {
        /// Configured timeout in seconds.
        secs: u64,
    },

    /// Network or protocol failure talking to the render service.
    #[error("render request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The render service answered with a non-success HTTP status.
    #[error("render service returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("invalid render response: {message}")]
    InvalidResponse {
        /// Description of the decoding failure.
        message: String,
    },

    /// The render service reported `success: false`.
    #[error("{message}")]
    Rejected {
        /// Error message reported by the service.
        message: String,
    },

    /// The tool name has no render route.
    #[error("no render route for tool: {tool}")]
    UnknownTool {
        /// The tool name.
        tool: String,
    },
}

/// Errors surfaced by a tool handler.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments did not match the tool's input contract.
    #[error("Invalid parameters: {message}")]
    InvalidArguments {
        /// Description of the validation failure.
        message: String,
    },

    /// The render collaborator failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ToolError {
    /// Creates an invalid-arguments error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }
}

/// Fatal transport errors.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The server loop failed.
    #[error("server I/O error")]
    Io(#[from] std::io::Error),

    /// The configured host/port did not resolve.
    #[error("invalid listen address: {addr}")]
    InvalidAddress {
        /// Address that was requested.
        addr: String,
    },

    /// The render client could not be constructed.
    #[error("failed to set up render client")]
    Render(#[from] RenderError),

    /// The tool catalog could not be built.
    #[error("failed to build tool catalog")]
    Catalog(#[from] CatalogError),
}

impl ServerError {
    /// Creates a bind error for the given socket address.
    #[must_use]
    pub fn bind(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind {
            addr: addr.to_string(),
            source,
        }
    }
}
