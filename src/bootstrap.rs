//! Host bootstrap.
//!
//! Resolves which transport to run, builds the shared dispatcher from the
//! configuration, and drives the chosen transport until shutdown. The stdio
//! and event-stream transports create one protocol host per connection;
//! the streamable transport creates one per request.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::charts;
use crate::config::Config;
use crate::error::ServerError;
use crate::mcp::dispatch::Dispatcher;
use crate::mcp::server::McpServer;
use crate::mcp::session::{Session, TransportKind};
use crate::mcp::transport::sse::DEFAULT_SSE_ENDPOINT;
use crate::mcp::transport::streamable::DEFAULT_STREAMABLE_ENDPOINT;
use crate::mcp::transport::{self, SseTransport, StdioTransport, StreamableTransport};
use crate::render::{HttpRenderer, RenderBackend};

/// Default listen host for HTTP transports.
pub const DEFAULT_HOST: &str = "localhost";

/// Default listen port for HTTP transports.
pub const DEFAULT_PORT: u16 = 1122;

/// Environment variable that switches the process into cloud mode.
pub const ENV_PORT: &str = "PORT";

/// Environment variable naming the cloud-mode listen host.
pub const ENV_HOST: &str = "HOST";

const CLOUD_DEFAULT_HOST: &str = "0.0.0.0";
const CLOUD_DEFAULT_PORT: u16 = 8080;

/// Transport chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportSelection {
    /// Newline-delimited JSON over stdin/stdout.
    Stdio,
    /// Server-sent events with a companion `/messages` endpoint.
    Sse,
    /// Stateless HTTP, one session per request.
    Streamable,
}

impl TransportSelection {
    /// Endpoint path used when none is given.
    #[must_use]
    pub const fn default_endpoint(self) -> &'static str {
        match self {
            Self::Stdio | Self::Streamable => DEFAULT_STREAMABLE_ENDPOINT,
            Self::Sse => DEFAULT_SSE_ENDPOINT,
        }
    }
}

impl fmt::Display for TransportSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdio => "stdio",
            Self::Sse => "sse",
            Self::Streamable => "streamable",
        })
    }
}

/// Fully resolved startup parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub transport: TransportSelection,
    pub host: String,
    pub port: u16,
    /// Always starts with `/`.
    pub endpoint: String,
}

impl Launch {
    /// Builds launch parameters from command-line values.
    #[must_use]
    pub fn from_args(
        transport: TransportSelection,
        host: &str,
        port: u16,
        endpoint: Option<&str>,
    ) -> Self {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map_or_else(|| transport.default_endpoint().to_string(), normalise_path);

        Self {
            transport,
            host: host.to_string(),
            port,
            endpoint,
        }
    }

    /// Returns cloud-mode parameters when `PORT` is set.
    ///
    /// Cloud mode always serves the streamable transport on `/mcp`. An
    /// unparsable port falls back to 8080.
    pub fn cloud<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_port = lookup(ENV_PORT).filter(|p| !p.trim().is_empty())?;
        let port = raw_port.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw_port, "Invalid PORT, using {CLOUD_DEFAULT_PORT}");
            CLOUD_DEFAULT_PORT
        });
        let host = lookup(ENV_HOST)
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| CLOUD_DEFAULT_HOST.to_string());

        Some(Self {
            transport: TransportSelection::Streamable,
            host,
            port,
            endpoint: DEFAULT_STREAMABLE_ENDPOINT.to_string(),
        })
    }

    /// Prefers cloud mode, otherwise the command-line values.
    pub fn resolve<F>(
        lookup: F,
        transport: TransportSelection,
        host: &str,
        port: u16,
        endpoint: Option<&str>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::cloud(lookup).unwrap_or_else(|| Self::from_args(transport, host, port, endpoint))
    }
}

fn normalise_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Builds the shared dispatcher backed by the HTTP render service.
///
/// # Errors
///
/// Returns [`ServerError::Render`] if the HTTP client cannot be built.
pub fn build_dispatcher(config: &Config) -> Result<Arc<Dispatcher>, ServerError> {
    let renderer = HttpRenderer::new(&config.render)?;
    tracing::info!(endpoint = renderer.endpoint(), "Render service configured");
    dispatcher_for(Arc::new(renderer), &config.disabled_tools)
}

/// Builds the effective catalog over `renderer` and wraps it in a dispatcher.
///
/// # Errors
///
/// Returns [`ServerError::Catalog`] if the catalog has duplicate names.
pub fn dispatcher_for(
    renderer: Arc<dyn RenderBackend>,
    disabled_tools: &BTreeSet<String>,
) -> Result<Arc<Dispatcher>, ServerError> {
    let catalog = charts::catalog(renderer)?.filtered(disabled_tools);
    tracing::info!(
        tools = catalog.len(),
        disabled = disabled_tools.len(),
        "Tool catalog ready"
    );
    Ok(Arc::new(Dispatcher::new(catalog)))
}

/// Runs the selected transport until `shutdown` resolves.
///
/// # Errors
///
/// Returns a [`ServerError`] if the listener cannot be bound or the
/// transport fails.
pub async fn run<F>(
    launch: &Launch,
    dispatcher: Arc<Dispatcher>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        transport = %launch.transport,
        host = %launch.host,
        port = launch.port,
        endpoint = %launch.endpoint,
        "Starting transport"
    );

    match launch.transport {
        TransportSelection::Stdio => {
            let server = McpServer::new(dispatcher, Session::open(TransportKind::Stdio));
            StdioTransport::new().serve(server, shutdown).await?;
            Ok(())
        }
        TransportSelection::Sse => {
            let listener = transport::bind(&launch.host, launch.port).await?;
            SseTransport::new(dispatcher)
                .with_endpoint(&launch.endpoint)
                .serve(listener, shutdown)
                .await
        }
        TransportSelection::Streamable => {
            let listener = transport::bind(&launch.host, launch.port).await?;
            StreamableTransport::new(dispatcher)
                .with_endpoint(&launch.endpoint)
                .serve(listener, shutdown)
                .await
        }
    }
}
