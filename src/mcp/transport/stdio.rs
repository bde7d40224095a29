//! stdio transport for MCP server.
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! Requests are handled one at a time in arrival order, so replies leave in
//! the order the requests came in.

use std::future::Future;
use std::io;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};

use crate::mcp::protocol::OutgoingMessage;
use crate::mcp::server::McpServer;

/// Lifecycle of the pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Created but not yet serving.
    Uninitialized,
    /// Reading and answering messages.
    Connected,
    /// Input ended or shutdown was requested.
    Closed,
}

/// A line-oriented MCP transport over a reader/writer pair.
pub struct StdioTransport<R, W> {
    reader: R,
    writer: W,
    state: LinkState,
}

impl StdioTransport<BufReader<Stdin>, Stdout> {
    /// Creates a transport over the process's stdin and stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl Default for StdioTransport<BufReader<Stdin>, Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over an arbitrary pipe.
    pub const fn from_parts(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            state: LinkState::Uninitialized,
        }
    }

    /// Returns the current link state.
    #[must_use]
    pub const fn state(&self) -> LinkState {
        self.state
    }

    /// Reads the next message frame without its line terminator.
    ///
    /// The bytes are returned as read; decoding happens in the protocol host
    /// so that invalid UTF-8 is answered like any other malformed message.
    /// Returns `None` on EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut frame = Vec::new();
        let bytes_read = self.reader.read_until(b'\n', &mut frame).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        if frame.last() == Some(&b'\n') {
            frame.pop();
            if frame.last() == Some(&b'\r') {
                frame.pop();
            }
        }

        Ok(Some(frame))
    }

    /// Writes one outgoing message followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_message(&mut self, message: &OutgoingMessage) -> io::Result<()> {
        let json = message
            .to_json()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_raw(&json).await
    }

    async fn write_raw(&mut self, json: &str) -> io::Result<()> {
        // Framing relies on one message per line
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// Serves `server` until EOF, a write failure, or `shutdown` resolves.
    ///
    /// A request still being handled when `shutdown` fires is abandoned and
    /// gets no reply.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the pipe fails.
    pub async fn serve<F>(mut self, mut server: McpServer, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.state = LinkState::Connected;
        tracing::info!(session = %server.session().id(), "stdio transport connected");

        let result = loop {
            let frame = tokio::select! {
                () = &mut shutdown => break Ok(()),
                frame = self.read_frame() => frame,
            };

            let frame = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("stdin closed");
                    break Ok(());
                }
                Err(e) => break Err(e),
            };

            if frame.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let reply = tokio::select! {
                () = &mut shutdown => {
                    tracing::debug!("Abandoning in-flight request on shutdown");
                    break Ok(());
                }
                reply = server.handle_frame(&frame) => reply,
            };

            if let Some(reply) = reply {
                if let Err(e) = self.write_message(&reply).await {
                    tracing::warn!(error = %e, "Failed to write reply, closing transport");
                    break Ok(());
                }
            }
        };

        server.shutdown();
        self.state = LinkState::Closed;
        tracing::info!(session = %server.session().id(), "stdio transport closed");
        result
    }
}
