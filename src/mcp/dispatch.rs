//! Tool dispatch.
//!
//! The [`Dispatcher`] resolves a tool name against the effective catalog,
//! runs the handler exactly once and folds every outcome into an
//! [`InvocationResult`]. Handler errors and panics stop here; the transport
//! layer only ever sees a well-formed tool result.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::mcp::catalog::{ToolCatalog, ToolDefinition};

/// Content item in a tool call response.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// A block produced by the render service, written back exactly as
    /// received whatever its `type`.
    Forwarded(Value),
}

impl ToolContent {
    /// Creates a text content block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

impl Serialize for ToolContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text { text } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "text")?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            Self::Forwarded(block) => block.serialize(serializer),
        }
    }
}

/// Successful output of a tool handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Content blocks returned to the client.
    pub content: Vec<ToolContent>,
    /// Opaque metadata forwarded as `_meta`.
    pub metadata: Option<Value>,
}

impl ToolOutput {
    /// Creates an output holding a single text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            metadata: None,
        }
    }
}

/// Outcome of a single tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// The tool ran and produced content.
    Success {
        /// Content blocks returned by the tool.
        content: Vec<ToolContent>,
        /// Opaque metadata.
        metadata: Option<Value>,
    },
    /// The tool could not be resolved or failed.
    Failure {
        /// Human-readable failure description.
        message: String,
    },
}

impl InvocationResult {
    /// Creates a failure result.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Returns `true` for failures.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl From<ToolOutput> for InvocationResult {
    fn from(output: ToolOutput) -> Self {
        Self::Success {
            content: output.content,
            metadata: output.metadata,
        }
    }
}

/// Result of a tool call as encoded on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
    /// Opaque metadata.
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(message)],
            is_error: true,
            meta: None,
        }
    }
}

impl From<InvocationResult> for ToolCallResult {
    fn from(result: InvocationResult) -> Self {
        match result {
            InvocationResult::Success { content, metadata } => Self {
                content,
                is_error: false,
                meta: metadata,
            },
            InvocationResult::Failure { message } => Self::error(message),
        }
    }
}

/// Routes tool invocations to their handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    catalog: Arc<ToolCatalog>,
}

impl Dispatcher {
    /// Creates a dispatcher over the effective catalog.
    #[must_use]
    pub fn new(catalog: ToolCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Returns the catalog this dispatcher resolves against.
    #[must_use]
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Returns the advertised tool definitions.
    #[must_use]
    pub fn list(&self) -> Vec<ToolDefinition> {
        self.catalog.list()
    }

    /// Invokes `name` with `arguments`.
    ///
    /// Unknown tools, handler errors and handler panics all become
    /// [`InvocationResult::Failure`]. The handler is called at most once.
    pub async fn invoke(&self, name: &str, arguments: Value) -> InvocationResult {
        let Some(handler) = self.catalog.resolve(name) else {
            tracing::warn!(tool = %name, "Call to unknown tool");
            return InvocationResult::failure(format!("Unknown tool: {name}"));
        };

        tracing::debug!(tool = %name, "Invoking tool");

        match AssertUnwindSafe(handler.call(arguments)).catch_unwind().await {
            Ok(Ok(output)) => output.into(),
            Ok(Err(e)) => {
                tracing::warn!(tool = %name, error = %e, "Tool call failed");
                InvocationResult::failure(e.to_string())
            }
            Err(_) => {
                tracing::error!(tool = %name, "Tool handler panicked");
                InvocationResult::failure(format!("Tool '{name}' failed unexpectedly"))
            }
        }
    }
}
