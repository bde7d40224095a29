//! Render collaborator client.
//!
//! The render service turns validated chart parameters into an artifact
//! reference. Chart tools and map tools use different request bodies but
//! the same response envelope:
//!
//! ```text
//! { "success": bool, "errorMessage"?: string, "resultObj"?: string | { content, metadata? } }
//! ```
//!
//! `success: false` is reported as [`RenderError::Rejected`] so the
//! dispatcher can turn it into an `isError` tool result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::charts::ChartKind;
use crate::config::RenderConfig;
use crate::error::RenderError;

/// Source tag sent with every render request.
pub const RENDER_SOURCE: &str = "mcp-server-chart";

/// Something that can render a tool's validated parameters.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Renders `parameters` for the tool named `tool`.
    async fn render(&self, tool: &str, parameters: &Value) -> Result<RenderArtifact, RenderError>;
}

/// The `resultObj` of a successful render.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RenderArtifact {
    /// A URL pointing at the rendered chart.
    Url(String),
    /// Ready-made tool content.
    Content {
        /// Content blocks to return to the client, kept as received.
        content: Vec<Value>,
        /// Opaque metadata.
        #[serde(default)]
        metadata: Option<Value>,
    },
}

/// Render service response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    /// Whether the render succeeded.
    pub success: bool,
    /// Error description when `success` is false.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Result payload when `success` is true.
    #[serde(default)]
    pub result_obj: Option<RenderArtifact>,
}

impl RenderResponse {
    /// Converts the envelope into an artifact or a render error.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Rejected`] for `success: false` and
    /// [`RenderError::InvalidResponse`] when a successful response has no result.
    pub fn into_result(self) -> Result<RenderArtifact, RenderError> {
        if !self.success {
            return Err(RenderError::Rejected {
                message: self
                    .error_message
                    .unwrap_or_else(|| "render service reported failure".to_string()),
            });
        }
        self.result_obj.ok_or_else(|| RenderError::InvalidResponse {
            message: "missing resultObj".to_string(),
        })
    }
}

/// Request body for chart tools: the options are flattened next to `type`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartRequest<'a> {
    #[serde(rename = "type")]
    chart_type: &'a str,
    #[serde(flatten)]
    options: &'a Map<String, Value>,
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_id: Option<&'a str>,
}

/// Request body for map tools.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MapRequest<'a> {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_id: Option<&'a str>,
    tool: &'a str,
    input: &'a Value,
}

/// Builds the JSON body sent to the render service for `tool`.
///
/// # Errors
///
/// Returns [`RenderError::UnknownTool`] if `tool` is not a chart tool.
pub fn request_body(
    tool: &str,
    parameters: &Value,
    service_id: Option<&str>,
) -> Result<Value, RenderError> {
    let kind = ChartKind::from_name(tool).ok_or_else(|| RenderError::UnknownTool {
        tool: tool.to_string(),
    })?;

    let body = match kind.render_type() {
        Some(chart_type) => {
            let empty = Map::new();
            let options = parameters.as_object().unwrap_or(&empty);
            serde_json::to_value(ChartRequest {
                chart_type,
                options,
                source: RENDER_SOURCE,
                service_id,
            })
        }
        None => serde_json::to_value(MapRequest {
            source: RENDER_SOURCE,
            service_id,
            tool,
            input: parameters,
        }),
    };

    body.map_err(|e| RenderError::InvalidResponse {
        message: format!("failed to encode request: {e}"),
    })
}

/// HTTP client for the render service.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    endpoint: String,
    service_id: Option<String>,
    timeout_secs: u64,
}

impl HttpRenderer {
    /// Creates a renderer from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(RenderError::Client)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            service_id: config.service_id.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, e: reqwest::Error) -> RenderError {
        if e.is_timeout() {
            RenderError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            RenderError::Transport(e)
        }
    }
}

#[async_trait]
impl RenderBackend for HttpRenderer {
    async fn render(&self, tool: &str, parameters: &Value) -> Result<RenderArtifact, RenderError> {
        let body = request_body(tool, parameters, self.service_id.as_deref())?;

        tracing::debug!(tool = %tool, endpoint = %self.endpoint, "Sending render request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
            });
        }

        let envelope: RenderResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                RenderError::InvalidResponse {
                    message: e.to_string(),
                }
            }
        })?;

        envelope.into_result()
    }
}
