//! Chart tool catalog.
//!
//! Each chart type is a variant of [`ChartKind`] with its own strongly-typed
//! parameter struct and a hand-written JSON Schema used for `tools/list`.
//! The schema is advertisement only: arguments are validated by
//! deserialising into the parameter struct and running its `validate`.
//!
//! | Tool                          | Route                      |
//! |-------------------------------|----------------------------|
//! | `generate_line_chart`         | chart `line`               |
//! | `generate_area_chart`         | chart `area`               |
//! | `generate_column_chart`       | chart `column`             |
//! | `generate_pie_chart`          | chart `pie`                |
//! | `generate_organization_chart` | chart `organization-chart` |
//! | `generate_pin_map`            | map                        |

pub mod area;
pub mod base;
pub mod column;
pub mod line;
pub mod organization;
pub mod pie;
pub mod pin_map;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

pub use area::AreaChartParams;
pub use base::{Texture, Theme};
pub use column::ColumnChartParams;
pub use line::LineChartParams;
pub use organization::OrganizationChartParams;
pub use pie::PieChartParams;
pub use pin_map::PinMapParams;

use crate::error::{CatalogError, ToolError};
use crate::mcp::catalog::{ToolCatalog, ToolDefinition, ToolHandler};
use crate::mcp::dispatch::{ToolContent, ToolOutput};
use crate::render::{RenderArtifact, RenderBackend};
use base::parse_arguments;

/// Known chart tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Line,
    Area,
    Column,
    Pie,
    Organization,
    PinMap,
}

impl ChartKind {
    /// Every kind, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Line,
        Self::Area,
        Self::Column,
        Self::Pie,
        Self::Organization,
        Self::PinMap,
    ];

    /// Tool name advertised to clients.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Line => line::NAME,
            Self::Area => area::NAME,
            Self::Column => column::NAME,
            Self::Pie => pie::NAME,
            Self::Organization => organization::NAME,
            Self::PinMap => pin_map::NAME,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Line => line::DESCRIPTION,
            Self::Area => area::DESCRIPTION,
            Self::Column => column::DESCRIPTION,
            Self::Pie => pie::DESCRIPTION,
            Self::Organization => organization::DESCRIPTION,
            Self::PinMap => pin_map::DESCRIPTION,
        }
    }

    #[must_use]
    pub fn input_schema(self) -> Value {
        match self {
            Self::Line => line::input_schema(),
            Self::Area => area::input_schema(),
            Self::Column => column::input_schema(),
            Self::Pie => pie::input_schema(),
            Self::Organization => organization::input_schema(),
            Self::PinMap => pin_map::input_schema(),
        }
    }

    /// Chart type sent to the render service, or `None` for map tools.
    #[must_use]
    pub const fn render_type(self) -> Option<&'static str> {
        match self {
            Self::Line => Some("line"),
            Self::Area => Some("area"),
            Self::Column => Some("column"),
            Self::Pie => Some("pie"),
            Self::Organization => Some("organization-chart"),
            Self::PinMap => None,
        }
    }

    /// Looks up a kind by tool name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Descriptor for `tools/list`.
    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    /// Parses and validates raw tool arguments for this kind.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if the arguments do not
    /// deserialise or fail validation.
    pub fn parse_params(self, arguments: Value) -> Result<ChartParams, ToolError> {
        let params = match self {
            Self::Line => ChartParams::Line(parse_arguments(arguments)?),
            Self::Area => ChartParams::Area(parse_arguments(arguments)?),
            Self::Column => ChartParams::Column(parse_arguments(arguments)?),
            Self::Pie => ChartParams::Pie(parse_arguments(arguments)?),
            Self::Organization => ChartParams::Organization(parse_arguments(arguments)?),
            Self::PinMap => ChartParams::PinMap(parse_arguments(arguments)?),
        };
        params.validate()?;
        Ok(params)
    }
}

/// Validated parameters for one chart tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartParams {
    Line(LineChartParams),
    Area(AreaChartParams),
    Column(ColumnChartParams),
    Pie(PieChartParams),
    Organization(OrganizationChartParams),
    PinMap(PinMapParams),
}

impl ChartParams {
    #[must_use]
    pub const fn kind(&self) -> ChartKind {
        match self {
            Self::Line(_) => ChartKind::Line,
            Self::Area(_) => ChartKind::Area,
            Self::Column(_) => ChartKind::Column,
            Self::Pie(_) => ChartKind::Pie,
            Self::Organization(_) => ChartKind::Organization,
            Self::PinMap(_) => ChartKind::PinMap,
        }
    }

    fn validate(&self) -> Result<(), ToolError> {
        match self {
            Self::Line(p) => p.validate(),
            Self::Area(p) => p.validate(),
            Self::Column(p) => p.validate(),
            Self::Pie(p) => p.validate(),
            Self::Organization(p) => p.validate(),
            Self::PinMap(p) => p.validate(),
        }
    }

    /// Serialises the parameters with defaults filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] if serialisation fails.
    pub fn to_value(&self) -> Result<Value, ToolError> {
        let value = match self {
            Self::Line(p) => serde_json::to_value(p),
            Self::Area(p) => serde_json::to_value(p),
            Self::Column(p) => serde_json::to_value(p),
            Self::Pie(p) => serde_json::to_value(p),
            Self::Organization(p) => serde_json::to_value(p),
            Self::PinMap(p) => serde_json::to_value(p),
        };
        value.map_err(|e| ToolError::invalid(format!("failed to encode parameters: {e}")))
    }
}

/// Catalog handler binding a chart kind to the render collaborator.
pub struct ChartTool {
    kind: ChartKind,
    renderer: Arc<dyn RenderBackend>,
}

impl ChartTool {
    #[must_use]
    pub fn new(kind: ChartKind, renderer: Arc<dyn RenderBackend>) -> Self {
        Self { kind, renderer }
    }

    #[must_use]
    pub const fn kind(&self) -> ChartKind {
        self.kind
    }
}

#[async_trait]
impl ToolHandler for ChartTool {
    async fn call(&self, arguments: Value) -> Result<ToolOutput, ToolError> {
        let params = self.kind.parse_params(arguments)?.to_value()?;

        tracing::debug!(tool = self.kind.name(), "Rendering chart");
        let artifact = self.renderer.render(self.kind.name(), &params).await?;

        Ok(match artifact {
            RenderArtifact::Url(url) => ToolOutput {
                content: vec![ToolContent::text(url)],
                metadata: Some(json!({
                    "description": self.kind.description(),
                    "spec": {
                        "type": self.kind.render_type(),
                        "options": params,
                    }
                })),
            },
            RenderArtifact::Content { content, metadata } => ToolOutput {
                content: content.into_iter().map(ToolContent::Forwarded).collect(),
                metadata,
            },
        })
    }
}

/// Builds the full chart catalog backed by `renderer`.
///
/// # Errors
///
/// Returns [`CatalogError::DuplicateTool`] if two kinds share a name.
pub fn catalog(renderer: Arc<dyn RenderBackend>) -> Result<ToolCatalog, CatalogError> {
    let mut catalog = ToolCatalog::new();
    for kind in ChartKind::ALL {
        catalog.register(
            kind.definition(),
            Arc::new(ChartTool::new(kind, Arc::clone(&renderer))),
        )?;
    }
    Ok(catalog)
}
