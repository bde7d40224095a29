//! Organization chart.
//!
//! The tree is typed recursively but advertised with a fixed-depth schema,
//! since several clients reject recursive `$ref` schemas.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::base::{
    default_height, default_width, ensure_size, height_schema, object_schema, texture_schema,
    theme_schema, width_schema, Texture, Theme,
};
use crate::error::ToolError;

pub const NAME: &str = "generate_organization_chart";

pub const DESCRIPTION: &str = "Generate an organization chart to visualize the hierarchical structure of an organization, such as, a diagram showing the relationship between a CEO and their direct reports.";

/// Levels allowed below the root node.
pub const MAX_DEPTH: usize = 3;

/// A node in the organization tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<OrgNode>>,
}

impl OrgNode {
    /// Number of levels below this node.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .flatten()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orient {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationStyle {
    #[serde(default)]
    pub texture: Texture,
}

/// Validated input for `generate_organization_chart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationChartParams {
    pub data: OrgNode,
    #[serde(default)]
    pub orient: Orient,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<OrganizationStyle>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

impl OrganizationChartParams {
    /// Checks constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] when the tree is too deep or
    /// the dimensions are zero.
    pub fn validate(&self) -> Result<(), ToolError> {
        ensure_size(self.width, self.height)?;
        let depth = self.data.depth();
        if depth > MAX_DEPTH {
            return Err(ToolError::invalid(format!(
                "data: organization tree is {depth} levels deep, at most {MAX_DEPTH} are allowed."
            )));
        }
        Ok(())
    }
}

/// Node schema allowing `levels` more levels of children.
fn node_schema(levels: usize) -> Value {
    let mut properties = json!({
        "name": { "type": "string" },
        "description": { "type": "string" }
    });
    if levels > 0 {
        properties["children"] = json!({
            "type": "array",
            "items": node_schema(levels - 1)
        });
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["name"]
    })
}

pub fn input_schema() -> Value {
    let mut data = node_schema(MAX_DEPTH);
    data["description"] = json!(
        "Data for organization chart which is a hierarchical structure, such as, { name: 'CEO', description: 'Chief Executive Officer', children: [{ name: 'CTO', description: 'Chief Technology Officer', children: [{ name: 'Dev Manager', description: 'Development Manager' }] }] }, and the maximum depth is 3."
    );
    object_schema(
        json!({
            "data": data,
            "orient": {
                "type": "string",
                "enum": ["horizontal", "vertical"],
                "default": "vertical",
                "description": "Orientation of the organization chart, either horizontal or vertical. Default is vertical, when the level of the chart is more than 3, it is recommended to use horizontal orientation."
            },
            "style": {
                "type": "object",
                "properties": {
                    "texture": texture_schema()
                },
                "description": "Custom style configuration for the chart."
            },
            "theme": theme_schema(),
            "width": width_schema(),
            "height": height_schema()
        }),
        &["data"],
    )
}
