//! Pie chart.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::base::{
    background_color_schema, default_height, default_width, ensure_non_empty, ensure_size,
    height_schema, object_schema, palette_schema, texture_schema, theme_schema, title_schema,
    width_schema, Texture, Theme,
};
use crate::error::ToolError;

pub const NAME: &str = "generate_pie_chart";

pub const DESCRIPTION: &str = "Generate a pie chart to show the proportion of parts, such as, market share and budget allocation.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieDatum {
    pub category: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
}

/// Validated input for `generate_pie_chart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieChartParams {
    pub data: Vec<PieDatum>,
    #[serde(default)]
    pub inner_radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<PieStyle>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub texture: Texture,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub title: String,
}

impl PieChartParams {
    /// Checks constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] describing the first violation.
    pub fn validate(&self) -> Result<(), ToolError> {
        ensure_non_empty("data", &self.data, "Pie chart data")?;
        ensure_size(self.width, self.height)?;
        if !(0.0..=1.0).contains(&self.inner_radius) {
            return Err(ToolError::invalid(
                "innerRadius: must be between 0 and 1.",
            ));
        }
        Ok(())
    }
}

pub fn input_schema() -> Value {
    object_schema(
        json!({
            "data": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "properties": {
                        "category": { "type": "string" },
                        "value": { "type": "number" }
                    },
                    "required": ["category", "value"]
                },
                "description": "Data for pie chart, it should be an array of objects, each object contains a `category` field and a `value` field, such as, [{ category: '分类一', value: 27 }]."
            },
            "innerRadius": {
                "type": "number",
                "default": 0,
                "description": "Set the innerRadius of pie chart, the value between 0 and 1. Set the pie chart as a donut chart. Set the value to 0.6 or number in [0 ,1] to enable it."
            },
            "style": {
                "type": "object",
                "properties": {
                    "backgroundColor": background_color_schema(),
                    "palette": palette_schema()
                },
                "description": "Custom style configuration for the chart."
            },
            "theme": theme_schema(),
            "texture": texture_schema(),
            "width": width_schema(),
            "height": height_schema(),
            "title": title_schema()
        }),
        &["data"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::base::parse_arguments;

    #[test]
    fn donut_radius_range() {
        let ok: PieChartParams = parse_arguments(json!({
            "data": [{"category": "a", "value": 27}],
            "innerRadius": 0.6
        }))
        .unwrap();
        ok.validate().unwrap();

        let bad: PieChartParams = parse_arguments(json!({
            "data": [{"category": "a", "value": 27}],
            "innerRadius": 1.5
        }))
        .unwrap();
        assert!(bad.validate().is_err());
    }
}
