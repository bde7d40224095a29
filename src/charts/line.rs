//! Line chart.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::base::{
    axis_x_title_schema, axis_y_title_schema, background_color_schema, default_height,
    default_width, ensure_non_empty, ensure_size, height_schema, object_schema, palette_schema,
    texture_schema, theme_schema, title_schema, width_schema, Texture, Theme,
};
use crate::error::ToolError;

pub const NAME: &str = "generate_line_chart";

pub const DESCRIPTION: &str = "Generate a line chart to show trends over time, such as, the ratio of Apple computer sales to Apple's profits changed from 2000 to 2016.";

/// One point of a time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesDatum {
    /// Position on the time axis, such as `"2015"`.
    pub time: String,
    /// Measured value.
    pub value: f64,
    /// Series name, used when stacking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Line styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

/// Validated input for `generate_line_chart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChartParams {
    pub data: Vec<TimeSeriesDatum>,
    #[serde(default)]
    pub stack: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<LineStyle>,
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
    #[serde(default)]
    pub axis_x_title: String,
    #[serde(default)]
    pub axis_y_title: String,
}

impl LineChartParams {
    /// Checks constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] describing the first violation.
    pub fn validate(&self) -> Result<(), ToolError> {
        ensure_non_empty("data", &self.data, "Line chart data")?;
        ensure_size(self.width, self.height)
    }
}

pub(crate) fn time_series_schema(example: &str) -> Value {
    json!({
        "type": "array",
        "minItems": 1,
        "items": {
            "type": "object",
            "properties": {
                "time": { "type": "string" },
                "value": { "type": "number" },
                "group": { "type": "string" }
            },
            "required": ["time", "value"]
        },
        "description": example
    })
}

pub fn input_schema() -> Value {
    object_schema(
        json!({
            "data": time_series_schema(
                "Data for line chart, such as, [{ time: '2015', value: 23 }, { time: '2016', value: 32 }]."
            ),
            "stack": {
                "type": "boolean",
                "default": false,
                "description": "Whether stacking is enabled. When enabled, line charts require a 'group' field in the data."
            },
            "style": {
                "type": "object",
                "properties": {
                    "backgroundColor": background_color_schema(),
                    "palette": palette_schema(),
                    "lineWidth": {
                        "type": "number",
                        "description": "Line width for the lines of chart, such as 4."
                    }
                },
                "description": "Custom style configuration for the chart."
            },
            "theme": theme_schema(),
            "texture": texture_schema(),
            "width": width_schema(),
            "height": height_schema(),
            "title": title_schema(),
            "axisXTitle": axis_x_title_schema(),
            "axisYTitle": axis_y_title_schema()
        }),
        &["data"],
    )
}
