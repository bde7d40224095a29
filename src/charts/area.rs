//! Area chart.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::base::{
    axis_x_title_schema, axis_y_title_schema, background_color_schema, default_height,
    default_width, ensure_non_empty, ensure_size, height_schema, object_schema, palette_schema,
    texture_schema, theme_schema, title_schema, width_schema, Texture, Theme,
};
use super::line::{time_series_schema, LineStyle, TimeSeriesDatum};
use crate::error::ToolError;

pub const NAME: &str = "generate_area_chart";

pub const DESCRIPTION: &str = "Generate a area chart to show data trends under continuous independent variables and observe the overall data trend, such as, displacement = velocity (average or instantaneous) × time: s = v × t. If the x-axis is time (t) and the y-axis is velocity (v) at each moment, an area chart allows you to observe the trend of velocity over time and infer the distance traveled by the area's size.";

/// Validated input for `generate_area_chart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaChartParams {
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

impl AreaChartParams {
    /// Checks constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] describing the first violation.
    pub fn validate(&self) -> Result<(), ToolError> {
        ensure_non_empty("data", &self.data, "Area chart data")?;
        ensure_size(self.width, self.height)
    }
}

pub fn input_schema() -> Value {
    object_schema(
        json!({
            "data": time_series_schema(
                "Data for area chart, such as, [{ time: '2018', value: 99.9 }]."
            ),
            "stack": {
                "type": "boolean",
                "default": false,
                "description": "Whether stacking is enabled. When enabled, area charts require a 'group' field in the data."
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
