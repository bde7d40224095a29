//! Column chart.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::base::{
    axis_x_title_schema, axis_y_title_schema, background_color_schema, default_height,
    default_width, ensure_non_empty, ensure_size, height_schema, object_schema, palette_schema,
    texture_schema, theme_schema, title_schema, width_schema, Texture, Theme,
};
use crate::error::ToolError;

pub const NAME: &str = "generate_column_chart";

pub const DESCRIPTION: &str = "Generate a column chart, which are best for comparing categorical data, such as, when values are close, column charts are preferable because our eyes are better at judging height than other visual elements like area or angles.";

/// One bar of a categorical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDatum {
    pub category: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Column styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
}

/// Validated input for `generate_column_chart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChartParams {
    pub data: Vec<CategoryDatum>,
    #[serde(default)]
    pub group: bool,
    #[serde(default)]
    pub stack: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ColumnStyle>,
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

impl ColumnChartParams {
    /// Checks constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] describing the first violation.
    pub fn validate(&self) -> Result<(), ToolError> {
        ensure_non_empty("data", &self.data, "Column chart data")?;
        ensure_size(self.width, self.height)?;
        if self.group && self.stack {
            return Err(ToolError::invalid(
                "group/stack: grouping and stacking cannot both be enabled.",
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
                        "value": { "type": "number" },
                        "group": { "type": "string" }
                    },
                    "required": ["category", "value"]
                },
                "description": "Data for column chart, such as, [{ category: '分类一', value: 10 }, { category: '分类二', value: 20 }], when grouping or stacking is needed for column, the data should contain a `group` field, such as, when [{ category: '北京', value: 825, group: '油车' }, { category: '北京', value: 1000, group: '电车' }]."
            },
            "group": {
                "type": "boolean",
                "default": false,
                "description": "Whether grouping is enabled. When enabled, column charts require a 'group' field in the data. When `group` is true, `stack` should be false."
            },
            "stack": {
                "type": "boolean",
                "default": false,
                "description": "Whether stacking is enabled. When enabled, column charts require a 'group' field in the data. When `stack` is true, `group` should be false."
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
            "title": title_schema(),
            "axisXTitle": axis_x_title_schema(),
            "axisYTitle": axis_y_title_schema()
        }),
        &["data"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::base::parse_arguments;

    #[test]
    fn group_and_stack_are_exclusive() {
        let params: ColumnChartParams = parse_arguments(json!({
            "data": [{"category": "a", "value": 1, "group": "x"}],
            "group": true,
            "stack": true
        }))
        .unwrap();
        assert!(params.validate().is_err());
    }

    #[test]
    fn grouping_without_group_field_is_forwarded() {
        let params: ColumnChartParams = parse_arguments(json!({
            "data": [{"category": "a", "value": 1}],
            "group": true
        }))
        .unwrap();
        params.validate().unwrap();
    }

    #[test]
    fn plain_columns_pass() {
        let params: ColumnChartParams =
            parse_arguments(json!({"data": [{"category": "a", "value": 1}]})).unwrap();
        params.validate().unwrap();
    }
}
