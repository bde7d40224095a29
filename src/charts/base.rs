//! Shared parameter types, defaults and schema fragments.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ToolError;

/// JSON Schema dialect advertised in every input schema.
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// Default chart width in pixels.
pub const DEFAULT_WIDTH: f64 = 600.0;
/// Default chart height in pixels.
pub const DEFAULT_HEIGHT: f64 = 400.0;
/// Default map width in pixels.
pub const DEFAULT_MAP_WIDTH: f64 = 1600.0;
/// Default map height in pixels.
pub const DEFAULT_MAP_HEIGHT: f64 = 1000.0;

/// Visual theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// The default light theme.
    #[default]
    Default,
    /// Academic paper style.
    Academy,
    /// Dark background.
    Dark,
}

/// Rendering texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Texture {
    /// Clean vector rendering.
    #[default]
    Default,
    /// Hand-drawn look.
    Rough,
}

pub(crate) const fn default_width() -> f64 {
    DEFAULT_WIDTH
}

pub(crate) const fn default_height() -> f64 {
    DEFAULT_HEIGHT
}

pub(crate) const fn default_map_width() -> f64 {
    DEFAULT_MAP_WIDTH
}

pub(crate) const fn default_map_height() -> f64 {
    DEFAULT_MAP_HEIGHT
}

/// Deserialises tool arguments into a parameter struct.
pub(crate) fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid(e.to_string()))
}

pub(crate) fn ensure_non_empty<T>(field: &str, items: &[T], what: &str) -> Result<(), ToolError> {
    if items.is_empty() {
        return Err(ToolError::invalid(format!("{field}: {what} cannot be empty.")));
    }
    Ok(())
}

/// Sizes are advertised as plain numbers, so fractional pixels are fine.
pub(crate) fn ensure_size(width: f64, height: f64) -> Result<(), ToolError> {
    if width <= 0.0 || height <= 0.0 {
        return Err(ToolError::invalid(
            "width/height: chart dimensions must be greater than zero.",
        ));
    }
    Ok(())
}

/// Wraps properties into a top-level object schema.
pub(crate) fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "$schema": SCHEMA_DIALECT,
    })
}

pub(crate) fn theme_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["default", "academy", "dark"],
        "default": "default",
        "description": "Set the theme for the chart, optional, default is 'default'."
    })
}

pub(crate) fn texture_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["default", "rough"],
        "default": "default",
        "description": "Set the texture for the chart, optional, default is 'default'. 'rough' refers to hand-drawn style."
    })
}

pub(crate) fn width_schema() -> Value {
    json!({
        "type": "number",
        "default": DEFAULT_WIDTH,
        "description": "Set the width of chart, default is 600."
    })
}

pub(crate) fn height_schema() -> Value {
    json!({
        "type": "number",
        "default": DEFAULT_HEIGHT,
        "description": "Set the height of chart, default is 400."
    })
}

pub(crate) fn title_schema() -> Value {
    json!({
        "type": "string",
        "default": "",
        "description": "Set the title of chart."
    })
}

pub(crate) fn axis_x_title_schema() -> Value {
    json!({
        "type": "string",
        "default": "",
        "description": "Set the x-axis title of chart."
    })
}

pub(crate) fn axis_y_title_schema() -> Value {
    json!({
        "type": "string",
        "default": "",
        "description": "Set the y-axis title of chart."
    })
}

pub(crate) fn map_title_schema() -> Value {
    json!({
        "type": "string",
        "description": "The map title should not exceed 16 characters. The content should be consistent with the information the map wants to convey and should be accurate, rich, creative, and attractive."
    })
}

pub(crate) fn pois_schema() -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "minItems": 1,
        "description": "A list of keywords for the names of points of interest (POIs) in Chinese. These POIs usually contain a group of places with similar locations, so the names should be more descriptive, must adding attributives to indicate that they are different places in the same area, such as \"北京市\" is better than \"北京\", \"杭州西湖\" is better than \"西湖\"."
    })
}

pub(crate) fn map_width_schema() -> Value {
    json!({
        "type": "number",
        "default": DEFAULT_MAP_WIDTH,
        "description": "Set the width of map, default is 1600."
    })
}

pub(crate) fn map_height_schema() -> Value {
    json!({
        "type": "number",
        "default": DEFAULT_MAP_HEIGHT,
        "description": "Set the height of map, default is 1000."
    })
}

pub(crate) fn palette_schema() -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": "Color palette for the chart, it is a collection of colors."
    })
}

pub(crate) fn background_color_schema() -> Value {
    json!({
        "type": "string",
        "description": "Background color of the chart, such as, '#fff'."
    })
}
