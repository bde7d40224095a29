//! Pin map. Rendered through the map route rather than the chart route.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::base::{
    default_map_height, default_map_width, ensure_non_empty, ensure_size, map_height_schema,
    map_title_schema, map_width_schema, object_schema, pois_schema,
};
use crate::error::ToolError;

pub const NAME: &str = "generate_pin_map";

pub const DESCRIPTION: &str = "Generate a point map to display the location and distribution of point data on the map, such as the location distribution of attractions, hospitals, supermarkets, etc.";

fn default_popup_type() -> String {
    "image".to_string()
}

const fn default_popup_size() -> f64 {
    40.0
}

const fn default_border_radius() -> f64 {
    8.0
}

/// Photo popup shown on each marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPopup {
    #[serde(rename = "type", default = "default_popup_type")]
    pub kind: String,
    #[serde(default = "default_popup_size")]
    pub width: f64,
    #[serde(default = "default_popup_size")]
    pub height: f64,
    #[serde(default = "default_border_radius")]
    pub border_radius: f64,
}

impl Default for MarkerPopup {
    fn default() -> Self {
        Self {
            kind: default_popup_type(),
            width: default_popup_size(),
            height: default_popup_size(),
            border_radius: default_border_radius(),
        }
    }
}

/// Validated input for `generate_pin_map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinMapParams {
    pub title: String,
    /// Point-of-interest keywords.
    pub data: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_popup: Option<MarkerPopup>,
    #[serde(default = "default_map_width")]
    pub width: f64,
    #[serde(default = "default_map_height")]
    pub height: f64,
}

impl PinMapParams {
    /// Checks constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] describing the first violation.
    pub fn validate(&self) -> Result<(), ToolError> {
        ensure_non_empty("data", &self.data, "Map POI list")?;
        ensure_size(self.width, self.height)?;
        if let Some(popup) = &self.marker_popup {
            if popup.kind != "image" {
                return Err(ToolError::invalid("markerPopup.type: must be \"image\"."));
            }
        }
        Ok(())
    }
}

pub fn input_schema() -> Value {
    object_schema(
        json!({
            "title": map_title_schema(),
            "data": pois_schema(),
            "markerPopup": {
                "type": "object",
                "properties": {
                    "type": {
                        "type": "string",
                        "default": "image",
                        "description": "Must be \"image\"."
                    },
                    "width": {
                        "type": "number",
                        "default": 40,
                        "description": "Width of the photo."
                    },
                    "height": {
                        "type": "number",
                        "default": 40,
                        "description": "Height of the photo."
                    },
                    "borderRadius": {
                        "type": "number",
                        "default": 8,
                        "description": "Border radius of the photo."
                    }
                },
                "description": "Marker type, one is simple mode, which is just an icon and does not require `markerPopup` configuration; the other is image mode, which displays location photos and requires `markerPopup` configuration. Among them, `width`/`height`/`borderRadius` can be combined to realize rectangular photos and square photos. In addition, when `borderRadius` is half of the width and height, it can also be a circular photo."
            },
            "width": map_width_schema(),
            "height": map_height_schema()
        }),
        &["title", "data"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::base::parse_arguments;

    #[test]
    fn popup_defaults() {
        let params: PinMapParams = parse_arguments(json!({
            "title": "杭州景点",
            "data": ["杭州西湖"],
            "markerPopup": {}
        }))
        .unwrap();
        params.validate().unwrap();
        assert_eq!(params.marker_popup, Some(MarkerPopup::default()));
        assert_eq!(params.width, 1600.0);
        assert_eq!(params.height, 1000.0);
    }

    #[test]
    fn title_is_required() {
        let result: Result<PinMapParams, _> = parse_arguments(json!({"data": ["杭州西湖"]}));
        assert!(result.is_err());
    }

    #[test]
    fn empty_poi_list_is_rejected() {
        let params: PinMapParams =
            parse_arguments(json!({"title": "t", "data": []})).unwrap();
        assert!(params.validate().is_err());
    }

    #[test]
    fn popup_type_must_be_image() {
        let params: PinMapParams = parse_arguments(json!({
            "title": "t",
            "data": ["a"],
            "markerPopup": {"type": "icon"}
        }))
        .unwrap();
        assert!(params.validate().is_err());
    }
}
