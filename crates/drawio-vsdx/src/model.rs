// crates/drawio-vsdx/src/model.rs
//
// Serializable draw.io file model. Field order follows the attribute order the writer
// emits, so the JSON form of a decoded file is stable across runs.

use serde::{Deserialize, Serialize};

use crate::serde_f64;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MxFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,

    #[serde(default)]
    pub diagrams: Vec<Diagram>,
}

/// One page. Decoded diagrams carry `graph_model`; a file read back from disk keeps
/// the compressed body in `encoded_payload` as well.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagram {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_payload: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_model: Option<MxGraphModel>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MxGraphModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guides: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<bool>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub page_scale: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub page_width: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub page_height: Option<f64>,

    #[serde(default)]
    pub root: Root,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Root {
    #[serde(default)]
    pub cells: Vec<MxCell>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MxCell {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<MxGeometry>,

    /// Position in document order; not part of the serialized form.
    #[serde(default, skip)]
    pub order: usize,
}

impl MxCell {
    pub fn is_vertex(&self) -> bool {
        self.vertex == Some(true)
    }

    pub fn is_edge(&self) -> bool {
        self.edge == Some(true)
    }

    /// Style entry `key=value`; the leading style name has no value.
    pub fn style_value(&self, key: &str) -> Option<&str> {
        self.style
            .as_deref()?
            .split(';')
            .filter_map(|entry| entry.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MxGeometry {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub x: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub y: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub width: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub height: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_attr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_point: Option<MxPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_point: Option<MxPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_point: Option<MxPoint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<MxPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MxPoint {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub x: Option<f64>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serde_f64::ser_opt_f64_compact",
        deserialize_with = "serde_f64::de_opt_f64"
    )]
    pub y: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_attr: Option<String>,
}

impl MxGraphModel {
    pub fn cell(&self, id: &str) -> Option<&MxCell> {
        self.root.cells.iter().find(|c| c.id == id)
    }

    pub fn children_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a MxCell> + 'a {
        self.root
            .cells
            .iter()
            .filter(move |c| c.parent.as_deref() == Some(parent))
    }
}
