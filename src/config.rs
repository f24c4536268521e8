use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PlyError;

/// Maps a scalar vertex property onto a named host point channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMapping {
    pub property: String,
    pub channel: String,
}

/// How PLY elements and properties map onto host mesh data.
///
/// Every field has a default matching the common Stanford layout, so an
/// options file only needs the fields it changes:
///
/// ```json
/// { "attributes": [{ "property": "confidence", "channel": "weight" }] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub vertex_element: String,
    pub face_element: String,
    /// Property names holding the x, y and z coordinates.
    pub position: [String; 3],
    /// Accepted names for the face index list, first match wins.
    pub face_indices: Vec<String>,
    pub attributes: Vec<AttributeMapping>,
    pub import_comments: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            vertex_element: "vertex".to_string(),
            face_element: "face".to_string(),
            position: ["x".to_string(), "y".to_string(), "z".to_string()],
            face_indices: vec!["vertex_indices".to_string(), "vertex_index".to_string()],
            attributes: Vec::new(),
            import_comments: true,
        }
    }
}

impl ImportOptions {
    pub fn from_json_str(json: &str) -> Result<Self, PlyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_reader(reader: impl Read) -> Result<Self, PlyError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PlyError> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }

    pub fn with_attribute(mut self, property: impl Into<String>, channel: impl Into<String>) -> Self {
        self.attributes.push(AttributeMapping {
            property: property.into(),
            channel: channel.into(),
        });
        self
    }
}
