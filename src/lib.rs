//! A streaming PLY (Polygon File Format) reader that hands decoded geometry to
//! a host application.
//!
//! PLY files have a variable header structure that defines the data layout, so
//! the header is parsed first and then drives the decoding of every element
//! record. Records are decoded one at a time and passed to callbacks keyed by
//! element name; nothing is buffered beyond the record being delivered.
//!
//! # Example
//!
//! ```rust
//! use plykit::{import, ElementHandlers, PlyReader};
//!
//! let ply_data = r#"ply
//! format ascii 1.0
//! element vertex 1
//! property float x
//! property float y
//! property float z
//! end_header
//! 1.0 2.0 3.0
//! "#;
//!
//! let reader = PlyReader::parse_header(ply_data.as_bytes()).unwrap();
//! println!("Found {} vertices", reader.header().get_element("vertex").unwrap().count);
//!
//! let mut positions: Vec<[f64; 3]> = Vec::new();
//! let mut handlers = ElementHandlers::new();
//! handlers.on("vertex", |positions: &mut Vec<[f64; 3]>, record| {
//!     positions.push(record.position("x", "y", "z")?);
//!     Ok(())
//! });
//!
//! import(reader, &mut handlers, &mut positions).unwrap();
//! assert_eq!(positions, vec![[1.0, 2.0, 3.0]]);
//! ```

mod config;
mod de;
mod dispatch;
mod error;
mod mesh;
mod reader;
mod ser;
mod value;

pub use config::{AttributeMapping, ImportOptions};
pub use de::RecordDeserializer;
pub use dispatch::{import, import_with_monitor, ElementHandlers, ImportMonitor, ImportSummary};
pub use error::PlyError;
pub use mesh::{import_file, recognize, LoaderInfo, MeshBuilder, MeshImporter, PLY_LOADER};
pub use reader::{ElementRecord, PlyReader};
pub use ser::PlyWriter;
pub use value::{PropertyValue, Scalar};

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use tracing::debug;

/// The only format version defined for PLY.
pub const PLY_VERSION: &str = "1.0";

/// PLY file format (ascii or binary)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl PlyFormat {
    pub fn parse(s: &str) -> Result<Self, PlyError> {
        match s {
            "ascii" => Ok(PlyFormat::Ascii),
            "binary_little_endian" => Ok(PlyFormat::BinaryLittleEndian),
            "binary_big_endian" => Ok(PlyFormat::BinaryBigEndian),
            _ => Err(PlyError::header(format!("Unsupported format: {s}"))),
        }
    }
}

impl fmt::Display for PlyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlyFormat::Ascii => write!(f, "ascii"),
            PlyFormat::BinaryLittleEndian => write!(f, "binary_little_endian"),
            PlyFormat::BinaryBigEndian => write!(f, "binary_big_endian"),
        }
    }
}

/// PLY scalar data types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    pub fn parse(s: &str) -> Result<Self, PlyError> {
        match s {
            "char" | "int8" => Ok(ScalarType::I8),
            "uchar" | "uint8" => Ok(ScalarType::U8),
            "short" | "int16" => Ok(ScalarType::I16),
            "ushort" | "uint16" => Ok(ScalarType::U16),
            "int" | "int32" => Ok(ScalarType::I32),
            "uint" | "uint32" => Ok(ScalarType::U32),
            "float" | "float32" => Ok(ScalarType::F32),
            "double" | "float64" => Ok(ScalarType::F64),
            _ => Err(PlyError::header(format!("Unknown scalar type: {s}"))),
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// The canonical header spelling, as written by [`PlyWriter`].
    pub fn ply_name(&self) -> &'static str {
        match self {
            ScalarType::I8 => "char",
            ScalarType::U8 => "uchar",
            ScalarType::I16 => "short",
            ScalarType::U16 => "ushort",
            ScalarType::I32 => "int",
            ScalarType::U32 => "uint",
            ScalarType::F32 => "float",
            ScalarType::F64 => "double",
        }
    }
}

impl FromStr for ScalarType {
    type Err = PlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Layout of a single property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    /// A scalar property with a single value
    Scalar(ScalarType),
    /// A list property with variable length, prefixed by its item count
    List {
        count_type: ScalarType,
        data_type: ScalarType,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub property_type: PropertyType,
}

/// PLY element definition (e.g., vertex, face)
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDef {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PropertyDef>,
}

impl ElementDef {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            properties: Vec::new(),
        }
    }

    pub fn with_scalar(mut self, name: impl Into<String>, data_type: ScalarType) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            property_type: PropertyType::Scalar(data_type),
        });
        self
    }

    pub fn with_list(
        mut self,
        name: impl Into<String>,
        count_type: ScalarType,
        data_type: ScalarType,
    ) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            property_type: PropertyType::List {
                count_type,
                data_type,
            },
        });
        self
    }

    /// Position of a property in the record layout.
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property_index(name).is_some()
    }
}

/// PLY header containing format information and element definitions
#[derive(Debug, Clone, PartialEq)]
pub struct PlyHeader {
    pub format: PlyFormat,
    pub version: String,
    pub elements: Vec<ElementDef>,
    pub comments: Vec<String>,
    pub obj_info: Vec<String>,
}

impl PlyHeader {
    pub fn new(format: PlyFormat) -> Self {
        Self {
            format,
            version: PLY_VERSION.to_string(),
            elements: Vec::new(),
            comments: Vec::new(),
            obj_info: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: ElementDef) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Parse a PLY header, leaving the reader positioned at the first byte
    /// after `end_header`.
    pub fn parse<R: BufRead>(reader: &mut R) -> Result<Self, PlyError> {
        let mut buf = Vec::new();

        let magic = read_header_line(reader, &mut buf)?
            .ok_or_else(|| PlyError::header("Empty file"))?;
        if magic.trim() != "ply" {
            return Err(PlyError::header("File must start with 'ply'"));
        }

        let mut format = None;
        let mut version = String::new();
        let mut elements: Vec<ElementDef> = Vec::new();
        let mut comments = Vec::new();
        let mut obj_info = Vec::new();

        loop {
            let line = read_header_line(reader, &mut buf)?
                .ok_or_else(|| PlyError::header("Unexpected end of file before end_header"))?;
            let line = line.trim();

            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some(&keyword) = parts.first() else {
                continue;
            };

            match keyword {
                "end_header" => break,
                "format" => {
                    if format.is_some() {
                        return Err(PlyError::header("Duplicate format line"));
                    }
                    if !elements.is_empty() {
                        return Err(PlyError::header("Format line after element declarations"));
                    }
                    if parts.len() != 3 {
                        return Err(PlyError::header(format!("Invalid format line: {line}")));
                    }
                    if parts[2] != PLY_VERSION {
                        return Err(PlyError::header(format!(
                            "Unsupported version: {}",
                            parts[2]
                        )));
                    }
                    format = Some(PlyFormat::parse(parts[1])?);
                    version = parts[2].to_string();
                }
                "comment" => comments.push(line[keyword.len()..].trim().to_string()),
                "obj_info" => obj_info.push(line[keyword.len()..].trim().to_string()),
                "element" => {
                    if parts.len() != 3 {
                        return Err(PlyError::header(format!("Invalid element line: {line}")));
                    }
                    let count = parts[2].parse::<usize>().map_err(|_| {
                        PlyError::header(format!("Invalid element count: {}", parts[2]))
                    })?;
                    elements.push(ElementDef::new(parts[1], count));
                }
                "property" => {
                    let element = elements
                        .last_mut()
                        .ok_or_else(|| PlyError::header("Property without element"))?;

                    let property = match parts.as_slice() {
                        // property list <count_type> <data_type> <name>
                        ["property", "list", count_type, data_type, name] => {
                            let count_type = ScalarType::parse(count_type)?;
                            if !count_type.is_integer() {
                                return Err(PlyError::header(format!(
                                    "List count type must be an integer: {line}"
                                )));
                            }
                            PropertyDef {
                                name: name.to_string(),
                                property_type: PropertyType::List {
                                    count_type,
                                    data_type: ScalarType::parse(data_type)?,
                                },
                            }
                        }
                        ["property", "list", ..] => {
                            return Err(PlyError::header(format!(
                                "Invalid list property line: {line}"
                            )));
                        }
                        // property <type> <name>
                        ["property", data_type, name] => PropertyDef {
                            name: name.to_string(),
                            property_type: PropertyType::Scalar(ScalarType::parse(data_type)?),
                        },
                        _ => {
                            return Err(PlyError::header(format!("Invalid property line: {line}")));
                        }
                    };
                    element.properties.push(property);
                }
                _ => {
                    return Err(PlyError::header(format!("Unrecognized header line: {line}")));
                }
            }
        }

        let format = format.ok_or_else(|| PlyError::header("Missing format specification"))?;

        debug!(
            %format,
            elements = elements.len(),
            comments = comments.len(),
            "parsed PLY header"
        );

        Ok(PlyHeader {
            format,
            version,
            elements,
            comments,
            obj_info,
        })
    }

    /// Get element definition by name
    pub fn get_element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Check if this header defines an element with the given name
    pub fn has_element(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.name == name)
    }

    /// Total number of records declared across all elements.
    pub fn total_records(&self) -> usize {
        self.elements.iter().map(|e| e.count).sum()
    }
}

/// Reads one `\n` terminated header line. Header bytes that are not valid
/// UTF-8 make the header malformed.
fn read_header_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> Result<Option<String>, PlyError> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    let line = std::str::from_utf8(buf)
        .map_err(|_| PlyError::header("Header is not valid UTF-8"))?;
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
