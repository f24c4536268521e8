//! Bridge from decoded PLY records to a host-owned mesh.

use std::io::BufRead;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::dispatch::{import_with_monitor, ElementHandlers, ImportMonitor, ImportSummary};
use crate::{ElementRecord, ImportOptions, PlyError, PlyHeader, PlyReader, PropertyType};

/// Mesh construction interface implemented by the host application.
///
/// The importer only appends through this trait and never keeps a reference
/// to the builder once an import returns.
pub trait MeshBuilder {
    /// Handle the host returns for a created point.
    type PointId: Copy;

    fn add_point(&mut self, position: [f64; 3]) -> Result<Self::PointId, PlyError>;

    /// Adds a face polygon over previously created points, in winding order.
    fn add_polygon(&mut self, points: &[Self::PointId]) -> Result<(), PlyError>;

    /// Stores a mapped vertex property on a point channel.
    fn set_point_attribute(
        &mut self,
        _point: Self::PointId,
        _channel: &str,
        _value: f64,
    ) -> Result<(), PlyError> {
        Ok(())
    }

    /// Receives the header comments, joined with newlines.
    fn set_comment(&mut self, _comment: &str) -> Result<(), PlyError> {
        Ok(())
    }
}

/// Registration metadata a host binding needs to expose the reader as a
/// file importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderInfo {
    pub name: &'static str,
    pub user_name: &'static str,
    pub patterns: &'static [&'static str],
}

pub const PLY_LOADER: LoaderInfo = LoaderInfo {
    name: "ply_Loader",
    user_name: "Polygon File Format",
    patterns: &["*.ply"],
};

impl LoaderInfo {
    /// Whether `path` has an extension listed in `patterns`, ignoring case.
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        let Some(ext) = path.as_ref().extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.patterns
            .iter()
            .filter_map(|p| p.strip_prefix("*."))
            .any(|p| p.eq_ignore_ascii_case(ext))
    }
}

struct MeshSink<'a, B: MeshBuilder> {
    builder: &'a mut B,
    options: &'a ImportOptions,
    points: Vec<B::PointId>,
    polygon: Vec<B::PointId>,
}

fn add_vertex<B: MeshBuilder>(
    sink: &mut MeshSink<'_, B>,
    record: &ElementRecord<'_>,
) -> Result<(), PlyError> {
    let [x, y, z] = &sink.options.position;
    let point = sink.builder.add_point(record.position(x, y, z)?)?;
    for mapping in &sink.options.attributes {
        if let Some(value) = record.scalar(&mapping.property) {
            sink.builder
                .set_point_attribute(point, &mapping.channel, value.as_f64())?;
        }
    }
    sink.points.push(point);
    Ok(())
}

fn add_face<B: MeshBuilder>(
    sink: &mut MeshSink<'_, B>,
    record: &ElementRecord<'_>,
) -> Result<(), PlyError> {
    let indices = sink
        .options
        .face_indices
        .iter()
        .find_map(|name| record.list(name))
        .ok_or_else(|| PlyError::invalid(format!("face {} has no index list", record.index())))?;

    sink.polygon.clear();
    for index in indices {
        let index = index.as_usize()?;
        let point = sink.points.get(index).copied().ok_or_else(|| {
            PlyError::invalid(format!(
                "face {} references vertex {index}, only {} vertices were read",
                record.index(),
                sink.points.len()
            ))
        })?;
        sink.polygon.push(point);
    }
    sink.builder.add_polygon(&sink.polygon)
}

/// Imports vertices and faces into a [`MeshBuilder`] according to
/// [`ImportOptions`].
#[derive(Debug, Clone, Default)]
pub struct MeshImporter {
    options: ImportOptions,
}

impl MeshImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn import<R: BufRead, B: MeshBuilder>(
        &self,
        reader: PlyReader<R>,
        builder: &mut B,
    ) -> Result<ImportSummary, PlyError> {
        self.import_with_monitor(reader, builder, &mut ())
    }

    pub fn import_with_monitor<R, B, M>(
        &self,
        reader: PlyReader<R>,
        builder: &mut B,
        monitor: &mut M,
    ) -> Result<ImportSummary, PlyError>
    where
        R: BufRead,
        B: MeshBuilder,
        M: ImportMonitor + ?Sized,
    {
        let header = reader.header();
        self.check_header(header)?;
        let comment = (self.options.import_comments && !header.comments.is_empty())
            .then(|| header.comments.join("\n"));

        let mut sink = MeshSink {
            builder,
            options: &self.options,
            points: Vec::new(),
            polygon: Vec::new(),
        };

        let mut handlers: ElementHandlers<'_, MeshSink<'_, B>> = ElementHandlers::new();
        handlers
            .on(self.options.vertex_element.as_str(), add_vertex::<B>)
            .on(self.options.face_element.as_str(), add_face::<B>);
        let summary = import_with_monitor(reader, &mut handlers, &mut sink, monitor)?;

        if let Some(comment) = comment {
            debug!("tagging mesh with header comments");
            sink.builder.set_comment(&comment)?;
        }
        Ok(summary)
    }

    /// Fails early when the options or the vertex element cannot produce a
    /// mesh, and warns about attribute mappings that will never match.
    fn check_header(&self, header: &PlyHeader) -> Result<(), PlyError> {
        if self.options.vertex_element == self.options.face_element {
            return Err(PlyError::invalid(format!(
                "vertex and face elements are both named '{}'",
                self.options.face_element
            )));
        }
        let Some(vertex) = header.get_element(&self.options.vertex_element) else {
            warn!(
                element = self.options.vertex_element.as_str(),
                "file declares no vertex element"
            );
            return Ok(());
        };
        for name in &self.options.position {
            if !vertex.has_property(name) {
                return Err(PlyError::invalid(format!(
                    "vertex element has no position property '{name}'"
                )));
            }
        }
        for mapping in &self.options.attributes {
            let declared = vertex
                .properties
                .iter()
                .find(|p| p.name == mapping.property);
            match declared.map(|p| &p.property_type) {
                None => warn!(
                    property = mapping.property.as_str(),
                    "mapped attribute not present in vertex element"
                ),
                Some(PropertyType::List { .. }) => {
                    return Err(PlyError::invalid(format!(
                        "mapped attribute '{}' is a list property, only scalars map to point channels",
                        mapping.property
                    )));
                }
                Some(PropertyType::Scalar(_)) => {}
            }
        }
        Ok(())
    }
}

/// Imports a `.ply` file into `builder`. The file is open only for the
/// duration of the call.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn import_file<B: MeshBuilder>(
    path: impl AsRef<Path>,
    options: &ImportOptions,
    builder: &mut B,
) -> Result<ImportSummary, PlyError> {
    let reader = PlyReader::open(path.as_ref())?;
    info!(
        format = %reader.header().format,
        records = reader.header().total_records(),
        "recognized PLY file"
    );
    MeshImporter::new(options.clone()).import(reader, builder)
}

/// Checks that `path` is a PLY file with a supported format and returns its
/// header without decoding any data.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn recognize(path: impl AsRef<Path>) -> Result<PlyHeader, PlyError> {
    let reader = PlyReader::open(path.as_ref())?;
    Ok(reader.header().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_pattern_matching() {
        assert!(PLY_LOADER.matches("bunny.ply"));
        assert!(PLY_LOADER.matches("/scans/DRAGON.PLY"));
        assert!(!PLY_LOADER.matches("bunny.obj"));
        assert!(!PLY_LOADER.matches("ply"));
    }
}
