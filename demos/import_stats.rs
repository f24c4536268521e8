//! Imports a `.ply` file into an in-memory mesh and prints what was read.
//!
//! ```text
//! RUST_LOG=debug cargo run --example import_stats -- bunny.ply [options.json]
//! ```

use plykit::{import_file, recognize, ImportOptions, MeshBuilder, PlyError, PLY_LOADER};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct StatsMesh {
    points: Vec<[f64; 3]>,
    polygons: usize,
    triangles: usize,
    comment: Option<String>,
}

impl MeshBuilder for StatsMesh {
    type PointId = usize;

    fn add_point(&mut self, position: [f64; 3]) -> Result<usize, PlyError> {
        self.points.push(position);
        Ok(self.points.len() - 1)
    }

    fn add_polygon(&mut self, points: &[usize]) -> Result<(), PlyError> {
        self.polygons += 1;
        if points.len() == 3 {
            self.triangles += 1;
        }
        Ok(())
    }

    fn set_comment(&mut self, comment: &str) -> Result<(), PlyError> {
        self.comment = Some(comment.to_string());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or("usage: import_stats <file.ply> [options.json]")?;
    let options = match args.next() {
        Some(options_path) => ImportOptions::from_path(options_path)?,
        None => ImportOptions::default(),
    };

    if !PLY_LOADER.matches(&path) {
        println!("warning: {path} does not look like a {} file", PLY_LOADER.user_name);
    }

    let header = recognize(&path)?;
    println!("format: {} {}", header.format, header.version);
    for element in &header.elements {
        println!("element {} x{} ({} properties)", element.name, element.count, element.properties.len());
    }

    let mut mesh = StatsMesh::default();
    let summary = import_file(&path, &options, &mut mesh)?;

    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for p in &mesh.points {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }

    println!("points:    {}", mesh.points.len());
    println!("polygons:  {} ({} triangles)", mesh.polygons, mesh.triangles);
    println!("skipped:   {} records", summary.skipped);
    if !mesh.points.is_empty() {
        println!("bounds:    {min:?} .. {max:?}");
    }
    if let Some(comment) = mesh.comment {
        println!("comments:\n{comment}");
    }
    Ok(())
}
