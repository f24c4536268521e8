mod writer;

pub mod val_writer;

pub use writer::PlyWriter;
