mod record;
mod row;

pub mod val_reader;

pub(crate) use record::read_record;
pub use row::RecordDeserializer;
