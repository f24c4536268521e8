use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::de::val_reader::{AsciiValReader, BinValReader};
use crate::de::{read_record, RecordDeserializer};
use crate::{ElementDef, PlyError, PlyFormat, PlyHeader, PropertyValue, Scalar};

enum DataReader<R: BufRead> {
    Ascii(AsciiValReader<R>),
    LittleEndian(BinValReader<R, LittleEndian>),
    BigEndian(BinValReader<R, BigEndian>),
}

impl<R: BufRead> DataReader<R> {
    fn new(format: PlyFormat, reader: R) -> Self {
        match format {
            PlyFormat::Ascii => DataReader::Ascii(AsciiValReader::new(reader)),
            PlyFormat::BinaryLittleEndian => DataReader::LittleEndian(BinValReader::new(reader)),
            PlyFormat::BinaryBigEndian => DataReader::BigEndian(BinValReader::new(reader)),
        }
    }

    fn read_record(
        &mut self,
        elem_def: &ElementDef,
        values: &mut Vec<PropertyValue>,
    ) -> Result<(), PlyError> {
        match self {
            DataReader::Ascii(r) => read_record(r, elem_def, values),
            DataReader::LittleEndian(r) => read_record(r, elem_def, values),
            DataReader::BigEndian(r) => read_record(r, elem_def, values),
        }
    }

    fn into_inner(self) -> R {
        match self {
            DataReader::Ascii(r) => r.into_inner(),
            DataReader::LittleEndian(r) => r.into_inner(),
            DataReader::BigEndian(r) => r.into_inner(),
        }
    }
}

/// Streaming PLY decoder.
///
/// The header is parsed on construction; records are then decoded one at a
/// time, in file order, by [`PlyReader::decode_next_element`]. Only the most
/// recent record is held in memory.
pub struct PlyReader<R: BufRead> {
    header: PlyHeader,
    data: DataReader<R>,
    current_element: usize,
    rows_read: usize,
    values: Vec<PropertyValue>,
}

impl PlyReader<BufReader<File>> {
    /// Opens a file and parses its header.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlyError> {
        debug!("opening PLY file");
        let file = File::open(path.as_ref())?;
        Self::parse_header(BufReader::new(file))
    }
}

impl<R: BufRead> PlyReader<R> {
    /// Parses and validates the header, leaving `reader` at the first data
    /// byte.
    pub fn parse_header(mut reader: R) -> Result<Self, PlyError> {
        let header = PlyHeader::parse(&mut reader)?;
        Ok(Self {
            data: DataReader::new(header.format, reader),
            header,
            current_element: 0,
            rows_read: 0,
            values: Vec::new(),
        })
    }

    pub fn header(&self) -> &PlyHeader {
        &self.header
    }

    /// The element the next call to `decode_next_element` will read from.
    pub fn current_element(&self) -> Option<&ElementDef> {
        self.header.elements.get(self.current_element)
    }

    /// Decodes the next record in file order, `None` once every declared
    /// record has been read.
    ///
    /// A record is only returned when it was decoded completely. After an
    /// error the stream position is undefined and the reader should be
    /// dropped.
    pub fn decode_next_element(&mut self) -> Result<Option<ElementRecord<'_>>, PlyError> {
        while let Some(elem_def) = self.header.elements.get(self.current_element) {
            if self.rows_read < elem_def.count {
                break;
            }
            self.current_element += 1;
            self.rows_read = 0;
        }

        let Some(elem_def) = self.header.elements.get(self.current_element) else {
            return Ok(None);
        };

        self.data.read_record(elem_def, &mut self.values)?;
        let index = self.rows_read;
        self.rows_read += 1;

        Ok(Some(ElementRecord {
            elem_def,
            index,
            values: &self.values,
        }))
    }

    /// True once every declared record has been decoded.
    pub fn is_finished(&self) -> bool {
        let mut remaining = self.header.elements.iter().skip(self.current_element);
        match remaining.next() {
            None => true,
            Some(current) => self.rows_read >= current.count && remaining.all(|e| e.count == 0),
        }
    }

    /// Releases the underlying stream. Returns whether every declared record
    /// was consumed.
    pub fn close(self) -> bool {
        let finished = self.is_finished();
        if !finished {
            warn!(
                element = self.current_element().map(|e| e.name.as_str()),
                rows_read = self.rows_read,
                "closing PLY reader before all records were decoded"
            );
        }
        finished
    }

    /// Returns the underlying stream, positioned after the last decoded
    /// record.
    pub fn into_inner(self) -> R {
        self.data.into_inner()
    }
}

/// One decoded element instance. Borrowed from the reader and valid until
/// the next record is decoded.
#[derive(Debug, Clone, Copy)]
pub struct ElementRecord<'a> {
    elem_def: &'a ElementDef,
    index: usize,
    values: &'a [PropertyValue],
}

impl<'a> ElementRecord<'a> {
    pub fn new(elem_def: &'a ElementDef, index: usize, values: &'a [PropertyValue]) -> Self {
        Self {
            elem_def,
            index,
            values,
        }
    }

    /// Name of the element this record belongs to.
    pub fn name(&self) -> &'a str {
        &self.elem_def.name
    }

    /// Ordinal of this record within its element.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn element_def(&self) -> &'a ElementDef {
        self.elem_def
    }

    /// Property values in declaration order.
    pub fn values(&self) -> &'a [PropertyValue] {
        self.values
    }

    pub fn get(&self, property: &str) -> Option<&'a PropertyValue> {
        self.elem_def
            .property_index(property)
            .and_then(|i| self.values.get(i))
    }

    pub fn scalar(&self, property: &str) -> Option<Scalar> {
        self.get(property).and_then(PropertyValue::as_scalar)
    }

    pub fn list(&self, property: &str) -> Option<&'a [Scalar]> {
        self.get(property).and_then(PropertyValue::as_list)
    }

    /// A scalar property widened to `f64`.
    pub fn get_f64(&self, property: &str) -> Result<f64, PlyError> {
        self.scalar(property).map(|s| s.as_f64()).ok_or_else(|| {
            PlyError::invalid(format!(
                "element '{}' has no scalar property '{property}'",
                self.elem_def.name
            ))
        })
    }

    pub fn position(&self, x: &str, y: &str, z: &str) -> Result<[f64; 3], PlyError> {
        Ok([self.get_f64(x)?, self.get_f64(y)?, self.get_f64(z)?])
    }

    /// Fills any deserializable type from this record by property name.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, PlyError> {
        T::deserialize(RecordDeserializer::new(self.elem_def, self.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn skips_empty_elements() {
        let data = "ply\nformat ascii 1.0\nelement empty 0\nproperty int a\nelement vertex 1\nproperty int a\nend_header\n5\n";
        let mut reader = PlyReader::parse_header(Cursor::new(data)).unwrap();
        let record = reader.decode_next_element().unwrap().unwrap();
        assert_eq!(record.name(), "vertex");
        assert_eq!(record.scalar("a"), Some(Scalar::I32(5)));
        assert!(reader.decode_next_element().unwrap().is_none());
        assert!(reader.close());
    }

    #[test]
    fn close_reports_unread_records() {
        let data = "ply\nformat ascii 1.0\nelement vertex 2\nproperty int a\nend_header\n1\n2\n";
        let mut reader = PlyReader::parse_header(Cursor::new(data)).unwrap();
        assert!(!reader.is_finished());
        reader.decode_next_element().unwrap();
        assert!(!reader.is_finished());
        reader.decode_next_element().unwrap();
        assert!(reader.is_finished());
        assert!(reader.close());

        let reader = PlyReader::parse_header(Cursor::new(data)).unwrap();
        assert!(!reader.close());
    }

    #[test]
    fn missing_property_lookup() {
        let data = "ply\nformat ascii 1.0\nelement vertex 1\nproperty int a\nend_header\n1\n";
        let mut reader = PlyReader::parse_header(Cursor::new(data)).unwrap();
        let record = reader.decode_next_element().unwrap().unwrap();
        assert!(record.list("a").is_none());
        assert!(matches!(
            record.get_f64("b"),
            Err(PlyError::InvalidValue(_))
        ));
    }
}
