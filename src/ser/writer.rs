use std::io::Write;

use byteorder::{BigEndian, LittleEndian};

use crate::ser::val_writer::{AsciiValWriter, BinValWriter, ScalarWriter};
use crate::{
    ElementDef, PlyError, PlyFormat, PlyHeader, PropertyType, PropertyValue, Scalar, ScalarType,
};

enum DataWriter<W: Write> {
    Ascii(AsciiValWriter<W>),
    LittleEndian(BinValWriter<W, LittleEndian>),
    BigEndian(BinValWriter<W, BigEndian>),
}

impl<W: Write> DataWriter<W> {
    fn as_scalar_writer(&mut self) -> &mut dyn ScalarWriter {
        match self {
            DataWriter::Ascii(w) => w,
            DataWriter::LittleEndian(w) => w,
            DataWriter::BigEndian(w) => w,
        }
    }

    fn into_inner(self) -> W {
        match self {
            DataWriter::Ascii(w) => w.into_inner(),
            DataWriter::LittleEndian(w) => w.into_inner(),
            DataWriter::BigEndian(w) => w.into_inner(),
        }
    }
}

/// Writes a PLY header followed by records in declaration order.
///
/// Every value must carry exactly the type its property declares, so a file
/// decoded by [`crate::PlyReader`] is written back with the same layout.
pub struct PlyWriter<W: Write> {
    header: PlyHeader,
    data: DataWriter<W>,
    current_element: usize,
    rows_written: usize,
}

impl<W: Write> PlyWriter<W> {
    pub fn new(mut writer: W, header: PlyHeader) -> Result<Self, PlyError> {
        write_header(&mut writer, &header)?;
        let data = match header.format {
            PlyFormat::Ascii => DataWriter::Ascii(AsciiValWriter::new(writer)),
            PlyFormat::BinaryLittleEndian => DataWriter::LittleEndian(BinValWriter::new(writer)),
            PlyFormat::BinaryBigEndian => DataWriter::BigEndian(BinValWriter::new(writer)),
        };
        Ok(Self {
            header,
            data,
            current_element: 0,
            rows_written: 0,
        })
    }

    pub fn header(&self) -> &PlyHeader {
        &self.header
    }

    /// Writes the next record. Values are given in property order.
    pub fn write_record(&mut self, values: &[PropertyValue]) -> Result<(), PlyError> {
        while let Some(elem_def) = self.header.elements.get(self.current_element) {
            if self.rows_written < elem_def.count {
                break;
            }
            self.current_element += 1;
            self.rows_written = 0;
        }
        let elem_def = self
            .header
            .elements
            .get(self.current_element)
            .ok_or_else(|| PlyError::invalid("all declared records were already written"))?;

        check_record(elem_def, values)?;

        let out = self.data.as_scalar_writer();
        for (prop, value) in elem_def.properties.iter().zip(values) {
            match (&prop.property_type, value) {
                (PropertyType::List { count_type, .. }, PropertyValue::List(items)) => {
                    out.write_scalar(list_count(*count_type, items.len())?)?;
                    for item in items {
                        out.write_scalar(*item)?;
                    }
                }
                (_, PropertyValue::Scalar(s)) => out.write_scalar(*s)?,
                (_, PropertyValue::List(_)) => {
                    return Err(PlyError::invalid(format!(
                        "property '{}' is not a list",
                        prop.name
                    )));
                }
            }
        }
        out.write_row_end()?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flushes and returns the underlying writer. Fails if fewer records were
    /// written than the header declares.
    pub fn finish(self) -> Result<W, PlyError> {
        let declared = self.header.total_records();
        let written = self.header.elements[..self.current_element.min(self.header.elements.len())]
            .iter()
            .map(|e| e.count)
            .sum::<usize>()
            + self.rows_written;
        if written < declared {
            return Err(PlyError::invalid(format!(
                "header declares {declared} records but only {written} were written"
            )));
        }
        let mut writer = self.data.into_inner();
        writer.flush()?;
        Ok(writer)
    }
}

fn check_record(elem_def: &ElementDef, values: &[PropertyValue]) -> Result<(), PlyError> {
    if values.len() != elem_def.properties.len() {
        return Err(PlyError::invalid(format!(
            "element '{}' has {} properties but {} values were given",
            elem_def.name,
            elem_def.properties.len(),
            values.len()
        )));
    }
    for (prop, value) in elem_def.properties.iter().zip(values) {
        let matches = match (&prop.property_type, value) {
            (PropertyType::Scalar(ty), PropertyValue::Scalar(s)) => s.scalar_type() == *ty,
            (PropertyType::List { data_type, .. }, PropertyValue::List(items)) => {
                items.iter().all(|s| s.scalar_type() == *data_type)
            }
            _ => false,
        };
        if !matches {
            return Err(PlyError::invalid(format!(
                "value for property '{}' does not match its declared type",
                prop.name
            )));
        }
    }
    Ok(())
}

fn list_count(count_type: ScalarType, len: usize) -> Result<Scalar, PlyError> {
    let too_long = || PlyError::invalid(format!("list of {len} items does not fit its count type"));
    Ok(match count_type {
        ScalarType::I8 => Scalar::I8(len.try_into().map_err(|_| too_long())?),
        ScalarType::U8 => Scalar::U8(len.try_into().map_err(|_| too_long())?),
        ScalarType::I16 => Scalar::I16(len.try_into().map_err(|_| too_long())?),
        ScalarType::U16 => Scalar::U16(len.try_into().map_err(|_| too_long())?),
        ScalarType::I32 => Scalar::I32(len.try_into().map_err(|_| too_long())?),
        ScalarType::U32 => Scalar::U32(len.try_into().map_err(|_| too_long())?),
        ScalarType::F32 | ScalarType::F64 => return Err(too_long()),
    })
}

/// Writes the header text, including the trailing `end_header` line.
pub(crate) fn write_header<W: Write>(writer: &mut W, header: &PlyHeader) -> Result<(), PlyError> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format {} {}", header.format, header.version)?;
    for comment in &header.comments {
        writeln!(writer, "comment {comment}")?;
    }
    for info in &header.obj_info {
        writeln!(writer, "obj_info {info}")?;
    }
    for element in &header.elements {
        writeln!(writer, "element {} {}", element.name, element.count)?;
        for prop in &element.properties {
            match &prop.property_type {
                PropertyType::Scalar(ty) => {
                    writeln!(writer, "property {} {}", ty.ply_name(), prop.name)?
                }
                PropertyType::List {
                    count_type,
                    data_type,
                } => writeln!(
                    writer,
                    "property list {} {} {}",
                    count_type.ply_name(),
                    data_type.ply_name(),
                    prop.name
                )?,
            }
        }
    }
    writeln!(writer, "end_header")?;
    Ok(())
}
