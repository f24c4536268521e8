use std::io::{BufRead, Read};
use std::marker::PhantomData;
use std::str::FromStr;

use byteorder::ByteOrder;
use byteorder::ReadBytesExt;

use crate::{PlyError, Scalar, ScalarType};

pub struct BinValReader<R: Read, E: ByteOrder> {
    reader: R,
    _endian: PhantomData<E>,
}

impl<R: Read, E: ByteOrder> BinValReader<R, E> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            _endian: PhantomData,
        }
    }

    pub(crate) fn into_inner(self) -> R {
        self.reader
    }
}

/// Reads ASCII records one line at a time.
pub struct AsciiValReader<R: BufRead> {
    reader: R,
    raw: Vec<u8>,
    line: String,
    cursor: usize,
    line_number: usize,
}

impl<R: BufRead> AsciiValReader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            raw: Vec::new(),
            line: String::new(),
            cursor: 0,
            line_number: 0,
        }
    }

    pub(crate) fn into_inner(self) -> R {
        self.reader
    }
}

/// Source of typed values for one record at a time.
///
/// `read_row_start` and `read_row_end` bracket every record so line-based
/// encodings can frame it; binary encodings ignore them.
pub trait ScalarReader {
    fn read_i8(&mut self) -> Result<i8, PlyError>;
    fn read_u8(&mut self) -> Result<u8, PlyError>;
    fn read_i16(&mut self) -> Result<i16, PlyError>;
    fn read_u16(&mut self) -> Result<u16, PlyError>;
    fn read_i32(&mut self) -> Result<i32, PlyError>;
    fn read_u32(&mut self) -> Result<u32, PlyError>;
    fn read_f32(&mut self) -> Result<f32, PlyError>;
    fn read_f64(&mut self) -> Result<f64, PlyError>;

    fn read_row_start(&mut self) -> Result<(), PlyError>;
    fn read_row_end(&mut self) -> Result<(), PlyError>;

    fn read_scalar(&mut self, data_type: ScalarType) -> Result<Scalar, PlyError> {
        Ok(match data_type {
            ScalarType::I8 => Scalar::I8(self.read_i8()?),
            ScalarType::U8 => Scalar::U8(self.read_u8()?),
            ScalarType::I16 => Scalar::I16(self.read_i16()?),
            ScalarType::U16 => Scalar::U16(self.read_u16()?),
            ScalarType::I32 => Scalar::I32(self.read_i32()?),
            ScalarType::U32 => Scalar::U32(self.read_u32()?),
            ScalarType::F32 => Scalar::F32(self.read_f32()?),
            ScalarType::F64 => Scalar::F64(self.read_f64()?),
        })
    }
}

impl<R: Read, E: ByteOrder> ScalarReader for BinValReader<R, E> {
    fn read_i8(&mut self) -> Result<i8, PlyError> {
        self.reader.read_i8().map_err(PlyError::from_read)
    }

    fn read_u8(&mut self) -> Result<u8, PlyError> {
        self.reader.read_u8().map_err(PlyError::from_read)
    }

    fn read_i16(&mut self) -> Result<i16, PlyError> {
        self.reader.read_i16::<E>().map_err(PlyError::from_read)
    }

    fn read_u16(&mut self) -> Result<u16, PlyError> {
        self.reader.read_u16::<E>().map_err(PlyError::from_read)
    }

    fn read_i32(&mut self) -> Result<i32, PlyError> {
        self.reader.read_i32::<E>().map_err(PlyError::from_read)
    }

    fn read_u32(&mut self) -> Result<u32, PlyError> {
        self.reader.read_u32::<E>().map_err(PlyError::from_read)
    }

    fn read_f32(&mut self) -> Result<f32, PlyError> {
        self.reader.read_f32::<E>().map_err(PlyError::from_read)
    }

    fn read_f64(&mut self) -> Result<f64, PlyError> {
        self.reader.read_f64::<E>().map_err(PlyError::from_read)
    }

    fn read_row_start(&mut self) -> Result<(), PlyError> {
        Ok(())
    }

    fn read_row_end(&mut self) -> Result<(), PlyError> {
        Ok(())
    }
}

impl<R: BufRead> ScalarReader for AsciiValReader<R> {
    fn read_i8(&mut self) -> Result<i8, PlyError> {
        self.parse_token()
    }

    fn read_u8(&mut self) -> Result<u8, PlyError> {
        self.parse_token()
    }

    fn read_i16(&mut self) -> Result<i16, PlyError> {
        self.parse_token()
    }

    fn read_u16(&mut self) -> Result<u16, PlyError> {
        self.parse_token()
    }

    fn read_i32(&mut self) -> Result<i32, PlyError> {
        self.parse_token()
    }

    fn read_u32(&mut self) -> Result<u32, PlyError> {
        self.parse_token()
    }

    fn read_f32(&mut self) -> Result<f32, PlyError> {
        self.parse_token()
    }

    fn read_f64(&mut self) -> Result<f64, PlyError> {
        self.parse_token()
    }

    fn read_row_start(&mut self) -> Result<(), PlyError> {
        // Blank lines between records carry no data.
        loop {
            self.raw.clear();
            self.line.clear();
            self.cursor = 0;
            if self.reader.read_until(b'\n', &mut self.raw)? == 0 {
                return Err(PlyError::truncated(
                    "stream ended before the declared number of records",
                ));
            }
            self.line_number += 1;
            let text = std::str::from_utf8(&self.raw).map_err(|_| {
                PlyError::invalid(format!(
                    "data line {} is not valid text",
                    self.line_number
                ))
            })?;
            self.line.push_str(text);
            if !self.line.trim().is_empty() {
                return Ok(());
            }
        }
    }

    fn read_row_end(&mut self) -> Result<(), PlyError> {
        let line_number = self.line_number;
        match self.next_token() {
            None => Ok(()),
            Some(extra) => Err(PlyError::invalid(format!(
                "unexpected token '{extra}' after the last property on data line {line_number}"
            ))),
        }
    }
}

impl<R: BufRead> AsciiValReader<R> {
    fn next_token(&mut self) -> Option<&str> {
        let rest = &self.line[self.cursor..];
        let start = rest.len() - rest.trim_start().len();
        let rest = &rest[start..];
        if rest.is_empty() {
            self.cursor = self.line.len();
            return None;
        }
        let len = rest.find(|c: char| c.is_ascii_whitespace()).unwrap_or(rest.len());
        let token_start = self.cursor + start;
        self.cursor = token_start + len;
        Some(&self.line[token_start..token_start + len])
    }

    fn parse_token<T: FromStr>(&mut self) -> Result<T, PlyError> {
        let line_number = self.line_number;
        let token = self.next_token().ok_or_else(|| {
            PlyError::truncated(format!(
                "data line {line_number} ended before all properties were read"
            ))
        })?;
        token.parse::<T>().map_err(|_| {
            PlyError::invalid(format!(
                "'{token}' on data line {line_number} is not a valid {}",
                std::any::type_name::<T>()
            ))
        })
    }
}
