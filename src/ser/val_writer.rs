use std::io::Write;
use std::marker::PhantomData;

use byteorder::ByteOrder;
use byteorder::WriteBytesExt;

use crate::{PlyError, Scalar};

pub struct BinValWriter<W: Write, E: ByteOrder> {
    writer: W,
    _endian: PhantomData<E>,
}

impl<W: Write, E: ByteOrder> BinValWriter<W, E> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer,
            _endian: PhantomData,
        }
    }

    pub(crate) fn into_inner(self) -> W {
        self.writer
    }
}

pub struct AsciiValWriter<W: Write> {
    writer: W,
    row_started: bool,
}

impl<W: Write> AsciiValWriter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer,
            row_started: false,
        }
    }

    pub(crate) fn into_inner(self) -> W {
        self.writer
    }

    fn write_token(&mut self, val: Scalar) -> Result<(), PlyError> {
        if self.row_started {
            write!(self.writer, " {val}")?;
        } else {
            write!(self.writer, "{val}")?;
            self.row_started = true;
        }
        Ok(())
    }
}

pub trait ScalarWriter {
    fn write_i8(&mut self, val: i8) -> Result<(), PlyError>;
    fn write_u8(&mut self, val: u8) -> Result<(), PlyError>;
    fn write_i16(&mut self, val: i16) -> Result<(), PlyError>;
    fn write_u16(&mut self, val: u16) -> Result<(), PlyError>;
    fn write_i32(&mut self, val: i32) -> Result<(), PlyError>;
    fn write_u32(&mut self, val: u32) -> Result<(), PlyError>;
    fn write_f32(&mut self, val: f32) -> Result<(), PlyError>;
    fn write_f64(&mut self, val: f64) -> Result<(), PlyError>;

    fn write_row_end(&mut self) -> Result<(), PlyError>;

    fn write_scalar(&mut self, val: Scalar) -> Result<(), PlyError> {
        match val {
            Scalar::I8(v) => self.write_i8(v),
            Scalar::U8(v) => self.write_u8(v),
            Scalar::I16(v) => self.write_i16(v),
            Scalar::U16(v) => self.write_u16(v),
            Scalar::I32(v) => self.write_i32(v),
            Scalar::U32(v) => self.write_u32(v),
            Scalar::F32(v) => self.write_f32(v),
            Scalar::F64(v) => self.write_f64(v),
        }
    }
}

impl<W: Write, E: ByteOrder> ScalarWriter for BinValWriter<W, E> {
    fn write_i8(&mut self, val: i8) -> Result<(), PlyError> {
        Ok(self.writer.write_i8(val)?)
    }

    fn write_u8(&mut self, val: u8) -> Result<(), PlyError> {
        Ok(self.writer.write_u8(val)?)
    }

    fn write_i16(&mut self, val: i16) -> Result<(), PlyError> {
        Ok(self.writer.write_i16::<E>(val)?)
    }

    fn write_u16(&mut self, val: u16) -> Result<(), PlyError> {
        Ok(self.writer.write_u16::<E>(val)?)
    }

    fn write_i32(&mut self, val: i32) -> Result<(), PlyError> {
        Ok(self.writer.write_i32::<E>(val)?)
    }

    fn write_u32(&mut self, val: u32) -> Result<(), PlyError> {
        Ok(self.writer.write_u32::<E>(val)?)
    }

    fn write_f32(&mut self, val: f32) -> Result<(), PlyError> {
        Ok(self.writer.write_f32::<E>(val)?)
    }

    fn write_f64(&mut self, val: f64) -> Result<(), PlyError> {
        Ok(self.writer.write_f64::<E>(val)?)
    }

    fn write_row_end(&mut self) -> Result<(), PlyError> {
        Ok(())
    }
}

impl<W: Write> ScalarWriter for AsciiValWriter<W> {
    fn write_i8(&mut self, val: i8) -> Result<(), PlyError> {
        self.write_token(Scalar::I8(val))
    }

    fn write_u8(&mut self, val: u8) -> Result<(), PlyError> {
        self.write_token(Scalar::U8(val))
    }

    fn write_i16(&mut self, val: i16) -> Result<(), PlyError> {
        self.write_token(Scalar::I16(val))
    }

    fn write_u16(&mut self, val: u16) -> Result<(), PlyError> {
        self.write_token(Scalar::U16(val))
    }

    fn write_i32(&mut self, val: i32) -> Result<(), PlyError> {
        self.write_token(Scalar::I32(val))
    }

    fn write_u32(&mut self, val: u32) -> Result<(), PlyError> {
        self.write_token(Scalar::U32(val))
    }

    fn write_f32(&mut self, val: f32) -> Result<(), PlyError> {
        self.write_token(Scalar::F32(val))
    }

    fn write_f64(&mut self, val: f64) -> Result<(), PlyError> {
        self.write_token(Scalar::F64(val))
    }

    fn write_row_end(&mut self) -> Result<(), PlyError> {
        writeln!(self.writer)?;
        self.row_started = false;
        Ok(())
    }
}
