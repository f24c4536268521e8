use std::fmt;

use crate::{PlyError, ScalarType};

/// A single decoded number, tagged with the type it was declared as.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    F32(f32),
    F64(f64),
}

impl Scalar {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Scalar::I8(_) => ScalarType::I8,
            Scalar::U8(_) => ScalarType::U8,
            Scalar::I16(_) => ScalarType::I16,
            Scalar::U16(_) => ScalarType::U16,
            Scalar::I32(_) => ScalarType::I32,
            Scalar::U32(_) => ScalarType::U32,
            Scalar::F32(_) => ScalarType::F32,
            Scalar::F64(_) => ScalarType::F64,
        }
    }

    /// Widens to `f64`. Every PLY scalar type fits without loss.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::I8(v) => v.into(),
            Scalar::U8(v) => v.into(),
            Scalar::I16(v) => v.into(),
            Scalar::U16(v) => v.into(),
            Scalar::I32(v) => v.into(),
            Scalar::U32(v) => v.into(),
            Scalar::F32(v) => v.into(),
            Scalar::F64(v) => v,
        }
    }

    /// Interprets the value as a non-negative count or index.
    pub fn as_usize(&self) -> Result<usize, PlyError> {
        let out_of_range = || PlyError::invalid(format!("{self} is not a valid count or index"));
        match *self {
            Scalar::I8(v) => usize::try_from(v).map_err(|_| out_of_range()),
            Scalar::U8(v) => Ok(v.into()),
            Scalar::I16(v) => usize::try_from(v).map_err(|_| out_of_range()),
            Scalar::U16(v) => Ok(v.into()),
            Scalar::I32(v) => usize::try_from(v).map_err(|_| out_of_range()),
            Scalar::U32(v) => usize::try_from(v).map_err(|_| out_of_range()),
            Scalar::F32(_) | Scalar::F64(_) => Err(out_of_range()),
        }
    }
}

/// Formats the value as an ASCII PLY token. Floats always carry a decimal
/// point or exponent so `1.0` stays `1.0`.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::I8(v) => write!(f, "{v}"),
            Scalar::U8(v) => write!(f, "{v}"),
            Scalar::I16(v) => write!(f, "{v}"),
            Scalar::U16(v) => write!(f, "{v}"),
            Scalar::I32(v) => write!(f, "{v}"),
            Scalar::U32(v) => write!(f, "{v}"),
            Scalar::F32(v) => write!(f, "{v:?}"),
            Scalar::F64(v) => write!(f, "{v:?}"),
        }
    }
}

/// The value of one property within a record.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            PropertyValue::Scalar(s) => Some(*s),
            PropertyValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            PropertyValue::Scalar(_) => None,
            PropertyValue::List(items) => Some(items),
        }
    }
}
