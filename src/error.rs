use core::fmt;
use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlyError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed PLY header: {0}")]
    MalformedHeader(String),

    #[error("Truncated PLY data: {0}")]
    TruncatedData(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Serde error: {0}")]
    Serde(String),

    #[error("Invalid import options: {0}")]
    Config(#[from] serde_json::Error),
}

impl PlyError {
    pub(crate) fn header(msg: impl Into<String>) -> Self {
        PlyError::MalformedHeader(msg.into())
    }

    pub(crate) fn truncated(msg: impl Into<String>) -> Self {
        PlyError::TruncatedData(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PlyError::InvalidValue(msg.into())
    }

    /// Turns an unexpected end of stream into [`PlyError::TruncatedData`],
    /// every other IO failure stays an IO error.
    pub(crate) fn from_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            PlyError::TruncatedData("stream ended inside a record".to_string())
        } else {
            PlyError::Io(err)
        }
    }
}

impl serde::de::Error for PlyError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        PlyError::Serde(msg.to_string())
    }
}

impl serde::ser::Error for PlyError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        PlyError::Serde(msg.to_string())
    }
}
