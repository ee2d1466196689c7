// src/utils/error.rs

use std::fmt;
use thiserror::Error;

/// Symbolic error codes surfaced alongside every error message.
///
/// Callers that drive the engine from a command layer report these next to
/// the human-readable message so scripts can branch on the failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BadFrom,
    BadOption,
    BadValue,
    Coordinates,
    MissingValue,
    NotFileFormat,
    NotDataFormat,
    PhotoFormat,
    Malloc,
    UnrecognizedData,
    Io,
    Codec,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadFrom => "BAD_FROM",
            ErrorCode::BadOption => "BAD_OPTION",
            ErrorCode::BadValue => "BAD_VALUE",
            ErrorCode::Coordinates => "COORDINATES",
            ErrorCode::MissingValue => "MISSING_VALUE",
            ErrorCode::NotFileFormat => "NOT_FILE_FORMAT",
            ErrorCode::NotDataFormat => "NOT_DATA_FORMAT",
            ErrorCode::PhotoFormat => "PHOTO_FORMAT",
            ErrorCode::Malloc => "MALLOC",
            ErrorCode::UnrecognizedData => "UNRECOGNIZED_DATA",
            ErrorCode::Io => "IO",
            ErrorCode::Codec => "CODEC",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The primary error type for all operations of the photo engine.
#[derive(Error, Debug)]
pub enum PhotoError {
    /// The `-from` rectangle does not fit inside the source image.
    #[error("coordinates for -from option extend outside source image")]
    BadFrom,

    /// An option flag that is unknown or not allowed for this operation.
    #[error("unrecognized option \"{0}\"")]
    BadOption(String),

    /// An option value that could not be parsed or is out of range.
    #[error("{0}")]
    BadValue(String),

    /// A pixel coordinate outside the image.
    #[error("{0} coordinates out of range")]
    Coordinates(&'static str),

    /// An option given without its value.
    #[error("the \"{0}\" option requires a value")]
    MissingValue(String),

    /// The named format exists but cannot read or write files.
    #[error("-file option isn't supported for {0} images")]
    NotFileFormat(String),

    /// The named format exists but cannot read or write string data.
    #[error("-data option isn't supported for {0} images")]
    NotDataFormat(String),

    /// No registered format matches the requested name.
    #[error("image format \"{0}\" is not supported")]
    PhotoFormat(String),

    /// A buffer could not be allocated, or its size overflows.
    #[error("not enough free memory for image buffer")]
    Malloc,

    /// No registered format recognised the content.
    #[error("couldn't recognize {0}")]
    UnrecognizedData(String),

    /// I/O failure while reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by a format handler; passed through untouched.
    #[error("{format} codec error: {source}")]
    Codec {
        format: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PhotoError {
    /// Returns the symbolic code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PhotoError::BadFrom => ErrorCode::BadFrom,
            PhotoError::BadOption(_) => ErrorCode::BadOption,
            PhotoError::BadValue(_) => ErrorCode::BadValue,
            PhotoError::Coordinates(_) => ErrorCode::Coordinates,
            PhotoError::MissingValue(_) => ErrorCode::MissingValue,
            PhotoError::NotFileFormat(_) => ErrorCode::NotFileFormat,
            PhotoError::NotDataFormat(_) => ErrorCode::NotDataFormat,
            PhotoError::PhotoFormat(_) => ErrorCode::PhotoFormat,
            PhotoError::Malloc => ErrorCode::Malloc,
            PhotoError::UnrecognizedData(_) => ErrorCode::UnrecognizedData,
            PhotoError::Io(_) => ErrorCode::Io,
            PhotoError::Codec { .. } => ErrorCode::Codec,
        }
    }

    /// Wraps a format-handler specific error.
    pub fn codec<E>(format: &str, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        PhotoError::Codec {
            format: format.to_string(),
            source: error.into(),
        }
    }

    pub(crate) fn bad_value(msg: impl Into<String>) -> Self {
        PhotoError::BadValue(msg.into())
    }
}

impl From<std::collections::TryReserveError> for PhotoError {
    fn from(_: std::collections::TryReserveError) -> Self {
        PhotoError::Malloc
    }
}

/// A specialized `Result` type for photo operations.
pub type Result<T> = std::result::Result<T, PhotoError>;
