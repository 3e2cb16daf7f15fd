use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
};

use crate::template::TemplateInfo;

/// Coarse classification of every error the codec can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The bytes do not form a valid GRIB2 message; skip to the next one.
    Structural,
    /// A template, bitmap or codec the message relies on is not handled.
    UnsupportedFeature,
    /// Memory could not be obtained.
    Resource,
    /// Reading or seeking the underlying stream failed.
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GribError {
    InternalDataError,
    ParseError(ParseError),
    DecodeError(DecodeError),
    EncodeError(EncodeError),
    InvalidValueError(String),
}

impl GribError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InternalDataError | Self::InvalidValueError(_) => ErrorCategory::Structural,
            Self::ParseError(e) => e.category(),
            Self::DecodeError(e) => e.category(),
            Self::EncodeError(e) => e.category(),
        }
    }
}

impl Error for GribError {}

impl From<ParseError> for GribError {
    fn from(e: ParseError) -> Self {
        Self::ParseError(e)
    }
}

impl From<DecodeError> for GribError {
    fn from(e: DecodeError) -> Self {
        Self::DecodeError(e)
    }
}

impl From<EncodeError> for GribError {
    fn from(e: EncodeError) -> Self {
        Self::EncodeError(e)
    }
}

impl Display for GribError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InternalDataError => write!(f, "Something unexpected happend"),
            Self::ParseError(e) => write!(f, "{e}"),
            Self::DecodeError(e) => write!(f, "{e}"),
            Self::EncodeError(e) => write!(f, "{e}"),
            Self::InvalidValueError(s) => write!(f, "invalid value ({s})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseError {
    ReadError(String),
    NotGRIB,
    GRIBVersionMismatch(u8),
    UnknownSectionNumber(u8),
    UnexpectedSectionNumber { expected: u8, actual: u8 },
    SectionSizeTooSmall(usize),
    EndSectionMismatch,
    UnexpectedEndOfData(usize),
    InvalidSectionOrder(usize),
    NoGridDefinition(usize),
    LengthMismatch { declared: u64, actual: u64 },
}

impl ParseError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ReadError(_) => ErrorCategory::Io,
            _ => ErrorCategory::Structural,
        }
    }
}

impl Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::ReadError(s) => write!(f, "Read error: {s}"),
            Self::NotGRIB => write!(f, "Not GRIB data"),
            Self::GRIBVersionMismatch(i) => write!(f, "Not GRIB version 2: {i}"),
            Self::UnknownSectionNumber(s) => write!(f, "Unknown section number: {s}"),
            Self::UnexpectedSectionNumber { expected, actual } => {
                write!(f, "Section {expected} expected but section {actual} found")
            }
            Self::SectionSizeTooSmall(i) => write!(f, "Section size is too small: {i}"),
            Self::EndSectionMismatch => write!(f, "Content of End Section is not valid"),
            Self::UnexpectedEndOfData(i) => write!(f, "Unexpected end of data at {i}"),
            Self::InvalidSectionOrder(i) => write!(f, "GRIB2 sections wrongly ordered at {i}"),
            Self::NoGridDefinition(i) => write!(f, "Grid Definition Section not found at {i}"),
            Self::LengthMismatch { declared, actual } => write!(
                f,
                "total length in Section 0 is {declared} but sections sum up to {actual}"
            ),
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        Self::ReadError(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodeError {
    UnrecognizedTemplate(TemplateInfo),
    NotSupported(&'static str, u16),
    PredefinedBitmapUnsupported(u8),
    NoPreviousBitmap,
    CodecDisabled(&'static str),
    AllocationFailed(usize),
    LengthMismatch,
    Unknown(String),
}

impl DecodeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AllocationFailed(_) => ErrorCategory::Resource,
            Self::NoPreviousBitmap | Self::LengthMismatch | Self::Unknown(_) => {
                ErrorCategory::Structural
            }
            _ => ErrorCategory::UnsupportedFeature,
        }
    }
}

impl Error for DecodeError {}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnrecognizedTemplate(t) => write!(f, "template {t} is not recognized"),
            Self::NotSupported(table, num) => write!(f, "{table}: {num} is not supported"),
            Self::PredefinedBitmapUnsupported(i) => {
                write!(f, "predefined bit-map (indicator {i}) is not supported")
            }
            Self::NoPreviousBitmap => write!(f, "no bit-map defined previously in the message"),
            Self::CodecDisabled(name) => write!(f, "{name} support is not enabled in this build"),
            Self::AllocationFailed(n) => write!(f, "failed to allocate {n} elements"),
            Self::LengthMismatch => write!(f, "lengths of decoded data mismatch"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

impl From<String> for DecodeError {
    fn from(value: String) -> Self {
        Self::Unknown(value)
    }
}

impl From<&str> for DecodeError {
    fn from(value: &str) -> Self {
        Self::Unknown(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncodeError {
    EditionMismatch(u8),
    MessageNotCreated,
    MessageFinalized,
    InvalidTransition { state: &'static str, section: u8 },
    SectionLengthMismatch { sum: u64, declared: u64 },
    LastSectionNotData(u8),
    UnrecognizedTemplate(TemplateInfo),
    TemplateLengthMismatch { expected: usize, actual: usize },
    ValueOutOfRange(String),
    BitmapLengthMismatch { expected: usize, actual: usize },
    NoPreviousBitmap,
    NotSupported(&'static str, u16),
    CodecDisabled(&'static str),
    Unknown(String),
}

impl EncodeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnrecognizedTemplate(_) | Self::NotSupported(..) | Self::CodecDisabled(_) => {
                ErrorCategory::UnsupportedFeature
            }
            _ => ErrorCategory::Structural,
        }
    }
}

impl Error for EncodeError {}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::EditionMismatch(i) => write!(f, "only GRIB edition 2 can be encoded: {i}"),
            Self::MessageNotCreated => write!(f, "message has not been created"),
            Self::MessageFinalized => write!(f, "message is already complete"),
            Self::InvalidTransition { state, section } => {
                write!(f, "section {section} cannot be added in state {state}")
            }
            Self::SectionLengthMismatch { sum, declared } => write!(
                f,
                "sections sum up to {sum} octets but Section 0 says {declared}"
            ),
            Self::LastSectionNotData(i) => {
                write!(f, "last section is {i}, not the Data Section")
            }
            Self::UnrecognizedTemplate(t) => write!(f, "template {t} is not recognized"),
            Self::TemplateLengthMismatch { expected, actual } => write!(
                f,
                "template needs {expected} values but {actual} were given"
            ),
            Self::ValueOutOfRange(s) => write!(f, "value out of range: {s}"),
            Self::BitmapLengthMismatch { expected, actual } => write!(
                f,
                "bit-map has {actual} entries while the grid has {expected} points"
            ),
            Self::NoPreviousBitmap => write!(f, "no bit-map defined previously in the message"),
            Self::NotSupported(table, num) => write!(f, "{table}: {num} is not supported"),
            Self::CodecDisabled(name) => write!(f, "{name} support is not enabled in this build"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for EncodeError {
    fn from(value: &str) -> Self {
        Self::Unknown(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_error_category {
        ($(($name:ident, $err:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                let err: GribError = $err.into();
                assert_eq!(err.category(), $expected);
            }
        )*);
    }

    test_error_category! {
        (category_of_not_grib, ParseError::NotGRIB, ErrorCategory::Structural),
        (
            category_of_read_error,
            ParseError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
            ErrorCategory::Io
        ),
        (
            category_of_unrecognized_template,
            DecodeError::UnrecognizedTemplate(TemplateInfo(3, 999)),
            ErrorCategory::UnsupportedFeature
        ),
        (
            category_of_predefined_bitmap,
            DecodeError::PredefinedBitmapUnsupported(1),
            ErrorCategory::UnsupportedFeature
        ),
        (category_of_allocation_failure, DecodeError::AllocationFailed(8), ErrorCategory::Resource),
        (category_of_edition_mismatch, EncodeError::EditionMismatch(1), ErrorCategory::Structural),
        (
            category_of_disabled_codec,
            EncodeError::CodecDisabled("PNG"),
            ErrorCategory::UnsupportedFeature
        ),
    }

    #[test]
    fn read_error_message() {
        let err = ParseError::from(io::Error::new(io::ErrorKind::Other, "broken pipe"));
        assert_eq!(err.to_string(), "Read error: broken pipe");
    }
}
