use thiserror::Error;

use crate::Tag;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("parser error {0:?}")]
    Parser(nom::error::ErrorKind),
    #[error("parser incomplete: {0:?}")]
    ParserIncomplete(nom::Needed),
    #[error("{0} bytes of trailing data after DER element")]
    TrailingData(usize),
    #[error("empty input")]
    Empty,
    #[error("unexpected tag: expected {expected}, got {actual}")]
    UnexpectedTag { expected: Tag, actual: Tag },
    #[error("missing element: {0}")]
    MissingElement(&'static str),
    #[error("BOOLEAN: invalid encoding")]
    InvalidBoolean,
    #[error("INTEGER: no data")]
    IntegerNoData,
    #[error("INTEGER: value out of range")]
    IntegerOutOfRange,
    #[error("OBJECT IDENTIFIER: {0}")]
    InvalidObjectIdentifier(String),
    #[error("BIT STRING: unused bits {0} out of range")]
    InvalidBitString(u8),
    #[error("invalid time: {0}")]
    InvalidTime(String),
    #[error("invalid string: {0}")]
    InvalidString(String),
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(e: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        match e {
            nom::Err::Incomplete(needed) => Error::ParserIncomplete(needed),
            nom::Err::Error(e) | nom::Err::Failure(e) => Error::Parser(e.code),
        }
    }
}
