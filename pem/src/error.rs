use base64::DecodeError;
use thiserror::Error;

use crate::format::Encoding;

/// Errors that can occur when converting between binary and text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing the opening boundary marker (e.g., `-----BEGIN X509 CRL-----`)
    #[error("missing a pre encapsulation boundary")]
    MissingPreEncapsulationBoundary,

    /// Missing the closing boundary marker (e.g., `-----END X509 CRL-----`)
    #[error("missing a post encapsulation boundary")]
    MissingPostEncapsulationBoundary,

    /// The label in the boundary marker is not the one the format expects
    #[error("invalid label: {0}")]
    InvalidLabel(String),

    /// The BEGIN and END labels do not match
    #[error("label doesn't match")]
    LabelMissMatch,

    /// Failed to decode base64 data
    #[error("base64 decode: {0}")]
    Base64Decode(DecodeError),

    /// A character other than a line break inside strictly decoded text
    #[error("unexpected character {0:?} in strict mode")]
    UnexpectedCharacter(char),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("hex line address {found:#x} does not match offset {expected:#x}")]
    InvalidAddress { expected: usize, found: usize },

    #[error("{0:?} can only be used for decoding")]
    DecodeOnly(Encoding),

    #[error("flags {flags:#x} are not supported with {encoding:?}")]
    UnsupportedFlags { encoding: Encoding, flags: u32 },

    #[error("unknown string format {0:#x}")]
    UnknownFormat(u32),

    /// Binary output requested for bytes that are not valid UTF-8
    #[error("binary data is not representable as text")]
    BinaryNotText,

    #[error("input does not match any of the formats accepted by {0:?}")]
    NoMatchingFormat(Encoding),
}
