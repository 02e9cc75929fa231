use certsvc::{ContextType, PropId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode {kind}")]
    Decode {
        kind: ContextType,
        source: certsvc::Error,
    },

    #[error("failed to duplicate {kind} context")]
    Duplication {
        kind: ContextType,
        source: certsvc::Error,
    },

    #[error("failed to release {kind} context")]
    Release {
        kind: ContextType,
        source: certsvc::Error,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("no more items")]
    NoMoreItems,

    #[error("failed to format object")]
    Format(#[source] certsvc::Error),

    #[error("failed to serialize {kind} context")]
    Serialization {
        kind: ContextType,
        source: certsvc::Error,
    },

    #[error("binary/text conversion failed")]
    Conversion(#[source] certsvc::Error),

    #[error("property {id}")]
    Property { id: PropId, source: certsvc::Error },

    #[error("store operation failed")]
    Store(#[source] certsvc::Error),

    #[error("context wrapper is empty")]
    Empty,

    #[error("context wrapper already owns a handle")]
    Occupied,

    #[error(transparent)]
    Services(#[from] certsvc::Error),
}

impl Error {
    /// Native error code of the underlying services failure, if any.
    pub fn code(&self) -> Option<u32> {
        match self {
            Error::Decode { source, .. }
            | Error::Duplication { source, .. }
            | Error::Release { source, .. }
            | Error::Serialization { source, .. }
            | Error::Property { source, .. } => Some(source.code()),
            Error::Format(source)
            | Error::Conversion(source)
            | Error::Store(source)
            | Error::Services(source) => Some(source.code()),
            Error::NotFound(_) => Some(certsvc::error::CRYPT_E_NOT_FOUND),
            Error::NoMoreItems => Some(certsvc::error::ERROR_NO_MORE_ITEMS),
            Error::Empty | Error::Occupied => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Lookup misses and exhausted enumerations get their own variants; anything
/// else is wrapped by `wrap`.
pub(crate) fn classify(
    source: certsvc::Error,
    what: &'static str,
    wrap: impl FnOnce(certsvc::Error) -> Error,
) -> Error {
    match source {
        certsvc::Error::NotFound => Error::NotFound(what),
        certsvc::Error::NoMoreItems => Error::NoMoreItems,
        other => wrap(other),
    }
}
