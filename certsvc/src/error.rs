use thiserror::Error;

pub const ERROR_INVALID_HANDLE: u32 = 6;
pub const ERROR_INVALID_DATA: u32 = 13;
pub const ERROR_MORE_DATA: u32 = 234;
pub const ERROR_NO_MORE_ITEMS: u32 = 259;
pub const E_ACCESSDENIED: u32 = 0x8007_0005;
pub const E_INVALIDARG: u32 = 0x8007_0057;
pub const NTE_BAD_ALGID: u32 = 0x8009_0008;
pub const CRYPT_E_NOT_FOUND: u32 = 0x8009_2004;
pub const CRYPT_E_EXISTS: u32 = 0x8009_2005;
pub const CRYPT_E_ASN1_BADTAG: u32 = 0x8009_310b;

/// Failures reported by a certificate services implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid context handle {0:#x}")]
    InvalidHandle(u64),

    #[error("object not found")]
    NotFound,

    #[error("no more items")]
    NoMoreItems,

    /// The output buffer is shorter than `required` elements.
    #[error("more data is available: {required} elements required")]
    MoreData { required: usize },

    #[error("object already exists in the store")]
    Exists,

    #[error("property {0} is read-only")]
    ReadOnlyProperty(u32),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("DER: {0}")]
    Der(#[from] der::Error),

    #[error("text conversion: {0}")]
    Pem(#[from] pem::error::Error),
}

impl Error {
    /// The Win32 / HRESULT value the platform library reports for this error.
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidParameter(_) => E_INVALIDARG,
            Error::InvalidData(_) | Error::Pem(_) => ERROR_INVALID_DATA,
            Error::InvalidHandle(_) => ERROR_INVALID_HANDLE,
            Error::NotFound => CRYPT_E_NOT_FOUND,
            Error::NoMoreItems => ERROR_NO_MORE_ITEMS,
            Error::MoreData { .. } => ERROR_MORE_DATA,
            Error::Exists => CRYPT_E_EXISTS,
            Error::ReadOnlyProperty(_) => E_ACCESSDENIED,
            Error::UnsupportedAlgorithm(_) => NTE_BAD_ALGID,
            Error::Der(_) => CRYPT_E_ASN1_BADTAG,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
