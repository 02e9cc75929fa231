use std::fmt::{self, Display, Formatter};
use std::num::NonZeroU64;
use std::ops::BitOr;

use der::ObjectIdentifier;

/// Opaque reference to one context held by a services implementation.
///
/// The value carries no ownership by itself; whoever holds it is
/// responsible for handing it back through `free_context` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawContext(NonZeroU64);

impl RawContext {
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(RawContext)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl Display for RawContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextType {
    Crl,
    Ctl,
}

impl ContextType {
    /// Property id under which a serialized store element carries the
    /// encoded context.
    pub fn element_id(self) -> u32 {
        match self {
            ContextType::Crl => PropId::CRL_ELEMENT.0,
            ContextType::Ctl => PropId::CTL_ELEMENT.0,
        }
    }

    pub fn from_element_id(id: u32) -> Option<Self> {
        match PropId(id) {
            PropId::CRL_ELEMENT => Some(ContextType::Crl),
            PropId::CTL_ELEMENT => Some(ContextType::Ctl),
            _ => None,
        }
    }

    /// The encoding a context of this type must be decoded with.
    pub fn required_encoding(self) -> EncodingType {
        match self {
            ContextType::Crl => EncodingType::X509_ASN,
            ContextType::Ctl => EncodingType::PKCS_7_ASN,
        }
    }
}

impl Display for ContextType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ContextType::Crl => write!(f, "CRL"),
            ContextType::Ctl => write!(f, "CTL"),
        }
    }
}

/// Message and certificate encoding bits (`X509_ASN_ENCODING`,
/// `PKCS_7_ASN_ENCODING`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingType(u32);

impl EncodingType {
    pub const X509_ASN: EncodingType = EncodingType(0x0000_0001);
    pub const PKCS_7_ASN: EncodingType = EncodingType(0x0001_0000);

    pub const fn from_bits(bits: u32) -> Self {
        EncodingType(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: EncodingType) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EncodingType {
    type Output = EncodingType;

    fn bitor(self, rhs: Self) -> Self::Output {
        EncodingType(self.0 | rhs.0)
    }
}

/// Context property identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropId(pub u32);

impl PropId {
    /// Starts a property enumeration.
    pub const NONE: PropId = PropId(0);
    pub const SHA1_HASH: PropId = PropId(3);
    pub const MD5_HASH: PropId = PropId(4);
    pub const FRIENDLY_NAME: PropId = PropId(11);
    pub const ACCESS_STATE: PropId = PropId(14);
    pub const ARCHIVED: PropId = PropId(19);
    pub const SHA256_HASH: PropId = PropId(107);

    pub(crate) const CERT_ELEMENT: PropId = PropId(32);
    pub(crate) const CRL_ELEMENT: PropId = PropId(33);
    pub(crate) const CTL_ELEMENT: PropId = PropId(34);

    /// Ids reserved for store element framing; they cannot be set.
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            PropId::CERT_ELEMENT | PropId::CRL_ELEMENT | PropId::CTL_ELEMENT
        )
    }
}

impl Display for PropId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to do when an added context matches one already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddDisposition {
    /// Fail with `Exists`.
    New,
    /// Return the stored context instead.
    UseExisting,
    /// Remove the stored context and add the new one.
    ReplaceExisting,
    /// Add without looking for a match.
    Always,
}

/// Position in a sorted trust list enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortedCursor(pub(crate) usize);

impl SortedCursor {
    pub const START: SortedCursor = SortedCursor(0);
}

/// Flags for `format_object`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FormatFlags(u32);

impl FormatFlags {
    pub const NONE: FormatFlags = FormatFlags(0);
    /// One item per line.
    pub const MULTI_LINE: FormatFlags = FormatFlags(0x0001);
    /// Omit the hex value that follows decoded bit names.
    pub const NO_HEX: FormatFlags = FormatFlags(0x0010);

    pub const fn from_bits(bits: u32) -> Self {
        FormatFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: FormatFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FormatFlags {
    type Output = FormatFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        FormatFlags(self.0 | rhs.0)
    }
}

/// A subject to look up in a trust list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject<'a> {
    /// An encoded certificate; its identifier is the hash of the encoding
    /// under the list's subject algorithm.
    Certificate(&'a [u8]),
    /// A precomputed identifier produced by `algorithm`.
    Identifier {
        algorithm: &'a ObjectIdentifier,
        identifier: &'a [u8],
    },
}

/// Result of `string_to_binary` besides the decoded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringToBinary {
    /// Characters skipped before the encoded payload.
    pub skipped: usize,
    /// The concrete format that matched.
    pub format: pem::Encoding,
}
