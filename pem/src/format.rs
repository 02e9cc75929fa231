//! Text format selectors.
//!
//! Values are bit-compatible with the `CRYPT_STRING_*` constants so a format
//! can travel through a `u32` flags argument unchanged.

use crate::Label;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Base64 with `CERTIFICATE` armor
    Base64Header,
    Base64,
    /// Bytes copied verbatim
    Binary,
    /// Base64 with `NEW CERTIFICATE REQUEST` armor
    Base64RequestHeader,
    Hex,
    HexAscii,
    /// Decode only: armored or bare base64
    Base64Any,
    /// Decode only: armored base64, bare base64 or binary
    Any,
    /// Decode only: any of the hex layouts
    HexAny,
    /// Base64 with `X509 CRL` armor
    Base64X509CrlHeader,
    HexAddr,
    HexAsciiAddr,
    HexRaw,
    /// URL-safe base64 without padding
    Base64Uri,
}

impl Encoding {
    pub fn value(self) -> u32 {
        match self {
            Encoding::Base64Header => 0x0,
            Encoding::Base64 => 0x1,
            Encoding::Binary => 0x2,
            Encoding::Base64RequestHeader => 0x3,
            Encoding::Hex => 0x4,
            Encoding::HexAscii => 0x5,
            Encoding::Base64Any => 0x6,
            Encoding::Any => 0x7,
            Encoding::HexAny => 0x8,
            Encoding::Base64X509CrlHeader => 0x9,
            Encoding::HexAddr => 0xa,
            Encoding::HexAsciiAddr => 0xb,
            Encoding::HexRaw => 0xc,
            Encoding::Base64Uri => 0xd,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        let encoding = match value {
            0x0 => Encoding::Base64Header,
            0x1 => Encoding::Base64,
            0x2 => Encoding::Binary,
            0x3 => Encoding::Base64RequestHeader,
            0x4 => Encoding::Hex,
            0x5 => Encoding::HexAscii,
            0x6 => Encoding::Base64Any,
            0x7 => Encoding::Any,
            0x8 => Encoding::HexAny,
            0x9 => Encoding::Base64X509CrlHeader,
            0xa => Encoding::HexAddr,
            0xb => Encoding::HexAsciiAddr,
            0xc => Encoding::HexRaw,
            0xd => Encoding::Base64Uri,
            _ => return None,
        };
        Some(encoding)
    }

    pub fn is_decode_only(self) -> bool {
        matches!(self, Encoding::Base64Any | Encoding::Any | Encoding::HexAny)
    }

    /// The armor label written when encoding, if this is a header format.
    pub fn header_label(self) -> Option<Label> {
        match self {
            Encoding::Base64Header => Some(Label::Certificate),
            Encoding::Base64RequestHeader => Some(Label::NewCertificateRequest),
            Encoding::Base64X509CrlHeader => Some(Label::X509Crl),
            _ => None,
        }
    }

    /// Concrete encodings tried, in order, when decoding with this format.
    pub(crate) fn candidates(self) -> &'static [Encoding] {
        match self {
            Encoding::Any => &[Encoding::Base64Header, Encoding::Base64, Encoding::Binary],
            Encoding::Base64Any => &[Encoding::Base64Header, Encoding::Base64],
            Encoding::HexAny => &[
                Encoding::HexAddr,
                Encoding::HexAsciiAddr,
                Encoding::Hex,
                Encoding::HexRaw,
                Encoding::HexAscii,
            ],
            Encoding::Base64Header => &[Encoding::Base64Header],
            Encoding::Base64 => &[Encoding::Base64],
            Encoding::Binary => &[Encoding::Binary],
            Encoding::Base64RequestHeader => &[Encoding::Base64RequestHeader],
            Encoding::Hex => &[Encoding::Hex],
            Encoding::HexAscii => &[Encoding::HexAscii],
            Encoding::Base64X509CrlHeader => &[Encoding::Base64X509CrlHeader],
            Encoding::HexAddr => &[Encoding::HexAddr],
            Encoding::HexAsciiAddr => &[Encoding::HexAsciiAddr],
            Encoding::HexRaw => &[Encoding::HexRaw],
            Encoding::Base64Uri => &[Encoding::Base64Uri],
        }
    }
}

/// An [`Encoding`] plus modifier flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringFormat {
    encoding: Encoding,
    flags: u32,
}

impl StringFormat {
    /// Only line breaks may appear between encoded characters.
    pub const STRICT: u32 = 0x2000_0000;
    /// No line breaks at all.
    pub const NOCRLF: u32 = 0x4000_0000;
    /// Line feed only instead of CR LF.
    pub const NOCR: u32 = 0x8000_0000;

    const MODIFIERS: u32 = Self::STRICT | Self::NOCRLF | Self::NOCR;

    pub const fn new(encoding: Encoding) -> Self {
        StringFormat { encoding, flags: 0 }
    }

    pub const fn with_flags(self, flags: u32) -> Self {
        StringFormat {
            encoding: self.encoding,
            flags: self.flags | (flags & Self::MODIFIERS),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn is_strict(&self) -> bool {
        self.flags & Self::STRICT != 0
    }

    pub fn no_crlf(&self) -> bool {
        self.flags & Self::NOCRLF != 0
    }

    pub fn bits(&self) -> u32 {
        self.encoding.value() | self.flags
    }

    pub fn from_bits(bits: u32) -> Result<Self, Error> {
        let encoding =
            Encoding::from_value(bits & !Self::MODIFIERS).ok_or(Error::UnknownFormat(bits))?;
        Ok(StringFormat::new(encoding).with_flags(bits))
    }

    pub(crate) fn line_ending(&self) -> &'static str {
        if self.no_crlf() {
            ""
        } else if self.flags & Self::NOCR != 0 {
            "\n"
        } else {
            "\r\n"
        }
    }
}

impl From<Encoding> for StringFormat {
    fn from(encoding: Encoding) -> Self {
        StringFormat::new(encoding)
    }
}
