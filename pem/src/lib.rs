//! Binary <-> text encodings for certificate material.
//!
//! [`encode`] and [`decode`] implement every [`Encoding`]: RFC 7468 armor
//! (`-----BEGIN X509 CRL-----`), bare and URL-safe base64, verbatim binary
//! and four hex dump layouts. Decode-only encodings (`Any`, `Base64Any`,
//! `HexAny`) try their candidates in a fixed order and report which one
//! matched.

pub mod error;
pub mod format;
mod hex;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use codec::decoder::{DecodableFrom, Decoder};
use error::Error;
use regex::Regex;

pub use format::{Encoding, StringFormat};

const CERTIFICATE_LABEL: &str = "CERTIFICATE";
const NEW_CERTIFICATE_REQUEST_LABEL: &str = "NEW CERTIFICATE REQUEST";
const CERTIFICATE_REQUEST_LABEL: &str = "CERTIFICATE REQUEST";
const X509_CRL_LABEL: &str = "X509 CRL";
const PKCS7_LABEL: &str = "PKCS7";

const BASE64_LINE_LENGTH: usize = 64;

const BEGIN_BOUNDARY: &str = r"-----BEGIN ([A-Z0-9 ]+)-----";
const END_BOUNDARY: &str = r"-----END ([A-Z0-9 ]+)-----";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// X.509 Certificate
    Certificate,
    /// PKCS#10 request, legacy label
    NewCertificateRequest,
    /// PKCS#10 request
    CertificateRequest,
    /// X.509 revocation list
    X509Crl,
    /// PKCS#7 / CMS message, the container of a trust list
    Pkcs7,
    Other(String),
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Certificate => write!(f, "{}", CERTIFICATE_LABEL),
            Label::NewCertificateRequest => write!(f, "{}", NEW_CERTIFICATE_REQUEST_LABEL),
            Label::CertificateRequest => write!(f, "{}", CERTIFICATE_REQUEST_LABEL),
            Label::X509Crl => write!(f, "{}", X509_CRL_LABEL),
            Label::Pkcs7 => write!(f, "{}", PKCS7_LABEL),
            Label::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        match s {
            CERTIFICATE_LABEL => Label::Certificate,
            NEW_CERTIFICATE_REQUEST_LABEL => Label::NewCertificateRequest,
            CERTIFICATE_REQUEST_LABEL => Label::CertificateRequest,
            X509_CRL_LABEL => Label::X509Crl,
            PKCS7_LABEL => Label::Pkcs7,
            other => Label::Other(other.to_string()),
        }
    }
}

/*
ref: https://www.rfc-editor.org/rfc/rfc7468.html#section-3
*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pem {
    label: Label,
    contents: Vec<u8>,
    // characters of explanatory text before the pre-encapsulation boundary
    offset: usize,
}

impl Pem {
    pub fn new(label: Label, contents: Vec<u8>) -> Self {
        Pem {
            label,
            contents,
            offset: 0,
        }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    /// Number of characters preceding `-----BEGIN` in the parsed text.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Writes the armored form using `eol` as line terminator.
    pub fn to_string_with(&self, eol: &str) -> String {
        let mut out = format!("-----BEGIN {}-----{}", self.label, eol);
        out.push_str(&wrap_base64(&STANDARD.encode(&self.contents), eol));
        out.push_str(&format!("-----END {}-----{}", self.label, eol));
        out
    }
}

impl Display for Pem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_with("\n"))
    }
}

impl FromStr for Pem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_block(s, false).map(|(pem, _)| pem)
    }
}

impl DecodableFrom<Pem> for Vec<u8> {}

impl Decoder<Pem, Vec<u8>> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Vec<u8>, Self::Error> {
        // This discards label information from Pem format.
        Ok(self.contents.clone())
    }
}

impl DecodableFrom<&str> for Pem {}

impl Decoder<&str, Pem> for &str {
    type Error = Error;

    fn decode(&self) -> Result<Pem, Self::Error> {
        Pem::from_str(self)
    }
}

/// Parses the first armored block in `s`; returns it with the byte index
/// just past its post-encapsulation boundary.
fn parse_block(s: &str, strict: bool) -> Result<(Pem, usize), Error> {
    let begin_re =
        Regex::new(BEGIN_BOUNDARY).map_err(|_| Error::MissingPreEncapsulationBoundary)?;
    let end_re =
        Regex::new(END_BOUNDARY).map_err(|_| Error::MissingPostEncapsulationBoundary)?;
    let begin = begin_re
        .captures(s)
        .ok_or(Error::MissingPreEncapsulationBoundary)?;
    let whole = begin.get(0).ok_or(Error::MissingPreEncapsulationBoundary)?;
    let label = begin
        .get(1)
        .map(|m| m.as_str())
        .ok_or(Error::MissingPreEncapsulationBoundary)?;

    let body_start = whole.end();
    let end = end_re
        .captures(&s[body_start..])
        .ok_or(Error::MissingPostEncapsulationBoundary)?;
    let end_whole = end.get(0).ok_or(Error::MissingPostEncapsulationBoundary)?;
    let end_label = end
        .get(1)
        .map(|m| m.as_str())
        .ok_or(Error::MissingPostEncapsulationBoundary)?;
    if end_label != label {
        return Err(Error::LabelMissMatch);
    }

    let body = &s[body_start..body_start + end_whole.start()];
    let contents = decode_base64_body(body, strict)?;
    Ok((
        Pem {
            label: Label::from(label),
            contents,
            offset: s[..whole.start()].chars().count(),
        },
        body_start + end_whole.end(),
    ))
}

/// Parse multiple PEM blocks from a string.
///
/// Text between blocks is ignored. At least one block must be present.
///
/// # Example
/// ```
/// use pem::parse_many;
///
/// let pem_data = "-----BEGIN X509 CRL-----\nMAA=\n-----END X509 CRL-----\n-----BEGIN X509 CRL-----\nMAA=\n-----END X509 CRL-----";
/// let pems = parse_many(pem_data).unwrap();
/// assert_eq!(pems.len(), 2);
/// ```
pub fn parse_many(s: &str) -> Result<Vec<Pem>, Error> {
    let begin_re =
        Regex::new(BEGIN_BOUNDARY).map_err(|_| Error::MissingPreEncapsulationBoundary)?;
    let mut pems = Vec::new();
    let mut rest = s;
    while begin_re.is_match(rest) {
        let (pem, consumed) = parse_block(rest, false)?;
        pems.push(pem);
        rest = &rest[consumed..];
    }
    if pems.is_empty() {
        return Err(Error::MissingPreEncapsulationBoundary);
    }
    Ok(pems)
}

/// Result of [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub bytes: Vec<u8>,
    /// Characters skipped before the encoded payload started.
    pub skipped: usize,
    /// The concrete encoding that matched.
    pub encoding: Encoding,
}

/// Encodes `data` as text in `format`.
pub fn encode(data: &[u8], format: StringFormat) -> Result<String, Error> {
    let encoding = format.encoding();
    let eol = format.line_ending();
    let reject_no_crlf = || {
        if format.no_crlf() {
            Err(Error::UnsupportedFlags {
                encoding,
                flags: format.flags(),
            })
        } else {
            Ok(())
        }
    };

    match encoding {
        Encoding::Base64Any | Encoding::Any | Encoding::HexAny => Err(Error::DecodeOnly(encoding)),
        Encoding::Base64Header | Encoding::Base64RequestHeader | Encoding::Base64X509CrlHeader => {
            reject_no_crlf()?;
            let label = encoding.header_label().ok_or(Error::DecodeOnly(encoding))?;
            Ok(Pem::new(label, data.to_vec()).to_string_with(eol))
        }
        Encoding::Base64 => Ok(wrap_base64(&STANDARD.encode(data), eol)),
        Encoding::Base64Uri => Ok(URL_SAFE_NO_PAD.encode(data)),
        Encoding::Binary => String::from_utf8(data.to_vec()).map_err(|_| Error::BinaryNotText),
        Encoding::HexRaw => Ok(hex::encode_raw(data, eol)),
        Encoding::Hex | Encoding::HexAscii | Encoding::HexAddr | Encoding::HexAsciiAddr => {
            reject_no_crlf()?;
            Ok(hex::encode_lines(data, layout_of(encoding), eol))
        }
    }
}

/// Decodes `text` according to `format`.
pub fn decode(text: &str, format: StringFormat) -> Result<Decoded, Error> {
    let candidates = format.encoding().candidates();
    let mut last_error = None;
    for &encoding in candidates {
        match decode_as(text, encoding, format.is_strict()) {
            Ok((bytes, skipped)) => {
                return Ok(Decoded {
                    bytes,
                    skipped,
                    encoding,
                });
            }
            Err(e) => last_error = Some(e),
        }
    }
    match last_error {
        Some(e) if candidates.len() == 1 => Err(e),
        _ => Err(Error::NoMatchingFormat(format.encoding())),
    }
}

fn decode_as(text: &str, encoding: Encoding, strict: bool) -> Result<(Vec<u8>, usize), Error> {
    match encoding {
        Encoding::Base64Header => decode_armored(text, strict, |_| true),
        Encoding::Base64RequestHeader => decode_armored(text, strict, |label| {
            matches!(
                label,
                Label::NewCertificateRequest | Label::CertificateRequest
            )
        }),
        Encoding::Base64X509CrlHeader => {
            decode_armored(text, strict, |label| *label == Label::X509Crl)
        }
        Encoding::Base64 => Ok((decode_base64_body(text, strict)?, 0)),
        Encoding::Base64Uri => {
            let compact = strip_line_breaks(text, strict)?;
            let bytes = URL_SAFE_NO_PAD
                .decode(compact.trim_end_matches('='))
                .map_err(Error::Base64Decode)?;
            Ok((bytes, 0))
        }
        Encoding::Binary => Ok((text.as_bytes().to_vec(), 0)),
        Encoding::HexRaw => Ok((hex::decode_raw(text, strict)?, 0)),
        Encoding::Hex | Encoding::HexAscii | Encoding::HexAddr | Encoding::HexAsciiAddr => {
            Ok((hex::decode_lines(text, layout_of(encoding))?, 0))
        }
        Encoding::Base64Any | Encoding::Any | Encoding::HexAny => Err(Error::DecodeOnly(encoding)),
    }
}

fn decode_armored(
    text: &str,
    strict: bool,
    accept: impl Fn(&Label) -> bool,
) -> Result<(Vec<u8>, usize), Error> {
    let (pem, _) = parse_block(text, strict)?;
    if !accept(pem.label()) {
        return Err(Error::InvalidLabel(pem.label().to_string()));
    }
    let skipped = pem.offset();
    Ok((pem.into_contents(), skipped))
}

fn layout_of(encoding: Encoding) -> hex::Layout {
    hex::Layout {
        address: matches!(encoding, Encoding::HexAddr | Encoding::HexAsciiAddr),
        ascii: matches!(encoding, Encoding::HexAscii | Encoding::HexAsciiAddr),
    }
}

fn wrap_base64(encoded: &str, eol: &str) -> String {
    if eol.is_empty() {
        return encoded.to_string();
    }
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH * 2 + 2);
    // base64 output is ASCII, so byte chunks are char boundaries
    for chunk in encoded.as_bytes().chunks(BASE64_LINE_LENGTH) {
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push_str(eol);
    }
    out
}

fn strip_line_breaks(text: &str, strict: bool) -> Result<String, Error> {
    let mut compact = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\r' || c == '\n' {
            continue;
        }
        if c.is_whitespace() {
            if strict {
                return Err(Error::UnexpectedCharacter(c));
            }
            continue;
        }
        compact.push(c);
    }
    Ok(compact)
}

fn decode_base64_body(body: &str, strict: bool) -> Result<Vec<u8>, Error> {
    let compact = strip_line_breaks(body, strict)?;
    STANDARD.decode(compact).map_err(Error::Base64Decode)
}

#[cfg(test)]
mod tests {
    use codec::decoder::Decoder;
    use rstest::rstest;

    use crate::error::Error;
    use crate::{Encoding, Label, Pem, StringFormat, decode, encode};
    use std::str::FromStr;

    const TEST_CRL_PEM: &str = "-----BEGIN X509 CRL-----\r\nMAMCAQE=\r\n-----END X509 CRL-----\r\n";
    const TEST_PEM_WITH_TEXT: &str = r"Issuer: CN=Atlantis
-----BEGIN CERTIFICATE-----
MAMCAQE=
-----END CERTIFICATE-----
";

    #[rstest]
    #[case(TEST_CRL_PEM, Label::X509Crl)]
    #[case(TEST_PEM_WITH_TEXT, Label::Certificate)]
    fn test_pem_from_str(#[case] input: &str, #[case] expected_label: Label) {
        let pem = Pem::from_str(input).unwrap();
        assert_eq!(&expected_label, pem.label());
        assert_eq!(&[0x30, 0x03, 0x02, 0x01, 0x01], pem.contents());
    }

    const INVALID_TEST_PEM1: &str = r"";
    const INVALID_TEST_PEM2: &str = r"-----BEGIN PKCS7-----
AAA
";
    const INVALID_TEST_PEM3: &str = r"-----BEGIN PKCS7-----
AAA==
-----END X509 CRL-----
";
    #[rstest]
    #[case(INVALID_TEST_PEM1, Error::MissingPreEncapsulationBoundary)]
    #[case(INVALID_TEST_PEM2, Error::MissingPostEncapsulationBoundary)]
    #[case(INVALID_TEST_PEM3, Error::LabelMissMatch)]
    fn test_pem_from_str_with_error(#[case] input: &str, #[case] expected: Error) {
        if let Err(e) = Pem::from_str(input) {
            assert_eq!(expected, e);
        } else {
            panic!("this test should return an error");
        }
    }

    #[test]
    fn test_pem_decoder_discards_label() {
        let pem: Pem = TEST_CRL_PEM.decode().unwrap();
        let bytes: Vec<u8> = pem.decode().unwrap();
        assert_eq!(vec![0x30, 0x03, 0x02, 0x01, 0x01], bytes);
    }

    #[rstest]
    #[case::single("\n", 1)]
    #[case::with_whitespace("\n\n\n", 2)]
    #[case::no_separator("", 2)]
    fn test_parse_many(#[case] sep: &str, #[case] expected_count: usize) {
        let blocks = vec![TEST_CRL_PEM.trim_end(); expected_count];
        let input = blocks.join(sep);
        let pems = crate::parse_many(&input).unwrap();
        assert_eq!(pems.len(), expected_count);
    }

    #[test]
    fn test_parse_many_empty() {
        assert!(crate::parse_many("").is_err());
    }

    #[rstest]
    #[case(Encoding::Base64, "")]
    #[case(Encoding::Base64Uri, "")]
    #[case(Encoding::HexRaw, "")]
    #[case(Encoding::Hex, "")]
    #[case(Encoding::Base64Header, "-----BEGIN CERTIFICATE-----\r\n-----END CERTIFICATE-----\r\n")]
    fn test_encode_empty(#[case] encoding: Encoding, #[case] expected: &str) {
        assert_eq!(expected, encode(&[], encoding.into()).unwrap());
    }

    #[test]
    fn test_encode_base64_wraps_at_64() {
        let data = vec![0u8; 60];
        let text = encode(&data, Encoding::Base64.into()).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(vec![64, 16, 0], lines.iter().map(|l| l.len()).collect::<Vec<_>>());

        let flat = encode(&data, StringFormat::new(Encoding::Base64).with_flags(StringFormat::NOCRLF)).unwrap();
        assert_eq!(80, flat.len());
        assert!(!flat.contains('\n'));
    }

    #[test]
    fn test_encode_crl_header_nocr() {
        let format = StringFormat::new(Encoding::Base64X509CrlHeader).with_flags(StringFormat::NOCR);
        let text = encode(&[0x30, 0x03, 0x02, 0x01, 0x01], format).unwrap();
        assert_eq!("-----BEGIN X509 CRL-----\nMAMCAQE=\n-----END X509 CRL-----\n", text);
    }

    #[rstest]
    #[case(Encoding::Base64Header)]
    #[case(Encoding::Hex)]
    #[case(Encoding::HexAsciiAddr)]
    fn test_encode_rejects_nocrlf(#[case] encoding: Encoding) {
        let format = StringFormat::new(encoding).with_flags(StringFormat::NOCRLF);
        assert!(matches!(encode(&[1, 2, 3], format), Err(Error::UnsupportedFlags { .. })));
    }

    #[rstest]
    #[case(Encoding::Any)]
    #[case(Encoding::Base64Any)]
    #[case(Encoding::HexAny)]
    fn test_encode_decode_only(#[case] encoding: Encoding) {
        assert_eq!(Err(Error::DecodeOnly(encoding)), encode(&[1], encoding.into()));
    }

    #[rstest]
    #[case(Encoding::Base64Header)]
    #[case(Encoding::Base64)]
    #[case(Encoding::Base64RequestHeader)]
    #[case(Encoding::Base64X509CrlHeader)]
    #[case(Encoding::Base64Uri)]
    #[case(Encoding::Hex)]
    #[case(Encoding::HexAscii)]
    #[case(Encoding::HexAddr)]
    #[case(Encoding::HexAsciiAddr)]
    #[case(Encoding::HexRaw)]
    fn test_decode_detects_encoding(#[case] encoding: Encoding) {
        let data: Vec<u8> = (0u8..40).map(|b| b.wrapping_mul(37)).collect();
        let text = encode(&data, encoding.into()).unwrap();
        let decoded = decode(&text, encoding.into()).unwrap();
        assert_eq!(data, decoded.bytes);
        assert_eq!(encoding, decoded.encoding);
    }

    #[rstest]
    #[case(Encoding::Base64Header, Encoding::Any)]
    #[case(Encoding::Base64, Encoding::Any)]
    #[case(Encoding::Base64X509CrlHeader, Encoding::Base64Any)]
    #[case(Encoding::HexAddr, Encoding::HexAny)]
    #[case(Encoding::HexAsciiAddr, Encoding::HexAny)]
    #[case(Encoding::Hex, Encoding::HexAny)]
    #[case(Encoding::HexRaw, Encoding::HexAny)]
    #[case(Encoding::HexAscii, Encoding::HexAny)]
    fn test_decode_any_family(#[case] encoding: Encoding, #[case] family: Encoding) {
        let data: Vec<u8> = (0u8..40).map(|b| b.wrapping_mul(37)).collect();
        let text = encode(&data, encoding.into()).unwrap();
        let decoded = decode(&text, family.into()).unwrap();
        assert_eq!(data, decoded.bytes);
        let expected = match encoding {
            Encoding::Base64X509CrlHeader => Encoding::Base64Header,
            e => e,
        };
        assert_eq!(expected, decoded.encoding);
    }

    #[test]
    fn test_decode_any_falls_back_to_binary() {
        let decoded = decode("not base64!", Encoding::Any.into()).unwrap();
        assert_eq!(b"not base64!".to_vec(), decoded.bytes);
        assert_eq!(Encoding::Binary, decoded.encoding);
    }

    #[test]
    fn test_decode_reports_skipped_text() {
        let decoded = decode(TEST_PEM_WITH_TEXT, Encoding::Base64Header.into()).unwrap();
        assert_eq!("Issuer: CN=Atlantis\n".len(), decoded.skipped);
    }

    #[test]
    fn test_decode_crl_header_rejects_other_label() {
        let err = decode(TEST_PEM_WITH_TEXT, Encoding::Base64X509CrlHeader.into()).unwrap_err();
        assert_eq!(Error::InvalidLabel("CERTIFICATE".to_string()), err);
    }

    #[test]
    fn test_decode_strict_base64() {
        let format = StringFormat::new(Encoding::Base64).with_flags(StringFormat::STRICT);
        assert!(decode("MAMC AQE=", format).is_err());
        assert!(decode("MAMC\r\nAQE=", format).is_ok());
    }

    #[test]
    fn test_binary_not_text() {
        assert_eq!(Err(Error::BinaryNotText), encode(&[0xff, 0xfe], Encoding::Binary.into()));
    }
}
