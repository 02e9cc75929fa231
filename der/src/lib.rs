//! DER (Distinguished Encoding Rules) reader and writer.
//!
//! Parsing keeps the exact bytes of every element (`Tlv::raw`), so a
//! sub-structure such as an issuer `Name` can be compared or re-emitted
//! bit-for-bit without re-encoding.

use std::fmt::{self, Display, Formatter};

use codec::decoder::{DecodableFrom, Decoder};
use codec::encoder::{EncodableTo, Encoder};
use nom::{IResult, Parser};

pub mod error;
mod oid;
mod time;

pub use error::Error;
pub use oid::ObjectIdentifier;

/// A sequence of top-level DER elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Der {
    elements: Vec<Tlv>,
}

impl Der {
    pub fn new(elements: Vec<Tlv>) -> Self {
        Der { elements }
    }

    pub fn elements(&self) -> &[Tlv] {
        &self.elements
    }

    /// Returns the only element, failing when there is none or more than one.
    pub fn into_single(mut self) -> Result<Tlv, Error> {
        match self.elements.len() {
            0 => Err(Error::Empty),
            1 => Ok(self.elements.remove(0)),
            _ => {
                let trailing = self.elements[1..].iter().map(|t| t.raw.len()).sum();
                Err(Error::TrailingData(trailing))
            }
        }
    }
}

impl DecodableFrom<Vec<u8>> for Der {}

impl Decoder<Vec<u8>, Der> for Vec<u8> {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        self.as_slice().decode()
    }
}

impl DecodableFrom<&[u8]> for Der {}

impl Decoder<&[u8], Der> for &[u8] {
    type Error = Error;

    fn decode(&self) -> Result<Der, Self::Error> {
        let mut input: &[u8] = self;
        let mut elements = Vec::new();
        while !input.is_empty() {
            let (rest, tlv) = Tlv::parse(input)?;
            input = rest;
            elements.push(tlv);
        }
        Ok(Der { elements })
    }
}

impl EncodableTo<Der> for Vec<u8> {}

impl Encoder<Der, Vec<u8>> for Der {
    type Error = Error;

    fn encode(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(self
            .elements
            .iter()
            .flat_map(|tlv| tlv.raw.iter().copied())
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

impl From<u8> for TagClass {
    fn from(value: u8) -> Self {
        match value >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }
}

impl TagClass {
    fn bits(self) -> u8 {
        match self {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::ContextSpecific => 0x80,
            TagClass::Private => 0xc0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    class: TagClass,
    constructed: bool,
    number: u32,
}

impl Tag {
    pub const BOOLEAN: Tag = Tag::universal(0x01, false);
    pub const INTEGER: Tag = Tag::universal(0x02, false);
    pub const BIT_STRING: Tag = Tag::universal(0x03, false);
    pub const OCTET_STRING: Tag = Tag::universal(0x04, false);
    pub const NULL: Tag = Tag::universal(0x05, false);
    pub const OBJECT_IDENTIFIER: Tag = Tag::universal(0x06, false);
    pub const ENUMERATED: Tag = Tag::universal(0x0a, false);
    pub const UTF8_STRING: Tag = Tag::universal(0x0c, false);
    pub const NUMERIC_STRING: Tag = Tag::universal(0x12, false);
    pub const PRINTABLE_STRING: Tag = Tag::universal(0x13, false);
    pub const T61_STRING: Tag = Tag::universal(0x14, false);
    pub const IA5_STRING: Tag = Tag::universal(0x16, false);
    pub const UTC_TIME: Tag = Tag::universal(0x17, false);
    pub const GENERALIZED_TIME: Tag = Tag::universal(0x18, false);
    pub const VISIBLE_STRING: Tag = Tag::universal(0x1a, false);
    pub const BMP_STRING: Tag = Tag::universal(0x1e, false);
    pub const SEQUENCE: Tag = Tag::universal(0x10, true);
    pub const SET: Tag = Tag::universal(0x11, true);

    pub const fn new(class: TagClass, constructed: bool, number: u32) -> Self {
        Tag {
            class,
            constructed,
            number,
        }
    }

    pub const fn universal(number: u32, constructed: bool) -> Self {
        Tag::new(TagClass::Universal, constructed, number)
    }

    /// Context-specific tag `[number]`.
    pub const fn context(number: u32, constructed: bool) -> Self {
        Tag::new(TagClass::ContextSpecific, constructed, number)
    }

    pub fn class(&self) -> TagClass {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    fn encode(&self) -> Vec<u8> {
        let lead = self.class.bits() | if self.constructed { 0x20 } else { 0x00 };
        if self.number < 0x1f {
            return vec![lead | self.number as u8];
        }
        // high-tag-number form: base-128, most significant group first
        let mut out = vec![lead | 0x1f];
        let mut groups = Vec::new();
        let mut n = self.number;
        loop {
            groups.push((n & 0x7f) as u8);
            n >>= 7;
            if n == 0 {
                break;
            }
        }
        for (i, g) in groups.iter().rev().enumerate() {
            let more = i + 1 < groups.len();
            out.push(if more { g | 0x80 } else { *g });
        }
        out
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.class {
            TagClass::Universal => {
                let name = match self.number {
                    0x01 => "BOOLEAN",
                    0x02 => "INTEGER",
                    0x03 => "BIT STRING",
                    0x04 => "OCTET STRING",
                    0x05 => "NULL",
                    0x06 => "OBJECT IDENTIFIER",
                    0x0a => "ENUMERATED",
                    0x0c => "UTF8String",
                    0x10 => "SEQUENCE",
                    0x11 => "SET",
                    0x12 => "NumericString",
                    0x13 => "PrintableString",
                    0x14 => "T61String",
                    0x16 => "IA5String",
                    0x17 => "UTCTime",
                    0x18 => "GeneralizedTime",
                    0x1a => "VisibleString",
                    0x1e => "BMPString",
                    n => return write!(f, "UNIVERSAL {}", n),
                };
                write!(f, "{}", name)
            }
            TagClass::Application => write!(f, "[APPLICATION {}]", self.number),
            TagClass::ContextSpecific => write!(f, "[{}]", self.number),
            TagClass::Private => write!(f, "[PRIVATE {}]", self.number),
        }
    }
}

/// One DER element together with its exact encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    tag: Tag,
    raw: Vec<u8>,
    header_len: usize,
    children: Vec<Tlv>,
}

impl Tlv {
    /// Parses one element from the front of `input`.
    pub fn parse(input: &[u8]) -> IResult<&[u8], Tlv> {
        let start = input;
        let (input, tag) = parse_tag(input)?;
        let (input, length) = parse_length(input)?;
        let header_len = start.len() - input.len();
        let (rest, content) = take_bytes(input, length)?;

        let mut children = Vec::new();
        if tag.constructed {
            // parse TLV recursively.
            let mut content = content;
            while !content.is_empty() {
                let (remaining, child) = Self::parse(content)?;
                content = remaining;
                children.push(child);
            }
        }

        Ok((
            rest,
            Tlv {
                tag,
                raw: start[..header_len + length].to_vec(),
                header_len,
                children,
            },
        ))
    }

    /// Parses exactly one element; trailing bytes are an error.
    pub fn from_der(input: &[u8]) -> Result<Tlv, Error> {
        if input.is_empty() {
            return Err(Error::Empty);
        }
        let (rest, tlv) = Self::parse(input)?;
        if !rest.is_empty() {
            return Err(Error::TrailingData(rest.len()));
        }
        Ok(tlv)
    }

    pub fn primitive(tag: Tag, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let mut raw = tag.encode();
        raw.extend(encode_length(data.len()));
        let header_len = raw.len();
        raw.extend(data);
        Tlv {
            tag,
            raw,
            header_len,
            children: Vec::new(),
        }
    }

    pub fn constructed(tag: Tag, children: Vec<Tlv>) -> Self {
        let content_len: usize = children.iter().map(|c| c.raw.len()).sum();
        let mut raw = tag.encode();
        raw.extend(encode_length(content_len));
        let header_len = raw.len();
        for child in &children {
            raw.extend_from_slice(&child.raw);
        }
        Tlv {
            tag,
            raw,
            header_len,
            children,
        }
    }

    pub fn sequence(children: Vec<Tlv>) -> Self {
        Tlv::constructed(Tag::SEQUENCE, children)
    }

    pub fn set(children: Vec<Tlv>) -> Self {
        Tlv::constructed(Tag::SET, children)
    }

    /// `[number] EXPLICIT` wrapper around `inner`.
    pub fn explicit(number: u32, inner: Tlv) -> Self {
        Tlv::constructed(Tag::context(number, true), vec![inner])
    }

    pub fn boolean(value: bool) -> Self {
        Tlv::primitive(Tag::BOOLEAN, vec![if value { 0xff } else { 0x00 }])
    }

    /// INTEGER from big-endian two's complement content octets.
    pub fn integer(content: &[u8]) -> Self {
        Tlv::primitive(Tag::INTEGER, content.to_vec())
    }

    pub fn unsigned(value: u64) -> Self {
        Tlv::primitive(Tag::INTEGER, unsigned_content(value))
    }

    pub fn enumerated(value: u64) -> Self {
        Tlv::primitive(Tag::ENUMERATED, unsigned_content(value))
    }

    pub fn null() -> Self {
        Tlv::primitive(Tag::NULL, Vec::new())
    }

    pub fn oid(oid: &ObjectIdentifier) -> Self {
        Tlv::primitive(Tag::OBJECT_IDENTIFIER, oid.to_der_content())
    }

    pub fn octet_string(data: &[u8]) -> Self {
        Tlv::primitive(Tag::OCTET_STRING, data.to_vec())
    }

    pub fn bit_string(unused_bits: u8, data: &[u8]) -> Self {
        let mut content = vec![unused_bits];
        content.extend_from_slice(data);
        Tlv::primitive(Tag::BIT_STRING, content)
    }

    pub fn utf8_string(s: &str) -> Self {
        Tlv::primitive(Tag::UTF8_STRING, s.as_bytes().to_vec())
    }

    pub fn printable_string(s: &str) -> Self {
        Tlv::primitive(Tag::PRINTABLE_STRING, s.as_bytes().to_vec())
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The complete encoding of this element, header included.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The content octets (for constructed elements, the encoded children).
    pub fn data(&self) -> &[u8] {
        &self.raw[self.header_len..]
    }

    pub fn children(&self) -> &[Tlv] {
        &self.children
    }

    pub fn expect(&self, tag: Tag) -> Result<&Tlv, Error> {
        if self.tag != tag {
            return Err(Error::UnexpectedTag {
                expected: tag,
                actual: self.tag,
            });
        }
        Ok(self)
    }

    pub fn as_bool(&self) -> Result<bool, Error> {
        match self.expect(Tag::BOOLEAN)?.data() {
            [0x00] => Ok(false),
            [0xff] => Ok(true),
            _ => Err(Error::InvalidBoolean),
        }
    }

    /// Content octets of an INTEGER, sign byte included.
    pub fn as_integer(&self) -> Result<&[u8], Error> {
        let data = self.expect(Tag::INTEGER)?.data();
        if data.is_empty() {
            return Err(Error::IntegerNoData);
        }
        Ok(data)
    }

    pub fn as_u64(&self) -> Result<u64, Error> {
        let data = match self.tag {
            Tag::ENUMERATED => self.data(),
            _ => self.as_integer()?,
        };
        if data.is_empty() {
            return Err(Error::IntegerNoData);
        }
        if data[0] & 0x80 != 0 {
            return Err(Error::IntegerOutOfRange);
        }
        let data = match data {
            [0x00, rest @ ..] if !rest.is_empty() => rest,
            d => d,
        };
        if data.len() > 8 {
            return Err(Error::IntegerOutOfRange);
        }
        Ok(data.iter().fold(0u64, |n, &b| (n << 8) | b as u64))
    }

    pub fn as_oid(&self) -> Result<ObjectIdentifier, Error> {
        ObjectIdentifier::from_der_content(self.expect(Tag::OBJECT_IDENTIFIER)?.data())
    }

    pub fn as_octets(&self) -> Result<&[u8], Error> {
        Ok(self.expect(Tag::OCTET_STRING)?.data())
    }

    /// Returns `(unused_bits, bytes)`.
    pub fn as_bit_string(&self) -> Result<(u8, &[u8]), Error> {
        match self.expect(Tag::BIT_STRING)?.data() {
            [] => Err(Error::InvalidBitString(0)),
            [unused, ..] if *unused > 7 => Err(Error::InvalidBitString(*unused)),
            [unused, rest @ ..] => Ok((*unused, rest)),
        }
    }

    pub fn as_time(&self) -> Result<chrono::NaiveDateTime, Error> {
        match self.tag {
            Tag::UTC_TIME => time::parse_utc_time(self.data()),
            Tag::GENERALIZED_TIME => time::parse_generalized_time(self.data()),
            actual => Err(Error::UnexpectedTag {
                expected: Tag::UTC_TIME,
                actual,
            }),
        }
    }

    pub fn is_time(&self) -> bool {
        self.tag == Tag::UTC_TIME || self.tag == Tag::GENERALIZED_TIME
    }

    /// Decodes any of the character string types.
    pub fn as_string(&self) -> Result<String, Error> {
        let data = self.data();
        match self.tag {
            Tag::UTF8_STRING
            | Tag::PRINTABLE_STRING
            | Tag::IA5_STRING
            | Tag::NUMERIC_STRING
            | Tag::VISIBLE_STRING => String::from_utf8(data.to_vec())
                .map_err(|e| Error::InvalidString(e.to_string())),
            // T61 is treated as Latin-1
            Tag::T61_STRING => Ok(data.iter().map(|&b| b as char).collect()),
            Tag::BMP_STRING => {
                if data.len() % 2 != 0 {
                    return Err(Error::InvalidString(format!(
                        "BMPString has odd length {}",
                        data.len()
                    )));
                }
                let units: Vec<u16> = data
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|e| Error::InvalidString(e.to_string()))
            }
            actual => Err(Error::UnexpectedTag {
                expected: Tag::UTF8_STRING,
                actual,
            }),
        }
    }

    /// Builds a UTCTime for years 1950-2049 and a GeneralizedTime otherwise.
    pub fn time(value: chrono::NaiveDateTime) -> Self {
        time::encode_time(value)
    }
}

fn unsigned_content(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    let mut content = bytes[first..].to_vec();
    if content[0] & 0x80 != 0 {
        content.insert(0, 0x00);
    }
    content
}

fn encode_length(length: usize) -> Vec<u8> {
    if length < 0x80 {
        return vec![length as u8];
    }
    let bytes = (length as u64).to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    let mut out = vec![0x80 | (8 - first) as u8];
    out.extend_from_slice(&bytes[first..]);
    out
}

fn byte(input: &[u8]) -> IResult<&[u8], u8> {
    nom::number::complete::be_u8(input)
}

fn take_bytes(input: &[u8], count: usize) -> IResult<&[u8], &[u8]> {
    nom::bytes::complete::take(count).parse(input)
}

fn parse_tag(input: &[u8]) -> IResult<&[u8], Tag> {
    let (mut input, n) = byte(input)?;
    let class = TagClass::from(n);
    let constructed = n & 0x20 == 0x20;
    if n & 0x1f != 0x1f {
        return Ok((input, Tag::new(class, constructed, (n & 0x1f) as u32)));
    }
    // high-tag-number form
    let mut number = 0u32;
    loop {
        let (rest, b) = byte(input)?;
        input = rest;
        if number > (u32::MAX >> 7) {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::TooLarge,
            )));
        }
        number = (number << 7) | (b & 0x7f) as u32;
        if b & 0x80 == 0 {
            break;
        }
    }
    Ok((input, Tag::new(class, constructed, number)))
}

fn parse_length(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, n) = byte(input)?;
    if n & 0x80 == 0 {
        // short form: 0-127
        return Ok((input, n as usize));
    }
    // long form
    // First 1 bit is a marker for long form.
    // Other bits represent bytes length of the length field.
    let count = (n & 0x7f) as usize;
    if count == 0 || count > std::mem::size_of::<usize>() {
        // indefinite lengths are BER only
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::LengthValue,
        )));
    }
    let (input, bs) = take_bytes(input, count)?;
    let length = bs.iter().fold(0usize, |n, &b| (n << 8) | b as usize);
    Ok((input, length))
}
