//! Hex dump layouts.
//!
//! ```text
//! Hex           30 82 01 0a 02 82 01 01  00 c3 79 21 2c e2 81 68
//! HexAddr       0000    30 82 01 0a 02 82 01 01  00 c3 79 21 2c e2 81 68
//! HexAscii      30 82 01 0a 02 82 01 01  00 c3 79 21 2c e2 81 68   0.........y!,..h
//! HexRaw        3082010a02820101
//! ```

use std::fmt::Write;

use crate::error::Error;

const BYTES_PER_LINE: usize = 16;
// 16 two-digit bytes, 15 separators and the extra gap after the eighth byte
const HEX_COLUMN_WIDTH: usize = 48;
const ADDRESS_GAP: &str = "    ";
const ASCII_GAP: &str = "   ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) address: bool,
    pub(crate) ascii: bool,
}

pub(crate) fn encode_raw(data: &[u8], eol: &str) -> String {
    if data.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(data.len() * 2 + eol.len());
    for b in data {
        let _ = write!(out, "{:02x}", b);
    }
    out.push_str(eol);
    out
}

pub(crate) fn encode_lines(data: &[u8], layout: Layout, eol: &str) -> String {
    let mut out = String::new();
    for (index, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        if layout.address {
            let _ = write!(out, "{:04x}{}", index * BYTES_PER_LINE, ADDRESS_GAP);
        }
        let column = hex_column(chunk);
        out.push_str(&column);
        if layout.ascii {
            out.push_str(&" ".repeat(HEX_COLUMN_WIDTH - column.len()));
            out.push_str(ASCII_GAP);
            out.extend(chunk.iter().map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            }));
        }
        out.push_str(eol);
    }
    out
}

fn hex_column(chunk: &[u8]) -> String {
    let mut column = String::with_capacity(HEX_COLUMN_WIDTH);
    for (i, b) in chunk.iter().enumerate() {
        if i > 0 {
            column.push(' ');
            if i == BYTES_PER_LINE / 2 {
                column.push(' ');
            }
        }
        let _ = write!(column, "{:02x}", b);
    }
    column
}

pub(crate) fn decode_raw(text: &str, strict: bool) -> Result<Vec<u8>, Error> {
    let mut digits = String::with_capacity(text.len());
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
        digits.push(c);
    }
    if digits.len() % 2 != 0 {
        return Err(Error::InvalidHex(format!("odd number of digits ({})", digits.len())));
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(parse_pair)
        .collect()
}

pub(crate) fn decode_lines(text: &str, layout: Layout) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut rest = line;
        if layout.address {
            let (address, remainder) = rest
                .split_once(char::is_whitespace)
                .unwrap_or((rest, ""));
            if address.len() < 4 {
                return Err(Error::InvalidHex(format!("'{}' is not a line address", address)));
            }
            let found = usize::from_str_radix(address, 16)
                .map_err(|_| Error::InvalidHex(format!("'{}' is not a line address", address)))?;
            if found != out.len() {
                return Err(Error::InvalidAddress {
                    expected: out.len(),
                    found,
                });
            }
            rest = remainder.trim_start();
        }
        if layout.ascii {
            let end = rest
                .char_indices()
                .nth(HEX_COLUMN_WIDTH)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            rest = &rest[..end];
        } else if rest.contains(ASCII_GAP) {
            // an ASCII column follows the hex bytes
            return Err(Error::InvalidHex("unexpected text column".to_string()));
        }
        let mut count = 0;
        for token in rest.split_whitespace() {
            if token.len() != 2 {
                return Err(Error::InvalidHex(format!("'{}' is not a byte", token)));
            }
            out.push(parse_pair(token.as_bytes())?);
            count += 1;
        }
        if count > BYTES_PER_LINE {
            return Err(Error::InvalidHex(format!("{} bytes on one line", count)));
        }
    }
    Ok(out)
}

fn parse_pair(pair: &[u8]) -> Result<u8, Error> {
    let s = std::str::from_utf8(pair).map_err(|e| Error::InvalidHex(e.to_string()))?;
    u8::from_str_radix(s, 16).map_err(|_| Error::InvalidHex(format!("'{}' is not a byte", s)))
}
