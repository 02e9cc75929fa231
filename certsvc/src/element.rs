//! Serialized store elements.
//!
//! An element is a run of little-endian records:
//!
//! ```text
//! +--------+-----------+---------+----------------+
//! | id u32 | field u32 | len u32 | data[len] ...  |
//! +--------+-----------+---------+----------------+
//! ```
//!
//! Property records use `field = 1`. The last record holds the encoded
//! context under id 33 (CRL) or 34 (CTL), with the encoding type in `field`.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{ContextType, EncodingType};

const PROPERTY_FIELD: u32 = 1;
const HEADER_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) kind: ContextType,
    pub(crate) encoding: EncodingType,
    pub(crate) encoded: Vec<u8>,
    pub(crate) properties: BTreeMap<u32, Vec<u8>>,
}

pub(crate) fn serialize(
    kind: ContextType,
    encoding: EncodingType,
    encoded: &[u8],
    properties: &BTreeMap<u32, Vec<u8>>,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (&id, value) in properties {
        push_record(&mut out, id, PROPERTY_FIELD, value)?;
    }
    push_record(&mut out, kind.element_id(), encoding.bits(), encoded)?;
    Ok(out)
}

fn push_record(out: &mut Vec<u8>, id: u32, field: u32, data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len()).map_err(|_| {
        Error::InvalidParameter(format!("record {} of {} bytes is too long", id, data.len()))
    })?;
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&field.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(data);
    Ok(())
}

pub(crate) fn parse(mut input: &[u8]) -> Result<Element> {
    let mut properties = BTreeMap::new();
    while !input.is_empty() {
        let (id, field, data, rest) = read_record(input)?;
        if let Some(kind) = ContextType::from_element_id(id) {
            if !rest.is_empty() {
                return Err(Error::InvalidData(format!(
                    "{} bytes after the context record",
                    rest.len()
                )));
            }
            return Ok(Element {
                kind,
                encoding: EncodingType::from_bits(field),
                encoded: data.to_vec(),
                properties,
            });
        }
        if id == 0 {
            return Err(Error::InvalidData("property id 0".to_string()));
        }
        if field != PROPERTY_FIELD {
            return Err(Error::InvalidData(format!(
                "property {} has field {}",
                id, field
            )));
        }
        properties.insert(id, data.to_vec());
        input = rest;
    }
    Err(Error::InvalidData(
        "store element has no context record".to_string(),
    ))
}

fn read_record(input: &[u8]) -> Result<(u32, u32, &[u8], &[u8])> {
    if input.len() < HEADER_LEN {
        return Err(Error::InvalidData("truncated record header".to_string()));
    }
    let word = |i: usize| u32::from_le_bytes([input[i], input[i + 1], input[i + 2], input[i + 3]]);
    let (id, field, len) = (word(0), word(4), word(8) as usize);
    let body = &input[HEADER_LEN..];
    if body.len() < len {
        return Err(Error::InvalidData(format!(
            "record {} needs {} bytes, {} left",
            id,
            len,
            body.len()
        )));
    }
    Ok((id, field, &body[..len], &body[len..]))
}
