//! Shared pieces of the structural DER walk.

use der::{Error, Tag, Tlv};
use serde::{Deserialize, Serialize};

/// Positional reader over the children of a constructed element, for
/// structures with OPTIONAL members.
pub(crate) struct Fields<'a> {
    items: &'a [Tlv],
    pos: usize,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(parent: &'a Tlv) -> Self {
        Fields {
            items: parent.children(),
            pos: 0,
        }
    }

    pub(crate) fn next(&mut self, name: &'static str) -> Result<&'a Tlv, Error> {
        let item = self.items.get(self.pos).ok_or(Error::MissingElement(name))?;
        self.pos += 1;
        Ok(item)
    }

    /// Consumes the next element only when it satisfies `accept`.
    pub(crate) fn next_if(&mut self, accept: impl Fn(&Tlv) -> bool) -> Option<&'a Tlv> {
        let item = self.items.get(self.pos).filter(|t| accept(t))?;
        self.pos += 1;
        Some(item)
    }

    pub(crate) fn next_tagged(&mut self, tag: Tag) -> Option<&'a Tlv> {
        self.next_if(|t| t.tag() == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub oid: String,
    pub critical: bool,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

/// `Extensions ::= SEQUENCE OF Extension`
pub(crate) fn extensions(tlv: &Tlv) -> Result<Vec<Extension>, Error> {
    tlv.expect(Tag::SEQUENCE)?
        .children()
        .iter()
        .map(|ext| {
            let mut fields = Fields::new(ext.expect(Tag::SEQUENCE)?);
            let oid = fields.next("extnID")?.as_oid()?;
            let critical = match fields.next_tagged(Tag::BOOLEAN) {
                Some(b) => b.as_bool()?,
                None => false,
            };
            let value = fields.next("extnValue")?.as_octets()?.to_vec();
            Ok(Extension {
                oid: oid.to_string(),
                critical,
                value,
            })
        })
        .collect()
}

/// `AlgorithmIdentifier ::= SEQUENCE { algorithm OID, parameters ANY OPTIONAL }`
pub(crate) fn algorithm(tlv: &Tlv) -> Result<String, Error> {
    let mut fields = Fields::new(tlv.expect(Tag::SEQUENCE)?);
    Ok(fields.next("algorithm")?.as_oid()?.to_string())
}

/// Renders an X.501 `Name` as `CN=..., O=...`.
pub(crate) fn display_name(tlv: &Tlv) -> Result<String, Error> {
    let mut parts = Vec::new();
    for rdn in tlv.expect(Tag::SEQUENCE)?.children() {
        for atv in rdn.expect(Tag::SET)?.children() {
            let mut fields = Fields::new(atv.expect(Tag::SEQUENCE)?);
            let oid = fields.next("type")?.as_oid()?.to_string();
            let value = fields.next("value")?;
            let value = value
                .as_string()
                .unwrap_or_else(|_| format!("#{}", to_hex(value.raw())));
            parts.push(format!("{}={}", attribute_name(&oid), value));
        }
    }
    Ok(parts.join(", "))
}

fn attribute_name(oid: &str) -> &str {
    match oid {
        "2.5.4.3" => "CN",
        "2.5.4.5" => "SERIALNUMBER",
        "2.5.4.6" => "C",
        "2.5.4.7" => "L",
        "2.5.4.8" => "ST",
        "2.5.4.10" => "O",
        "2.5.4.11" => "OU",
        "0.9.2342.19200300.100.1.25" => "DC",
        "1.2.840.113549.1.9.1" => "E",
        other => other,
    }
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Serializes byte vectors as lowercase hex strings.
pub(crate) mod hex_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(bytes))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() % 2 != 0 {
            return Err(D::Error::custom("odd number of hex digits"));
        }
        (0..s.len())
            .step_by(2)
            .map(|i| {
                s.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| D::Error::custom(format!("invalid hex at {}", i)))
            })
            .collect()
    }
}
