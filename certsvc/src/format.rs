//! Human readable rendering of encoded structures.

use der::{Tag, Tlv};

use crate::error::Result;
use crate::fields::Fields;
use crate::types::FormatFlags;

pub const SUBJECT_KEY_IDENTIFIER: &str = "2.5.29.14";
pub const KEY_USAGE: &str = "2.5.29.15";
pub const BASIC_CONSTRAINTS: &str = "2.5.29.19";
pub const CRL_NUMBER: &str = "2.5.29.20";
pub const CRL_REASON_CODE: &str = "2.5.29.21";
pub const EXTENDED_KEY_USAGE: &str = "2.5.29.37";

const LINE_END: &str = "\r\n";

/// Renders `encoded` as the structure named by `struct_type`. Unknown or
/// absent types produce a hex dump.
pub(crate) fn render(struct_type: Option<&str>, flags: FormatFlags, encoded: &[u8]) -> Result<String> {
    let multi_line = flags.contains(FormatFlags::MULTI_LINE);
    let items = match struct_type {
        Some(SUBJECT_KEY_IDENTIFIER) => {
            vec![spaced_hex(Tlv::from_der(encoded)?.as_octets()?)]
        }
        Some(CRL_NUMBER) => vec![crl_number(&Tlv::from_der(encoded)?)?],
        Some(CRL_REASON_CODE) => vec![reason_code(&Tlv::from_der(encoded)?)?],
        Some(BASIC_CONSTRAINTS) => basic_constraints(&Tlv::from_der(encoded)?)?,
        Some(KEY_USAGE) => vec![key_usage(
            &Tlv::from_der(encoded)?,
            !flags.contains(FormatFlags::NO_HEX),
        )?],
        Some(EXTENDED_KEY_USAGE) => extended_key_usage(&Tlv::from_der(encoded)?)?,
        _ => return hex_dump(encoded, multi_line),
    };
    if multi_line {
        Ok(items.iter().map(|i| format!("{}{}", i, LINE_END)).collect())
    } else {
        Ok(items.join(", "))
    }
}

fn hex_dump(encoded: &[u8], multi_line: bool) -> Result<String> {
    if multi_line {
        return Ok(pem::encode(encoded, pem::Encoding::Hex.into())?);
    }
    Ok(spaced_hex(encoded))
}

fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn crl_number(tlv: &Tlv) -> Result<String> {
    let content = tlv.as_integer()?;
    let content = match content {
        [0x00, rest @ ..] if !rest.is_empty() => rest,
        c => c,
    };
    Ok(content.iter().map(|b| format!("{:02x}", b)).collect())
}

fn reason_code(tlv: &Tlv) -> Result<String> {
    let code = tlv.expect(Tag::ENUMERATED)?.as_u64()?;
    let name = match code {
        0 => "Unspecified",
        1 => "Key Compromise",
        2 => "CA Compromise",
        3 => "Affiliation Changed",
        4 => "Superseded",
        5 => "Cessation of Operation",
        6 => "Certificate Hold",
        8 => "Remove From CRL",
        9 => "Privilege Withdrawn",
        10 => "AA Compromise",
        _ => "Unknown",
    };
    Ok(format!("{} ({})", name, code))
}

fn basic_constraints(tlv: &Tlv) -> Result<Vec<String>> {
    let mut fields = Fields::new(tlv.expect(Tag::SEQUENCE)?);
    let ca = match fields.next_tagged(Tag::BOOLEAN) {
        Some(b) => b.as_bool()?,
        None => false,
    };
    let path_len = match fields.next_tagged(Tag::INTEGER) {
        Some(n) => n.as_u64()?.to_string(),
        None => "None".to_string(),
    };
    Ok(vec![
        format!("Subject Type={}", if ca { "CA" } else { "End Entity" }),
        format!("Path Length Constraint={}", path_len),
    ])
}

const KEY_USAGE_NAMES: [&str; 9] = [
    "Digital Signature",
    "Non-Repudiation",
    "Key Encipherment",
    "Data Encipherment",
    "Key Agreement",
    "Certificate Signing",
    "Off-line CRL Signing, CRL Signing",
    "Encipher Only",
    "Decipher Only",
];

fn key_usage(tlv: &Tlv, with_hex: bool) -> Result<String> {
    let (_, bits) = tlv.as_bit_string()?;
    let names: Vec<&str> = KEY_USAGE_NAMES
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            bits.get(i / 8)
                .is_some_and(|byte| byte & (0x80 >> (i % 8)) != 0)
        })
        .map(|(_, name)| *name)
        .collect();
    let mut out = if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    };
    if with_hex {
        out.push_str(&format!(" ({})", spaced_hex(bits)));
    }
    Ok(out)
}

fn extended_key_usage(tlv: &Tlv) -> Result<Vec<String>> {
    tlv.expect(Tag::SEQUENCE)?
        .children()
        .iter()
        .map(|purpose| {
            let oid = purpose.as_oid()?.to_string();
            let name = match oid.as_str() {
                "1.3.6.1.5.5.7.3.1" => "Server Authentication",
                "1.3.6.1.5.5.7.3.2" => "Client Authentication",
                "1.3.6.1.5.5.7.3.3" => "Code Signing",
                "1.3.6.1.5.5.7.3.4" => "Secure Email",
                "1.3.6.1.5.5.7.3.8" => "Time Stamping",
                "1.3.6.1.5.5.7.3.9" => "OCSP Signing",
                _ => "Unknown Key Usage",
            };
            Ok(format!("{} ({})", name, oid))
        })
        .collect()
}
