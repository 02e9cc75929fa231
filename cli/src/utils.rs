use std::fs;
use std::io::{self, Read};
use std::str::FromStr;

use certsvc::{CertServices, Encoding, EncodingType, Extension, FormatFlags, StringFormat};
use chrono::NaiveDateTime;
use pem::Pem;
use tracing::debug;

use crate::error::Result;

/// Read input from a file or stdin
///
/// If `file` is `Some`, reads from the specified file path.
/// If `file` is `None`, reads from stdin.
pub(crate) fn read_input(file: Option<&str>) -> Result<Vec<u8>> {
    match file {
        Some(path) => Ok(fs::read(path)?),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Read a PEM or DER encoded object from a file or stdin
///
/// Text containing a PEM block yields the block contents; anything else is
/// taken as DER.
pub(crate) fn read_encoded(file: Option<&str>) -> Result<Vec<u8>> {
    let input = read_input(file)?;
    if let Ok(text) = std::str::from_utf8(&input) {
        if let Ok(pem) = Pem::from_str(text) {
            debug!(label = %pem.label(), "read PEM input");
            return Ok(pem.into_contents());
        }
    }
    Ok(input)
}

/// Lowercase hex without separators
pub(crate) fn hex<S: CertServices + ?Sized>(services: &S, bytes: &[u8]) -> Result<String> {
    let format = StringFormat::new(Encoding::HexRaw).with_flags(StringFormat::NOCRLF);
    Ok(cryptowrappers::binary_to_text(services, bytes, format)?)
}

const DATE_FORMAT: &str = "%b %d %H:%M:%S %Y GMT";

pub(crate) fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One line per extension: OID, criticality and the rendered value
pub(crate) fn format_extension<S: CertServices + ?Sized>(services: &S, extension: &Extension) -> String {
    let rendered = cryptowrappers::format_object(
        services,
        EncodingType::X509_ASN,
        FormatFlags::NONE,
        Some(extension.oid.as_str()),
        &extension.value,
    )
    .ok()
    // malformed values are shown as they are
    .or_else(|| hex(services, &extension.value).ok())
    .unwrap_or_default();
    let critical = if extension.critical { " (critical)" } else { "" };
    format!("{}{}: {}", extension.oid, critical, rendered)
}
