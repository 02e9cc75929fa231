use certsvc::{CtlInfo, Encoding, EncodingType, MemoryServices, SortedSubject, StringFormat, Subject};
use clap::Args;
use cryptowrappers::{ContextKind, Ctl, CtlKind};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::output::OutputFormat;
use crate::utils::{format_date, format_extension, hex, read_encoded};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the CTL file (PEM or DER format). If not specified, reads from stdin
    file: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Look up a subject by its identifier (hex)
    #[arg(long, value_name = "HEX", conflicts_with = "cert")]
    subject: Option<String>,

    /// Look up the subject matching the certificate in this file (PEM or DER)
    #[arg(long, value_name = "CERT")]
    cert: Option<String>,
}

#[derive(Serialize)]
struct Report {
    #[serde(flatten)]
    info: CtlInfo,
    sorted_subjects: Vec<SortedSubject>,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let encoded = read_encoded(config.file.as_deref())?;

    let services = MemoryServices::new();
    let ctl = Ctl::decode(&services, CtlKind::ENCODING, &encoded)?;

    if let Some(identifier) = config.subject.as_deref() {
        let identifier = cryptowrappers::text_to_binary(
            &services,
            identifier,
            StringFormat::new(Encoding::HexRaw),
        )
        .map_err(|_| Error::InvalidInput(format!("'{}' is not a hex identifier", identifier)))?
        .bytes;
        return match ctl.find_subject_in_sorted(&identifier) {
            Ok(attributes) => {
                println!("Found: {}", hex(&services, &identifier)?);
                println!("    Attributes: {}", hex(&services, &attributes)?);
                Ok(())
            }
            Err(cryptowrappers::Error::NotFound(_)) => {
                println!("Not found");
                Ok(())
            }
            Err(e) => Err(Error::from(e)),
        };
    }

    if let Some(path) = config.cert.as_deref() {
        let certificate = read_encoded(Some(path))?;
        return match ctl.find_subject(EncodingType::X509_ASN, &Subject::Certificate(&certificate)) {
            Ok(entry) => {
                println!("Found: {}", hex(&services, &entry.subject_identifier)?);
                for attribute in &entry.attributes {
                    println!("    {}: {} value(s)", attribute.oid, attribute.values.len());
                }
                Ok(())
            }
            Err(cryptowrappers::Error::NotFound(_)) => {
                println!("Not found");
                Ok(())
            }
            Err(e) => Err(Error::from(e)),
        };
    }

    let info = ctl.info()?;
    let sorted_subjects = ctl.sorted_subjects().collect::<cryptowrappers::Result<Vec<_>>>()?;
    match config.output {
        OutputFormat::Text => {
            println!("Certificate Trust List (CTL):");
            println!("    Version: {} (0x{:x})", info.version + 1, info.version);
            println!("    Subject Usage: {}", info.subject_usage.join(", "));
            if let Some(id) = &info.list_identifier {
                println!("    List Identifier: {}", hex(&services, id)?);
            }
            if let Some(number) = &info.sequence_number {
                println!("    Sequence Number: {}", hex(&services, number)?);
            }
            println!("    This Update: {}", format_date(&info.this_update));
            if let Some(next) = &info.next_update {
                println!("    Next Update: {}", format_date(next));
            }
            println!("    Subject Algorithm: {}", info.subject_algorithm);
            if !info.extensions.is_empty() {
                println!("    CTL extensions:");
                for extension in &info.extensions {
                    println!("        {}", format_extension(&services, extension));
                }
            }
            if sorted_subjects.is_empty() {
                println!("No Trusted Subjects.");
            } else {
                println!("Trusted Subjects:");
                for subject in &sorted_subjects {
                    println!("    {}", hex(&services, &subject.identifier)?);
                    let attributes = info
                        .entries
                        .iter()
                        .find(|e| e.subject_identifier == subject.identifier)
                        .map(|e| e.attributes.as_slice())
                        .unwrap_or_default();
                    for attribute in attributes {
                        println!("        {}: {} value(s)", attribute.oid, attribute.values.len());
                    }
                }
            }
        }
        OutputFormat::Json => {
            let report = Report {
                info,
                sorted_subjects,
            };
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
    }

    Ok(())
}
