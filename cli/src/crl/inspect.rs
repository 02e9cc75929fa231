use certsvc::MemoryServices;
use clap::Args;
use cryptowrappers::{ContextKind, Crl, CrlKind, Sha1Hash};

use crate::error::{Error, Result};
use crate::output::OutputFormat;
use crate::utils::{format_date, format_extension, hex, read_encoded};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the CRL file (PEM or DER format). If not specified, reads from stdin
    file: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Report whether the certificate in this file (PEM or DER) is revoked
    #[arg(long, value_name = "CERT")]
    check: Option<String>,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let encoded = read_encoded(config.file.as_deref())?;

    let services = MemoryServices::new();
    let crl = Crl::decode(&services, CrlKind::ENCODING, &encoded)?;

    if let Some(path) = config.check.as_deref() {
        let certificate = read_encoded(Some(path))?;
        return match crl.find_certificate(&certificate) {
            Ok(entry) => {
                println!(
                    "Revoked: serial {} on {}",
                    hex(&services, &entry.serial)?,
                    format_date(&entry.revocation_date)
                );
                Ok(())
            }
            Err(cryptowrappers::Error::NotFound(_)) => {
                println!("Not revoked");
                Ok(())
            }
            Err(e) => Err(Error::from(e)),
        };
    }

    let info = crl.info()?;
    match config.output {
        OutputFormat::Text => {
            println!("Certificate Revocation List (CRL):");
            println!("    Version: {} (0x{:x})", info.version + 1, info.version);
            println!("    Signature Algorithm: {}", info.signature_algorithm);
            println!("    Issuer: {}", info.issuer_name);
            println!("    Last Update: {}", format_date(&info.this_update));
            match &info.next_update {
                Some(next) => println!("    Next Update: {}", format_date(next)),
                None => println!("    Next Update: NONE"),
            }
            println!(
                "    SHA1 Fingerprint: {}",
                hex(&services, &crl.get::<Sha1Hash>()?)?
            );
            if !info.extensions.is_empty() {
                println!("    CRL extensions:");
                for extension in &info.extensions {
                    println!("        {}", format_extension(&services, extension));
                }
            }
            if info.entries.is_empty() {
                println!("No Revoked Certificates.");
            } else {
                println!("Revoked Certificates:");
                for entry in &info.entries {
                    println!("    Serial Number: {}", hex(&services, &entry.serial)?);
                    println!(
                        "        Revocation Date: {}",
                        format_date(&entry.revocation_date)
                    );
                    for extension in &entry.extensions {
                        println!("        {}", format_extension(&services, extension));
                    }
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&info)?;
            println!("{}", json);
        }
    }

    Ok(())
}
