use certsvc::{EncodingType, FormatFlags, MemoryServices};
use clap::Args;

use crate::error::Result;
use crate::utils::read_encoded;

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the encoded structure (PEM or DER). If not specified, reads from stdin
    file: Option<String>,

    /// OID of the structure, e.g. 2.5.29.15 for key usage. Omit for a hex dump
    #[arg(short = 't', long)]
    struct_type: Option<String>,

    /// One item per line
    #[arg(short, long)]
    multi_line: bool,

    /// Omit the hex value after decoded bit names
    #[arg(long)]
    no_hex: bool,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let encoded = read_encoded(config.file.as_deref())?;

    let mut flags = FormatFlags::NONE;
    if config.multi_line {
        flags = flags | FormatFlags::MULTI_LINE;
    }
    if config.no_hex {
        flags = flags | FormatFlags::NO_HEX;
    }

    let services = MemoryServices::new();
    let text = cryptowrappers::format_object(
        &services,
        EncodingType::X509_ASN,
        flags,
        config.struct_type.as_deref(),
        &encoded,
    )?;

    if config.multi_line {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
    Ok(())
}
