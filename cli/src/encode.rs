use std::io::{self, Write};

use certsvc::{Encoding, MemoryServices, StringFormat};
use clap::Args;

use crate::error::Result;
use crate::utils::read_input;

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the binary input. If not specified, reads from stdin
    file: Option<String>,

    /// Text encoding to produce
    #[arg(short, long, value_enum, default_value = "base64-header")]
    format: TextEncoding,

    /// End lines with LF instead of CR LF
    #[arg(long)]
    no_cr: bool,

    /// Do not break lines (base64, base64-uri, hex-raw and binary only)
    #[arg(long, conflicts_with = "no_cr")]
    no_crlf: bool,
}

/// Text encodings selectable on the command line
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub(crate) enum TextEncoding {
    /// PEM armor with the CERTIFICATE label
    Base64Header,
    Base64,
    Binary,
    /// PEM armor with the NEW CERTIFICATE REQUEST label
    Base64RequestHeader,
    /// PEM armor with the X509 CRL label
    Base64CrlHeader,
    Base64Uri,
    Hex,
    HexAscii,
    HexAddr,
    HexAsciiAddr,
    HexRaw,
    /// Decode only: armored or bare base64
    Base64Any,
    /// Decode only: armored base64, bare base64 or binary
    Any,
    /// Decode only: any hex layout
    HexAny,
}

impl From<TextEncoding> for Encoding {
    fn from(encoding: TextEncoding) -> Self {
        match encoding {
            TextEncoding::Base64Header => Encoding::Base64Header,
            TextEncoding::Base64 => Encoding::Base64,
            TextEncoding::Binary => Encoding::Binary,
            TextEncoding::Base64RequestHeader => Encoding::Base64RequestHeader,
            TextEncoding::Base64CrlHeader => Encoding::Base64X509CrlHeader,
            TextEncoding::Base64Uri => Encoding::Base64Uri,
            TextEncoding::Hex => Encoding::Hex,
            TextEncoding::HexAscii => Encoding::HexAscii,
            TextEncoding::HexAddr => Encoding::HexAddr,
            TextEncoding::HexAsciiAddr => Encoding::HexAsciiAddr,
            TextEncoding::HexRaw => Encoding::HexRaw,
            TextEncoding::Base64Any => Encoding::Base64Any,
            TextEncoding::Any => Encoding::Any,
            TextEncoding::HexAny => Encoding::HexAny,
        }
    }
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let data = read_input(config.file.as_deref())?;

    let mut flags = 0;
    if config.no_cr {
        flags |= StringFormat::NOCR;
    }
    if config.no_crlf {
        flags |= StringFormat::NOCRLF;
    }
    let format = StringFormat::new(config.format.into()).with_flags(flags);

    let services = MemoryServices::new();
    let text = cryptowrappers::binary_to_text(&services, &data, format)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
