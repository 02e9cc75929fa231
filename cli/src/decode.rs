use std::io::{self, Write};

use certsvc::{MemoryServices, StringFormat};
use clap::Args;
use tracing::info;

use crate::encode::TextEncoding;
use crate::error::Result;
use crate::utils::read_input;

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the text input. If not specified, reads from stdin
    file: Option<String>,

    /// Text encoding to accept
    #[arg(short, long, value_enum, default_value = "any")]
    format: TextEncoding,

    /// Reject whitespace other than line breaks inside the encoded text
    #[arg(long)]
    strict: bool,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let text = String::from_utf8(read_input(config.file.as_deref())?)?;

    let flags = if config.strict { StringFormat::STRICT } else { 0 };
    let format = StringFormat::new(config.format.into()).with_flags(flags);

    let services = MemoryServices::new();
    let decoded = cryptowrappers::text_to_binary(&services, &text, format)?;
    info!(
        detected = ?decoded.detected,
        skipped = decoded.skipped,
        len = decoded.bytes.len(),
        "decoded input"
    );

    let mut stdout = io::stdout().lock();
    stdout.write_all(&decoded.bytes)?;
    stdout.flush()?;
    Ok(())
}
