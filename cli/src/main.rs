use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod crl;
mod ctl;
mod decode;
mod encode;
mod error;
mod format;
mod output;
mod utils;

use error::Result;

use crl::CrlCommands;
use ctl::CtlCommands;

#[derive(Parser)]
#[command(name = "cryptowrap")]
#[command(about = "Certificate revocation and trust list toolkit", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode binary data as text
    Encode {
        #[command(flatten)]
        config: encode::Config,
    },
    /// Decode text into binary data
    Decode {
        #[command(flatten)]
        config: decode::Config,
    },
    /// Render an encoded structure as display text
    Format {
        #[command(flatten)]
        config: format::Config,
    },
    /// Certificate revocation list operations
    Crl {
        #[command(subcommand)]
        command: CrlCommands,
    },
    /// Certificate trust list operations
    Ctl {
        #[command(subcommand)]
        command: CtlCommands,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Encode { config } => {
            encode::execute(config)?;
        }
        Commands::Decode { config } => {
            decode::execute(config)?;
        }
        Commands::Format { config } => {
            format::execute(config)?;
        }
        Commands::Crl { command } => match command {
            CrlCommands::Inspect { config } => {
                crl::inspect::execute(config)?;
            }
        },
        Commands::Ctl { command } => match command {
            CtlCommands::Inspect { config } => {
                ctl::inspect::execute(config)?;
            }
        },
    }

    Ok(())
}
