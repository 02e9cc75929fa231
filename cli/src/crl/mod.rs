pub(crate) mod inspect;

use clap::Subcommand;

#[derive(Subcommand)]
pub(crate) enum CrlCommands {
    /// Inspect and display a certificate revocation list
    Inspect {
        #[command(flatten)]
        config: inspect::Config,
    },
}
