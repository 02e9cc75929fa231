pub(crate) mod inspect;

use clap::Subcommand;

#[derive(Subcommand)]
pub(crate) enum CtlCommands {
    /// Inspect and display a certificate trust list
    Inspect {
        #[command(flatten)]
        config: inspect::Config,
    },
}
