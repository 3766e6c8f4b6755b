//! Slicebridge CLI: the `slicebridge` command.

mod bindfile;
mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_tracing(cli.verbose);

    match cli.command {
        Commands::Mount {
            config,
            snapshot,
            keys,
            sets,
            destroy,
            out,
            json,
        } => commands::mount::run(commands::mount::Args {
            config,
            snapshot,
            keys,
            sets,
            destroy,
            out,
            json,
        }),

        Commands::Inspect {
            snapshot,
            namespace,
            json,
        } => commands::inspect::run(snapshot, namespace, json),
    }
}
