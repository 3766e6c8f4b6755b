use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "slicebridge",
    about = "Slicebridge: mount keyed component slices into a shared store and inspect snapshots",
    version
)]
pub struct Cli {
    /// Log bridge activity (debug level) to stderr; RUST_LOG overrides
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bind a component kind from a bind file and create instances in a store
    Mount {
        /// Path to the TOML bind file (kind, settings, initialState)
        #[arg(long)]
        config: String,

        /// JSON snapshot to hydrate the store from before mounting
        #[arg(long)]
        snapshot: Option<String>,

        /// Instance key; repeat for several instances (default key when omitted)
        #[arg(long = "key")]
        keys: Vec<String>,

        /// Field write `field=json` applied to every instance; repeatable
        #[arg(long = "set")]
        sets: Vec<String>,

        /// Destroy every instance after the writes
        #[arg(long)]
        destroy: bool,

        /// Write the resulting store snapshot to this path
        #[arg(long)]
        out: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List component kinds and instance keys stored in a snapshot
    Inspect {
        /// Path to a JSON store snapshot
        #[arg(long)]
        snapshot: String,

        /// Bridge namespace to inspect
        #[arg(long, default_value = "bridge")]
        namespace: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
