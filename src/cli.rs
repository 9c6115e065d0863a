//! CLI struct definitions for the `curator` binary.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "curator",
    version = env!("CARGO_PKG_VERSION"),
    about = "Keep the catalog store converged on the canonical category and achievement definition."
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./curator.toml when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// SQLite database path; overrides CURATOR_DB and the config file.
    #[clap(long, global = true)]
    pub db: Option<PathBuf>,
    /// Output format: 'text' or 'json'.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    /// Log per-entity decisions (RUST_LOG takes precedence).
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run one reconciliation pass against the store.
    Ensure,
    /// Check that every canonical key exists, without writing.
    Verify,
    /// Show active categories with their item counts.
    Stats,
    /// Verify, reconcile if needed, and retry with backoff until settled.
    Session,
    /// Print the canonical definition with its version and fingerprint.
    Definition,
}
