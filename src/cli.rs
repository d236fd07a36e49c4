//! Command-line interface definition.
//!
//! The CLI carries only the mode switch and output verbosity. Endpoint and
//! credential configuration arrives via the process environment; see
//! [`crate::config::Settings::from_env`].

use clap::Parser;

/// Sync declaratively-authored Datadog dashboards and screenboards from
/// YAML files to the remote API.
#[derive(Parser, Debug)]
#[command(name = "boardsync", version, about)]
pub struct Cli {
    /// Validate every document against the API (create then delete each
    /// board) instead of applying changes.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
