use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Task and notification desk for the HR portal.
/// State lives in ~/.hrdesk, $HRDESK_HOME, or the directory passed via --data-dir.
#[derive(Parser)]
#[command(name = "hrd", version, about = "HR portal tasks and notifications")]
pub struct Cli {
    /// Directory holding the portal's JSON state and config.toml.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
