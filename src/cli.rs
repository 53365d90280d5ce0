use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "runledger")]
#[command(about = "Diagnostics ledger for automation runs", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $RUNLEDGER_CONFIG or config/runledger.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scripted plan through the ledger and print its snapshot as JSON
    Replay(ReplayArgs),
}

#[derive(clap::Args, Debug)]
pub struct ReplayArgs {
    /// TOML plan listing the jobs to replay
    pub plan: PathBuf,

    /// Mirror every recorded message to the console
    #[arg(long)]
    pub mirror: bool,
}
