use clap::Parser;

use crate::cmd::Commands;

/// Terminal client for the clinical-engineering task service.
/// The endpoint defaults to $TAREAS_API_URL or the built-in URL.
#[derive(Parser)]
#[command(name = "tareas", version, about = "Clinical-engineering task intake and resolution CLI")]
pub struct Cli {
    /// Base URL of the task service API.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}
