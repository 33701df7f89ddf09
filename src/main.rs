//! # tareas - Clinical-Engineering Task CLI
//!
//! Terminal client for the hospital clinical-engineering task service. End
//! users file task requests through the web intake; this client lets
//! technicians work their area's queue, requesters track and close their own
//! requests, and supervision review everything without leaving the shell.
//!
//! ## Quick start
//!
//! ```bash
//! # a technician's queue
//! tareas list --area Electromedicina
//!
//! # record the first solution entry on a pending task
//! tareas complete 42 "replaced the SpO2 sensor" --actor "Ana Suárez" --area Electromedicina
//!
//! # the requester closes and rates it
//! tareas finalize 42 --user "Laura Méndez"
//! tareas rate 42 5 --user "Laura Méndez"
//!
//! # supervision
//! tareas list --everyone --all
//! tareas summary
//!
//! # record a guard round
//! tareas guard --staff-id 7 --service "Urgencias=all quiet" --service "Quirófano"
//! ```
//!
//! The service endpoint comes from `--api-url`, then `$TAREAS_API_URL`, then
//! the built-in default. Diagnostics go to stderr under `RUST_LOG`.
//!
//! All state lives in the remote service; this binary holds a per-invocation
//! snapshot only and never writes anything locally.

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod guard;
pub mod lifecycle;
pub mod query;
pub mod session;
pub mod store;
pub mod task;

use api::HttpApi;
use cli::Cli;
use cmd::*;
use config::ApiConfig;
use error::Result;

fn run(cli: Cli) -> Result<()> {
    let mut config = ApiConfig::resolve(cli.api_url);
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(std::time::Duration::from_secs(secs));
    }
    let api = HttpApi::new(config)?;

    match cli.command {
        Commands::List {
            scope,
            state,
            search,
            all,
            limit,
        } => cmd_list(&api, scope.to_session()?, state, search, all, limit),

        Commands::View { id, scope } => cmd_view(&api, scope.to_session()?, id),

        Commands::Complete {
            id,
            text,
            actor,
            area,
        } => cmd_complete(&api, id, &text, &actor, &area),

        Commands::Edit {
            id,
            text,
            actor,
            area,
        } => cmd_edit(&api, id, &text, &actor, &area),

        Commands::Reassign { id, area } => cmd_reassign(&api, id, &area),

        Commands::Finalize { id, user } => cmd_finalize(&api, id, &user),

        Commands::Rate { id, stars, user } => cmd_rate(&api, id, stars, &user),

        Commands::Note { id, text } => cmd_note(&api, id, &text),

        Commands::Areas => cmd_areas(&api),

        Commands::Summary => cmd_summary(&api),

        Commands::Guard { staff_id, services } => cmd_guard(&api, staff_id, services),

        Commands::Completions { .. } => unreachable!("completions handled before client setup"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Completions need no API client.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        if e.is_transient() {
            eprintln!("the service did not answer; the action can be retried");
        }
        std::process::exit(1);
    }
}
