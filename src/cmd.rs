//! Command handlers for the CLI interface.
//!
//! Each handler is a thin caller over the lifecycle core: build a scoped
//! store, load it, run one command or derive one view, print the outcome.
//! All remote interaction goes through the injected `TaskApi`.

use std::io;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::api::TaskApi;
use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::fields::TaskState;
use crate::guard::GuardRound;
use crate::lifecycle;
use crate::query;
use crate::session::Session;
use crate::store::TaskStore;
use crate::task::{parse_log, Task};

#[derive(Subcommand)]
pub enum Commands {
    /// List tasks for one viewpoint, with filters.
    List {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Keep only one lifecycle state.
        #[arg(long, value_enum)]
        state: Option<TaskState>,
        /// Case-insensitive free-text search; wins over --state when given.
        #[arg(long)]
        search: Option<String>,
        /// Include finalized tasks (hidden by default).
        #[arg(long)]
        all: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one task in full, history included.
    View {
        /// Task ID.
        id: u64,
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Record the first solution entry on a pending task.
    Complete {
        /// Task ID.
        id: u64,
        /// What was done.
        text: String,
        /// Technician recording the work.
        #[arg(long)]
        actor: String,
        /// The technician's area.
        #[arg(long)]
        area: String,
    },

    /// Append a further solution entry to an in-process task.
    Edit {
        /// Task ID.
        id: u64,
        /// What was done since the last entry.
        text: String,
        /// Technician recording the work.
        #[arg(long)]
        actor: String,
        /// The technician's area.
        #[arg(long)]
        area: String,
    },

    /// Move an in-process task to another area's queue.
    Reassign {
        /// Task ID.
        id: u64,
        /// Target area.
        area: String,
    },

    /// Mark your own request as finished.
    Finalize {
        /// Task ID.
        id: u64,
        /// Requesting user the task belongs to.
        #[arg(long)]
        user: String,
    },

    /// Rate a finalized request, 1-5.
    Rate {
        /// Task ID.
        id: u64,
        /// Stars, 1-5.
        stars: u8,
        /// Requesting user the task belongs to.
        #[arg(long)]
        user: String,
    },

    /// Append a supervision observation to a task.
    Note {
        /// Task ID.
        id: u64,
        /// Observation text.
        text: String,
    },

    /// List the routing areas.
    Areas,

    /// Per-area counts and mean resolution time.
    Summary,

    /// Record a guard round. Repeat --service "NAME" or --service "NAME=note".
    Guard {
        /// Staff member id the visits are recorded under.
        #[arg(long)]
        staff_id: u64,
        /// Visited service, optionally with "=note" appended.
        #[arg(long = "service")]
        services: Vec<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Which viewpoint a read command runs under. Exactly one must be given.
#[derive(Args)]
pub struct ScopeArgs {
    /// One routing area's queue (technician viewpoint).
    #[arg(long, conflicts_with_all = ["user", "everyone"])]
    pub area: Option<String>,
    /// One user's own requests (requester viewpoint).
    #[arg(long, conflicts_with = "everyone")]
    pub user: Option<String>,
    /// Every task (supervision viewpoint).
    #[arg(long)]
    pub everyone: bool,
}

impl ScopeArgs {
    pub fn to_session(&self) -> Result<Session> {
        match (&self.area, &self.user, self.everyone) {
            (Some(area), None, false) => Ok(Session::staff(area)),
            (None, Some(user), false) => Ok(Session::requester(user)),
            (None, None, true) => Ok(Session::Supervisor),
            _ => Err(Error::Validation(
                "pick one viewpoint: --area NAME, --user NAME or --everyone".to_string(),
            )),
        }
    }
}

/// List tasks under one viewpoint with optional filtering.
pub fn cmd_list(
    api: &dyn TaskApi,
    session: Session,
    state: Option<TaskState>,
    search: Option<String>,
    all: bool,
    limit: Option<usize>,
) -> Result<()> {
    let mut store = TaskStore::new(session);
    store.load(api)?;
    println!("{}", store.session().describe());

    // free-text search wins over the state filter
    if let Some(term) = search.as_deref().filter(|t| !t.trim().is_empty()) {
        let mut rows = query::search(store.tasks(), term);
        query::sort_recent_first(&mut rows);
        println!("{} match(es) for \"{term}\"", rows.len());
        if let Some(n) = limit {
            rows.truncate(n);
        }
        print_table(&rows);
        return Ok(());
    }

    let classified = query::classify(store.tasks());
    let sections: Vec<(&str, Vec<&Task>)> = match state {
        Some(TaskState::Pending) => vec![("Pending", classified.pending)],
        Some(TaskState::InProcess) => vec![("In process", classified.in_process)],
        Some(TaskState::Finalized) => vec![("Finalized", classified.finalized)],
        // default view: pending and in-process sections; finalized only on --all
        None if all => vec![
            ("Pending", classified.pending),
            ("In process", classified.in_process),
            ("Finalized", classified.finalized),
        ],
        None => vec![
            ("Pending", classified.pending),
            ("In process", classified.in_process),
        ],
    };

    for (label, mut rows) in sections {
        query::sort_recent_first(&mut rows);
        println!();
        println!("{label} ({})", rows.len());
        if let Some(n) = limit {
            rows.truncate(n);
        }
        print_table(&rows);
    }
    Ok(())
}

/// Show a single task with its parsed history logs.
pub fn cmd_view(api: &dyn TaskApi, session: Session, id: u64) -> Result<()> {
    let mut store = TaskStore::new(session);
    store.load(api)?;
    let task = store
        .get(id)
        .ok_or_else(|| Error::Validation(format!("task {id} is not visible in this view")))?;

    println!("Task {} — {}", task.id, format_state(task.state()));
    println!("Created:   {}", format_datetime(&task.created_at));
    println!("Area:      {}", task.area);
    match &task.subservice {
        Some(sub) => println!("Service:   {} / {}", task.service, sub),
        None => println!("Service:   {}", task.service),
    }
    println!("Requester: {}", task.requester);
    if let Some(assignee) = &task.assignee {
        match &task.resolved_at {
            Some(at) => println!("Assigned:  {} (last entry {})", assignee, format_datetime(at)),
            None => println!("Assigned:  {assignee}"),
        }
    }
    if let Some(rating) = task.rating {
        println!("Rating:    {rating}/5");
    }
    if task.photo.is_some() {
        println!("Photo:     attached");
    }
    println!();
    println!("{}", task.description);

    if let Some(solution) = task.solution.as_deref().filter(|s| !s.trim().is_empty()) {
        println!();
        println!("Solution log:");
        for entry in parse_log(solution) {
            println!("  {}", entry.to_line());
        }
    }
    if let Some(observation) = task.observation.as_deref().filter(|s| !s.trim().is_empty()) {
        println!();
        println!("Observations:");
        for entry in parse_log(observation) {
            println!("  {}", entry.to_line());
        }
    }
    Ok(())
}

/// Record the first solution entry on a pending task.
pub fn cmd_complete(api: &dyn TaskApi, id: u64, text: &str, actor: &str, area: &str) -> Result<()> {
    let mut store = TaskStore::new(Session::staff(area));
    store.load(api)?;
    lifecycle::complete(api, &mut store, id, text, actor)?;
    println!("Recorded solution on task {id}");
    Ok(())
}

/// Append a further solution entry to an in-process task.
pub fn cmd_edit(api: &dyn TaskApi, id: u64, text: &str, actor: &str, area: &str) -> Result<()> {
    let mut store = TaskStore::new(Session::staff(area));
    store.load(api)?;
    lifecycle::edit_solution(api, &mut store, id, text, actor)?;
    println!("Appended solution entry to task {id}");
    Ok(())
}

pub fn cmd_reassign(api: &dyn TaskApi, id: u64, area: &str) -> Result<()> {
    let mut store = TaskStore::new(Session::Supervisor);
    store.load(api)?;
    lifecycle::reassign(api, &mut store, id, area)
}

pub fn cmd_finalize(api: &dyn TaskApi, id: u64, user: &str) -> Result<()> {
    let mut store = TaskStore::new(Session::requester(user));
    store.load(api)?;
    lifecycle::finalize(api, &mut store, id)?;
    println!("Task {id} finalized");
    Ok(())
}

pub fn cmd_rate(api: &dyn TaskApi, id: u64, stars: u8, user: &str) -> Result<()> {
    let mut store = TaskStore::new(Session::requester(user));
    store.load(api)?;
    lifecycle::rate(api, &mut store, id, stars)?;
    println!("Task {id} rated {stars}/5");
    Ok(())
}

pub fn cmd_note(api: &dyn TaskApi, id: u64, text: &str) -> Result<()> {
    let mut store = TaskStore::new(Session::Supervisor);
    store.load(api)?;
    lifecycle::annotate(api, &mut store, &Session::Supervisor, id, text)?;
    println!("Observation added to task {id}");
    Ok(())
}

/// List the routing areas.
pub fn cmd_areas(api: &dyn TaskApi) -> Result<()> {
    let areas = api.areas()?;
    println!("{:<5} {}", "ID", "Area");
    for area in areas {
        println!("{:<5} {}", area.id, area.name);
    }
    Ok(())
}

/// Supervision analytics: per-area counts and mean resolution time.
pub fn cmd_summary(api: &dyn TaskApi) -> Result<()> {
    let mut store = TaskStore::new(Session::Supervisor);
    store.load(api)?;
    let rows = query::area_summary(store.tasks());

    println!(
        "{:<22} {:>8} {:>11} {:>10} {:>16}",
        "Area", "Pending", "In process", "Finalized", "Mean resolution"
    );
    for row in rows {
        println!(
            "{:<22} {:>8} {:>11} {:>10} {:>16}",
            truncate(&row.area, 22),
            row.pending,
            row.in_process,
            row.finalized,
            format_mean(row.mean_resolution)
        );
    }
    Ok(())
}

/// Build a guard round from repeated --service flags and submit it.
pub fn cmd_guard(api: &dyn TaskApi, staff_id: u64, services: Vec<String>) -> Result<()> {
    let mut round = GuardRound::new();
    for spec in &services {
        let (name, note) = parse_service_spec(spec);
        round.toggle(name, true)?;
        if let Some(note) = note {
            round.set_note(name, note)?;
        }
    }

    let unvisited = round.visits().iter().filter(|v| !v.checked).count();
    let outcome = round.submit_all(api, staff_id)?;
    for service in &outcome.submitted {
        println!("recorded  {service}");
    }
    if let Some((service, err)) = outcome.failed {
        println!("FAILED    {service}");
        println!(
            "{} of the round's visits were persisted before the failure; re-run with the rest",
            outcome.submitted.len()
        );
        return Err(err);
    }
    println!(
        "guard round complete: {} visit(s) recorded, {unvisited} service(s) not visited",
        outcome.submitted.len()
    );
    Ok(())
}

/// Write a completion script for the given shell to stdout.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Split `"NAME=note"` into the service name and an optional non-empty note.
fn parse_service_spec(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once('=') {
        Some((name, note)) => {
            let note = note.trim();
            (name.trim(), (!note.is_empty()).then_some(note))
        }
        None => (spec.trim(), None),
    }
}

/// Print tasks in a fixed-width table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<6} {:<11} {:<17} {:<16} {:<16} {:<16} {}",
        "ID", "State", "Created", "Area", "Requester", "Assigned", "Description"
    );
    for task in tasks {
        println!(
            "{:<6} {:<11} {:<17} {:<16} {:<16} {:<16} {}",
            task.id,
            format_state(task.state()),
            format_datetime(&task.created_at),
            truncate(&task.area, 16),
            truncate(&task.requester, 16),
            truncate(task.assignee.as_deref().unwrap_or("-"), 16),
            truncate(&task.description, 48),
        );
    }
}

/// Format a task state for display.
pub fn format_state(state: TaskState) -> &'static str {
    match state {
        TaskState::Pending => "Pending",
        TaskState::InProcess => "In process",
        TaskState::Finalized => "Finalized",
    }
}

fn format_datetime(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn format_mean(mean: Option<Duration>) -> String {
    match mean {
        None => "-".to_string(),
        Some(d) if d.num_hours() >= 48 => {
            format!("{}d {}h", d.num_days(), d.num_hours() % 24)
        }
        Some(d) => format!("{}h {:02}m", d.num_hours(), d.num_minutes() % 60),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
