//! Task lifecycle commands.
//!
//! Each command validates against the local snapshot, issues exactly one
//! remote write, and reconciles the store only after the service confirmed
//! it. There are no optimistic updates and no automatic retries; a failed
//! write leaves the snapshot at its last known good state.
//!
//! Transitions: pending tasks take their first solution entry via
//! [`complete`]; in-process tasks grow further entries via [`edit_solution`]
//! and are closed by the requester via [`finalize`]; finalized tasks take a
//! single rating via [`rate`]. Solution history is append-only: editing
//! never rewrites earlier entries.

use chrono::{Local, Utc};

use crate::api::{SolutionUpdate, TaskApi};
use crate::error::{Error, Result};
use crate::fields::TaskState;
use crate::session::Session;
use crate::store::{TaskPatch, TaskStore};
use crate::task::{append_log, LogEntry};

/// Author stamped on observation entries; the supervision panel is shared
/// and has no per-person identity.
const SUPERVISION_AUTHOR: &str = "supervisión";

/// Record the first solution entry on a pending task.
pub fn complete(
    api: &dyn TaskApi,
    store: &mut TaskStore,
    id: u64,
    text: &str,
    actor: &str,
) -> Result<()> {
    if let Some(task) = store.get(id) {
        match task.state() {
            TaskState::Pending => {}
            TaskState::InProcess => {
                return Err(Error::Validation(format!(
                    "task {id} already has a solution in progress; use edit to add to it"
                )))
            }
            TaskState::Finalized => {
                return Err(Error::Validation(format!("task {id} is finalized")))
            }
        }
    }
    write_solution(api, store, id, text, actor)
}

/// Append a further solution entry to an in-process task.
pub fn edit_solution(
    api: &dyn TaskApi,
    store: &mut TaskStore,
    id: u64,
    text: &str,
    actor: &str,
) -> Result<()> {
    if let Some(task) = store.get(id) {
        match task.state() {
            TaskState::InProcess => {}
            TaskState::Pending => {
                return Err(Error::Validation(format!(
                    "task {id} has no solution yet; use complete for the first entry"
                )))
            }
            TaskState::Finalized => {
                return Err(Error::Validation(format!("task {id} is finalized")))
            }
        }
    }
    write_solution(api, store, id, text, actor)
}

/// The requester marks their task finished. Refused while no solution has
/// been recorded: the service does not enforce this, so the client must.
pub fn finalize(api: &dyn TaskApi, store: &mut TaskStore, id: u64) -> Result<()> {
    if let Some(task) = store.get(id) {
        if task.finished {
            return Err(Error::Validation(format!("task {id} is already finalized")));
        }
        if !task.has_solution() {
            return Err(Error::Validation(format!(
                "task {id} has no recorded solution and cannot be finalized"
            )));
        }
    }
    api.put_finished(id)?;
    store.replace(
        id,
        TaskPatch {
            finished: Some(true),
            ..Default::default()
        },
    );
    Ok(())
}

/// Rate a finalized task, 1-5, once.
pub fn rate(api: &dyn TaskApi, store: &mut TaskStore, id: u64, stars: u8) -> Result<()> {
    if !(1..=5).contains(&stars) {
        return Err(Error::Validation(format!(
            "rating must be between 1 and 5, got {stars}"
        )));
    }
    if let Some(task) = store.get(id) {
        if task.state() != TaskState::Finalized {
            return Err(Error::Validation(format!(
                "task {id} is not finalized yet and cannot be rated"
            )));
        }
        if task.rating.is_some() {
            return Err(Error::Validation(format!("task {id} is already rated")));
        }
    }
    api.put_rating(id, stars)?;
    store.replace(
        id,
        TaskPatch {
            rating: Some(stars),
            ..Default::default()
        },
    );
    Ok(())
}

/// Append a supervision observation. Only the supervision viewpoint may
/// write these.
pub fn annotate(
    api: &dyn TaskApi,
    store: &mut TaskStore,
    session: &Session,
    id: u64,
    text: &str,
) -> Result<()> {
    if *session != Session::Supervisor {
        return Err(Error::Validation(
            "only the supervision panel may add observations".to_string(),
        ));
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Validation("observation text must not be empty".to_string()));
    }
    let entry = LogEntry::new(SUPERVISION_AUTHOR, text, Local::now().naive_local());
    let observation = append_log(store.get(id).and_then(|t| t.observation.as_deref()), &entry);
    api.put_observation(id, &observation)?;
    store.replace(
        id,
        TaskPatch {
            observation: Some(observation),
            ..Default::default()
        },
    );
    Ok(())
}

/// The service has no reassignment endpoint. Kept explicit so callers
/// surface the gap instead of guessing at semantics.
pub fn reassign(_api: &dyn TaskApi, _store: &mut TaskStore, _id: u64, _area: &str) -> Result<()> {
    Err(Error::Unsupported("task reassignment"))
}

fn write_solution(
    api: &dyn TaskApi,
    store: &mut TaskStore,
    id: u64,
    text: &str,
    actor: &str,
) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Validation("solution text must not be empty".to_string()));
    }
    let actor = actor.trim();
    if actor.is_empty() {
        return Err(Error::Validation("actor name must not be empty".to_string()));
    }

    let entry = LogEntry::new(actor, text, Local::now().naive_local());
    let solution = append_log(store.get(id).and_then(|t| t.solution.as_deref()), &entry);
    let now = Utc::now();
    api.put_solution(
        id,
        &SolutionUpdate {
            solucion: solution.clone(),
            asignado: actor.to_string(),
            fecha_comp: Some(now),
        },
    )?;
    store.replace(
        id,
        TaskPatch {
            solution: Some(solution),
            assignee: Some(actor.to_string()),
            resolved_at: Some(now),
            ..Default::default()
        },
    );
    Ok(())
}
