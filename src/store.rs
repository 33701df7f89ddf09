//! Local snapshot of the remote task collection.
//!
//! The store owns the one in-memory copy of the tasks visible to the current
//! session. Reads come from the snapshot; every mutation is a reconciliation
//! applied only after the remote write was confirmed.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::api::TaskApi;
use crate::error::Result;
use crate::session::Session;
use crate::task::Task;

/// Scoped task snapshot. `load` replaces it wholesale on success and leaves
/// it untouched on failure, so a failed refresh never blanks the view.
#[derive(Debug)]
pub struct TaskStore {
    session: Session,
    tasks: Vec<Task>,
}

/// Fields a confirmed remote write may have changed. Applied by identity in
/// [`TaskStore::replace`].
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub solution: Option<String>,
    pub assignee: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub finished: Option<bool>,
    pub observation: Option<String>,
    pub rating: Option<u8>,
}

impl TaskStore {
    pub fn new(session: Session) -> Self {
        TaskStore {
            session,
            tasks: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Fetch the full scoped set from the service.
    pub fn load(&mut self, api: &dyn TaskApi) -> Result<&[Task]> {
        let fetched = match &self.session {
            Session::Staff { area } => api.tasks_by_area(area),
            Session::Requester { name } => api.tasks_by_user(name),
            Session::Supervisor => api.all_tasks(),
        }?;
        self.tasks = fetched;
        Ok(&self.tasks)
    }

    /// Apply a confirmed remote write to the local copy. A missing id is not
    /// an error: the write landed, and the next full load self-corrects.
    pub fn replace(&mut self, id: u64, patch: TaskPatch) {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            warn!(id, "confirmed write for a task outside the current snapshot");
            return;
        };
        if let Some(solution) = patch.solution {
            task.solution = Some(solution);
        }
        if let Some(assignee) = patch.assignee {
            task.assignee = Some(assignee);
        }
        if let Some(resolved_at) = patch.resolved_at {
            task.resolved_at = Some(resolved_at);
        }
        if let Some(finished) = patch.finished {
            task.finished = finished;
        }
        if let Some(observation) = patch.observation {
            task.observation = Some(observation);
        }
        if let Some(rating) = patch.rating {
            task.rating = Some(rating);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeApi};

    #[test]
    fn load_scopes_by_session() {
        let api = FakeApi::with_tasks(vec![
            Task::sample(1, "Electromedicina"),
            Task::sample(2, "Informática"),
        ]);

        let mut store = TaskStore::new(Session::staff("Electromedicina"));
        store.load(&api).unwrap();
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, 1);

        let mut store = TaskStore::new(Session::Supervisor);
        store.load(&api).unwrap();
        assert_eq!(store.tasks().len(), 2);

        assert_eq!(
            api.calls.borrow()[0],
            Call::TasksByArea("Electromedicina".to_string())
        );
        assert_eq!(api.calls.borrow()[1], Call::AllTasks);
    }

    #[test]
    fn failed_load_keeps_previous_snapshot() {
        let api = FakeApi::with_tasks(vec![Task::sample(1, "Electromedicina")]);
        let mut store = TaskStore::new(Session::staff("Electromedicina"));
        store.load(&api).unwrap();
        assert_eq!(store.tasks().len(), 1);

        api.fail_status.set(Some(500));
        let err = store.load(&api).unwrap_err();
        assert!(matches!(err, crate::error::Error::Server { status: 500 }));
        assert_eq!(store.tasks().len(), 1, "snapshot must survive a failed refresh");
    }

    #[test]
    fn replace_patches_only_the_matching_task() {
        let api = FakeApi::with_tasks(vec![
            Task::sample(1, "Electromedicina"),
            Task::sample(2, "Electromedicina"),
        ]);
        let mut store = TaskStore::new(Session::staff("Electromedicina"));
        store.load(&api).unwrap();

        let untouched = store.get(2).unwrap().clone();
        store.replace(
            1,
            TaskPatch {
                solution: Some("done".to_string()),
                assignee: Some("Ana".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(store.get(1).unwrap().solution.as_deref(), Some("done"));
        assert_eq!(store.get(2).unwrap(), &untouched);
    }

    #[test]
    fn replace_missing_id_is_a_no_op() {
        let api = FakeApi::with_tasks(vec![Task::sample(1, "Electromedicina")]);
        let mut store = TaskStore::new(Session::staff("Electromedicina"));
        store.load(&api).unwrap();

        let before = store.tasks().to_vec();
        store.replace(
            99,
            TaskPatch {
                finished: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(store.tasks(), &before[..]);
    }
}
