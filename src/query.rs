//! Pure derivations over a task snapshot.
//!
//! Nothing here talks to the service or mutates the store: every function
//! takes a slice and derives a view. The CLI layer decides what to print.

use std::collections::BTreeMap;

use chrono::Duration;

use crate::fields::TaskState;
use crate::task::Task;

/// Three-way partition of a snapshot. Every task lands in exactly one
/// bucket, matching its derived state.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub pending: Vec<&'a Task>,
    pub in_process: Vec<&'a Task>,
    pub finalized: Vec<&'a Task>,
}

pub fn classify(tasks: &[Task]) -> Classified<'_> {
    let mut classified = Classified::default();
    for task in tasks {
        match task.state() {
            TaskState::Pending => classified.pending.push(task),
            TaskState::InProcess => classified.in_process.push(task),
            TaskState::Finalized => classified.finalized.push(task),
        }
    }
    classified
}

/// Case-insensitive substring match over every textual field. An empty or
/// whitespace term returns the full snapshot in original order.
pub fn search<'a>(tasks: &'a [Task], term: &str) -> Vec<&'a Task> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return tasks.iter().collect();
    }
    tasks
        .iter()
        .filter(|t| t.haystack().to_lowercase().contains(&term))
        .collect()
}

/// Listing order: most recent first, newest id breaking ties.
pub fn sort_recent_first(tasks: &mut [&Task]) {
    tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

/// Per-area workload and resolution figures, the data behind the
/// supervision panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaSummary {
    pub area: String,
    pub pending: usize,
    pub in_process: usize,
    pub finalized: usize,
    /// Mean creation-to-resolution time of finalized tasks; absent when the
    /// area has none with a recorded resolution timestamp.
    pub mean_resolution: Option<Duration>,
}

pub fn area_summary(tasks: &[Task]) -> Vec<AreaSummary> {
    let mut by_area: BTreeMap<&str, (usize, usize, usize, Vec<Duration>)> = BTreeMap::new();
    for task in tasks {
        let entry = by_area.entry(task.area.as_str()).or_default();
        match task.state() {
            TaskState::Pending => entry.0 += 1,
            TaskState::InProcess => entry.1 += 1,
            TaskState::Finalized => entry.2 += 1,
        }
        if task.finished {
            if let Some(resolved) = task.resolved_at {
                entry.3.push(resolved - task.created_at);
            }
        }
    }
    by_area
        .into_iter()
        .map(|(area, (pending, in_process, finalized, durations))| AreaSummary {
            area: area.to_string(),
            pending,
            in_process,
            finalized,
            mean_resolution: mean(&durations),
        })
        .collect()
}

fn mean(durations: &[Duration]) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }
    let total: i64 = durations.iter().map(Duration::num_seconds).sum();
    Some(Duration::seconds(total / durations.len() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Vec<Task> {
        let mut pending = Task::sample(1, "Electromedicina");
        pending.description = "Monitor URGENTE sin señal".to_string();

        let mut in_process = Task::sample(2, "Electromedicina");
        in_process.solution = Some("[2026-03-01 09:00] Ana: ordered the part".to_string());
        in_process.assignee = Some("Ana Suárez".to_string());

        let mut finalized = Task::sample(3, "Informática");
        finalized.solution = Some("[2026-03-01 10:00] Luis: reinstalled driver".to_string());
        finalized.resolved_at = Some(finalized.created_at + Duration::hours(4));
        finalized.finished = true;

        // server-side data glitch: finished without any solution text
        let mut glitch = Task::sample(4, "Informática");
        glitch.finished = true;

        vec![pending, in_process, finalized, glitch]
    }

    #[test]
    fn classify_partitions_exactly() {
        let tasks = snapshot();
        let classified = classify(&tasks);
        assert_eq!(
            classified.pending.len() + classified.in_process.len() + classified.finalized.len(),
            tasks.len()
        );
        let finalized_ids: Vec<u64> = classified.finalized.iter().map(|t| t.id).collect();
        assert_eq!(finalized_ids, vec![3, 4]);
        for task in &tasks {
            assert_eq!(finalized_ids.contains(&task.id), task.finished);
        }
    }

    #[test]
    fn classify_is_idempotent() {
        let tasks = snapshot();
        let first: Vec<u64> = classify(&tasks).pending.iter().map(|t| t.id).collect();
        let second: Vec<u64> = classify(&tasks).pending.iter().map(|t| t.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_term_returns_everything_in_order() {
        let tasks = snapshot();
        let hits = search(&tasks, "");
        assert_eq!(hits.len(), tasks.len());
        let ids: Vec<u64> = hits.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let tasks = snapshot();
        let hits = search(&tasks, "urgente");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
        assert_eq!(search(&tasks, "URGENTE").len(), 1);
    }

    #[test]
    fn search_covers_solution_text() {
        let tasks = snapshot();
        let hits = search(&tasks, "ordered the part");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn recent_first_ordering() {
        let tasks = snapshot();
        let mut rows: Vec<&Task> = tasks.iter().collect();
        sort_recent_first(&mut rows);
        let ids: Vec<u64> = rows.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn summary_counts_and_mean() {
        let tasks = snapshot();
        let summary = area_summary(&tasks);
        assert_eq!(summary.len(), 2);

        let electro = &summary[0];
        assert_eq!(electro.area, "Electromedicina");
        assert_eq!((electro.pending, electro.in_process, electro.finalized), (1, 1, 0));
        assert_eq!(electro.mean_resolution, None);

        let info = &summary[1];
        assert_eq!(info.area, "Informática");
        assert_eq!((info.pending, info.in_process, info.finalized), (0, 0, 2));
        assert_eq!(info.mean_resolution, Some(Duration::hours(4)));
    }
}
