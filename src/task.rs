//! Task entity and the append-log history model.
//!
//! `Task` mirrors the service's wire record: field names on the wire are the
//! backend's Spanish column names, mapped here to English via serde renames.
//! The `solucion` and `observacion` columns are newline-joined history logs
//! with embedded timestamps; `LogEntry` gives them structure on the client
//! side while preserving the on-wire text byte-for-byte.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::TaskState;

/// A unit of requested work, as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    /// Free-text description of the problem.
    #[serde(rename = "tarea")]
    pub description: String,
    /// Name of the user who filed the request.
    #[serde(rename = "usuario")]
    pub requester: String,
    /// Routing area the request is queued under.
    pub area: String,
    /// Hospital service the request originates from.
    #[serde(rename = "servicio")]
    pub service: String,
    #[serde(rename = "subservicio", default)]
    pub subservice: Option<String>,
    /// Optional base64-encoded photo attachment.
    #[serde(rename = "imagen", default)]
    pub photo: Option<String>,
    /// Creation timestamp, assigned by the service.
    #[serde(rename = "fecha")]
    pub created_at: DateTime<Utc>,
    /// Newline-joined log of technician actions. Empty or absent means no
    /// work has been recorded yet.
    #[serde(rename = "solucion", default)]
    pub solution: Option<String>,
    /// Staff member who wrote the last solution entry.
    #[serde(rename = "asignado", default)]
    pub assignee: Option<String>,
    /// Timestamp of the last solution write.
    #[serde(rename = "fecha_comp", default)]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Terminal flag, set by the requester. Backed by a tinyint column, so
    /// 0/1 integers are accepted alongside booleans.
    #[serde(rename = "fin", default, deserialize_with = "flag_from_any")]
    pub finished: bool,
    /// Supervision notes, same append-log convention as `solution`.
    #[serde(rename = "observacion", default)]
    pub observation: Option<String>,
    /// 1-5, set once by the requester after finalization.
    #[serde(rename = "calificacion", default)]
    pub rating: Option<u8>,
}

impl Task {
    /// Derived lifecycle state. `finished` wins even when no solution was
    /// ever recorded, so the three classes never overlap.
    pub fn state(&self) -> TaskState {
        if self.finished {
            TaskState::Finalized
        } else if self.has_solution() {
            TaskState::InProcess
        } else {
            TaskState::Pending
        }
    }

    /// True when at least one solution entry has been recorded.
    pub fn has_solution(&self) -> bool {
        self.solution
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// Every textual field joined for free-text search. The photo payload is
    /// excluded: base64 matches almost any term.
    pub fn haystack(&self) -> String {
        let mut parts: Vec<String> = vec![
            self.id.to_string(),
            self.description.clone(),
            self.requester.clone(),
            self.area.clone(),
            self.service.clone(),
            self.created_at.to_rfc3339(),
        ];
        for field in [
            &self.subservice,
            &self.solution,
            &self.assignee,
            &self.observation,
        ] {
            if let Some(value) = field {
                parts.push(value.clone());
            }
        }
        if let Some(resolved) = self.resolved_at {
            parts.push(resolved.to_rfc3339());
        }
        if let Some(rating) = self.rating {
            parts.push(rating.to_string());
        }
        parts.join(" ")
    }
}

/// A routing bucket for staff and tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: u64,
    #[serde(rename = "nombre")]
    pub name: String,
}

/// Timestamp prefix format used inside history-log lines.
pub const LOG_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One entry of a `solution`/`observation` history log.
///
/// Well-formed lines look like `[2026-03-01 09:15] Ana: replaced the fuse`.
/// Lines that predate this client or were typed free-form parse as text-only
/// entries and are written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: Option<NaiveDateTime>,
    pub author: Option<String>,
    pub text: String,
}

impl LogEntry {
    pub fn new(author: &str, text: &str, at: NaiveDateTime) -> Self {
        LogEntry {
            timestamp: Some(at),
            author: Some(author.to_string()),
            text: text.to_string(),
        }
    }

    /// Render as a single on-wire line.
    pub fn to_line(&self) -> String {
        match (&self.timestamp, &self.author) {
            (Some(ts), Some(author)) => {
                format!("[{}] {}: {}", ts.format(LOG_STAMP_FORMAT), author, self.text)
            }
            (Some(ts), None) => format!("[{}] {}", ts.format(LOG_STAMP_FORMAT), self.text),
            _ => self.text.clone(),
        }
    }

    /// Parse one line, falling back to a text-only entry on any mismatch.
    pub fn parse_line(line: &str) -> Self {
        if let Some(rest) = line.strip_prefix('[') {
            if let Some((stamp, tail)) = rest.split_once("] ") {
                if let Ok(ts) = NaiveDateTime::parse_from_str(stamp, LOG_STAMP_FORMAT) {
                    if let Some((author, text)) = tail.split_once(": ") {
                        return LogEntry {
                            timestamp: Some(ts),
                            author: Some(author.to_string()),
                            text: text.to_string(),
                        };
                    }
                    return LogEntry {
                        timestamp: Some(ts),
                        author: None,
                        text: tail.to_string(),
                    };
                }
            }
        }
        LogEntry {
            timestamp: None,
            author: None,
            text: line.to_string(),
        }
    }
}

/// Parse a newline-joined history field into ordered entries.
pub fn parse_log(field: &str) -> Vec<LogEntry> {
    field
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(LogEntry::parse_line)
        .collect()
}

/// Append an entry to a history field, preserving existing content exactly.
pub fn append_log(existing: Option<&str>, entry: &LogEntry) -> String {
    match existing.filter(|s| !s.trim().is_empty()) {
        Some(prev) => format!("{}\n{}", prev, entry.to_line()),
        None => entry.to_line(),
    }
}

fn flag_from_any<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Bool(b)) => b,
        Some(Raw::Int(n)) => n != 0,
        None => false,
    })
}

#[cfg(test)]
impl Task {
    /// Minimal pending task for tests.
    pub(crate) fn sample(id: u64, area: &str) -> Self {
        use chrono::TimeZone;
        Task {
            id,
            description: format!("equipo {id} fuera de servicio"),
            requester: "Laura Méndez".to_string(),
            area: area.to_string(),
            service: "Urgencias".to_string(),
            subservice: None,
            photo: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
                + chrono::Duration::minutes(id as i64),
            solution: None,
            assignee: None,
            resolved_at: None,
            finished: false,
            observation: None,
            rating: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn state_derivation() {
        let mut t = Task::sample(1, "Electromedicina");
        assert_eq!(t.state(), TaskState::Pending);

        t.solution = Some("   \n".to_string());
        assert_eq!(t.state(), TaskState::Pending);

        t.solution = Some("[2026-03-01 09:15] Ana: replaced the fuse".to_string());
        assert_eq!(t.state(), TaskState::InProcess);

        t.finished = true;
        assert_eq!(t.state(), TaskState::Finalized);

        // finished wins even when the server let an untouched task through
        t.solution = None;
        assert_eq!(t.state(), TaskState::Finalized);
    }

    #[test]
    fn finished_flag_accepts_tinyint() {
        let json = r#"{"id":7,"tarea":"x","usuario":"u","area":"a","servicio":"s",
                       "fecha":"2026-03-01T08:00:00Z","fin":1}"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert!(t.finished);

        let json = r#"{"id":7,"tarea":"x","usuario":"u","area":"a","servicio":"s",
                       "fecha":"2026-03-01T08:00:00Z","fin":false,"solucion":null}"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert!(!t.finished);
        assert!(t.solution.is_none());
    }

    #[test]
    fn log_line_round_trip() {
        let entry = LogEntry::new("Ana Suárez", "replaced the power supply", stamp(9, 15));
        let line = entry.to_line();
        assert_eq!(line, "[2026-03-01 09:15] Ana Suárez: replaced the power supply");
        assert_eq!(LogEntry::parse_line(&line), entry);
    }

    #[test]
    fn legacy_free_text_is_preserved() {
        let field = "se cambio el cable\n[2026-03-01 10:00] Ana: tested OK";
        let entries = parse_log(field);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, None);
        assert_eq!(entries[0].text, "se cambio el cable");
        assert_eq!(entries[1].author.as_deref(), Some("Ana"));

        // appending must not reformat the legacy first line
        let appended = append_log(Some(field), &LogEntry::new("Luis", "signed off", stamp(11, 30)));
        assert!(appended.starts_with("se cambio el cable\n"));
        assert!(appended.ends_with("[2026-03-01 11:30] Luis: signed off"));
    }

    #[test]
    fn append_to_empty_field_writes_single_line() {
        let entry = LogEntry::new("Ana", "first visit", stamp(8, 5));
        assert_eq!(append_log(None, &entry), entry.to_line());
        assert_eq!(append_log(Some("  "), &entry), entry.to_line());
    }
}
