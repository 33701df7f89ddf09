//! Guard-round recorder.
//!
//! A round is a local checklist over the fixed service list: services are
//! ticked off as they are visited, optionally with a note, and the batch is
//! submitted at the end as one independent event per visit. Submission is
//! sequential and stops at the first failure; the report then states how
//! many visits were already persisted, and nothing is rolled back.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::api::{GuardVisitRecord, TaskApi};
use crate::error::{Error, Result};
use crate::fields::GUARD_SERVICES;

/// One stop of the round, local until submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardVisit {
    pub service: String,
    pub checked: bool,
    /// Stamped when the service is checked; cleared when unchecked.
    pub checked_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// In-memory checklist for one guard round.
#[derive(Debug)]
pub struct GuardRound {
    visits: Vec<GuardVisit>,
}

/// What `submit_all` managed to persist, in submission order. When `failed`
/// is set, every service after it was never attempted.
#[derive(Debug)]
pub struct GuardOutcome {
    pub submitted: Vec<String>,
    pub failed: Option<(String, Error)>,
}

impl Default for GuardRound {
    fn default() -> Self {
        Self::new()
    }
}

impl GuardRound {
    /// A fresh round over the fixed service list, nothing checked.
    pub fn new() -> Self {
        GuardRound {
            visits: GUARD_SERVICES
                .iter()
                .map(|service| GuardVisit {
                    service: (*service).to_string(),
                    checked: false,
                    checked_at: None,
                    note: None,
                })
                .collect(),
        }
    }

    pub fn visits(&self) -> &[GuardVisit] {
        &self.visits
    }

    /// Mark a service visited or not. Checking stamps the visit time;
    /// unchecking clears it.
    pub fn toggle(&mut self, service: &str, checked: bool) -> Result<()> {
        let visit = self.visit_mut(service)?;
        visit.checked = checked;
        visit.checked_at = checked.then(Utc::now);
        Ok(())
    }

    /// Attach a note to a service, allowed only while it is checked.
    pub fn set_note(&mut self, service: &str, note: &str) -> Result<()> {
        let visit = self.visit_mut(service)?;
        if !visit.checked {
            return Err(Error::Validation(format!(
                "service {service} is not checked; notes go with a visit"
            )));
        }
        visit.note = Some(note.to_string());
        Ok(())
    }

    /// Submit every checked visit, one POST per service in round order,
    /// stopping at the first failure.
    pub fn submit_all(&self, api: &dyn TaskApi, staff_id: u64) -> Result<GuardOutcome> {
        let checked: Vec<&GuardVisit> = self.visits.iter().filter(|v| v.checked).collect();
        if checked.is_empty() {
            return Err(Error::Validation(
                "no services checked for this round".to_string(),
            ));
        }

        let mut submitted = Vec::new();
        for visit in checked {
            let record = GuardVisitRecord {
                personal_id: staff_id,
                servicio: visit.service.clone(),
                fecha_hora: visit.checked_at.unwrap_or_else(Utc::now),
                observaciones: visit.note.clone(),
            };
            match api.post_guard_visit(&record) {
                Ok(()) => submitted.push(visit.service.clone()),
                Err(e) => {
                    warn!(
                        service = %visit.service,
                        persisted = submitted.len(),
                        "guard round stopped on failed submission"
                    );
                    return Ok(GuardOutcome {
                        submitted,
                        failed: Some((visit.service.clone(), e)),
                    });
                }
            }
        }
        Ok(GuardOutcome {
            submitted,
            failed: None,
        })
    }

    fn visit_mut(&mut self, service: &str) -> Result<&mut GuardVisit> {
        self.visits
            .iter_mut()
            .find(|v| v.service == service)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "unknown service {service}; the round covers: {}",
                    GUARD_SERVICES.join(", ")
                ))
            })
    }
}
