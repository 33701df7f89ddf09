//! Field types shared across the task lifecycle.
//!
//! `TaskState` is the derived lifecycle position of a task. It is never
//! stored or sent over the wire; it is recomputed from the solution log and
//! the finished flag every time it is needed.

use clap::ValueEnum;

/// Derived lifecycle state of a task.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TaskState {
    /// No solution entry yet, not finished.
    Pending,
    /// At least one solution entry, not finished.
    InProcess,
    /// The requester marked the task finished.
    Finalized,
}

/// Services visited during a scheduled guard round, in round order.
///
/// The round checklist is fixed; the client cannot add or remove stops
/// without a backend change.
pub const GUARD_SERVICES: &[&str] = &[
    "Urgencias",
    "Quirófano",
    "Terapia Intensiva",
    "Neonatología",
    "Hemodinamia",
    "Tomografía",
    "Rayos X",
    "Laboratorio",
];
