//! Viewpoint scoping for store loads and gated commands.
//!
//! The session is built once at startup and passed explicitly into every
//! load and into the commands that care who is asking; there is no ambient
//! signed-in-actor state anywhere.

/// Which slice of the task collection a session sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Technician viewpoint: one area's queue. The acting technician's name
    /// travels with each command, not with the session.
    Staff { area: String },
    /// Requester viewpoint: the user's own submissions.
    Requester { name: String },
    /// Supervision viewpoint: every task.
    Supervisor,
}

impl Session {
    pub fn staff(area: impl Into<String>) -> Self {
        Session::Staff { area: area.into() }
    }

    pub fn requester(name: impl Into<String>) -> Self {
        Session::Requester { name: name.into() }
    }

    /// Short label for logs and headers.
    pub fn describe(&self) -> String {
        match self {
            Session::Staff { area } => format!("area {area}"),
            Session::Requester { name } => format!("requests of {name}"),
            Session::Supervisor => "all areas".to_string(),
        }
    }
}
