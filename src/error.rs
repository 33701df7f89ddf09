//! Error taxonomy for remote-store and lifecycle operations.
//!
//! Callers need to distinguish four outcomes: the network failed, the server
//! answered with a failure status, a client-side precondition stopped the
//! action before any request was made, and the one command the backend never
//! grew an endpoint for.

use thiserror::Error;

/// Result type for store, lifecycle and guard operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure: refused connection, DNS, timeout.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status. A body may have been
    /// present; it is not trusted.
    #[error("server error: HTTP {status}")]
    Server { status: u16 },

    /// A success response whose body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A client-side precondition failed; no request was issued.
    #[error("{0}")]
    Validation(String),

    /// Referenced by the client surface but not implemented by the service.
    #[error("{0} is not available")]
    Unsupported(&'static str),
}

impl Error {
    /// True when retrying the same action by hand could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(Error::Server { status: 503 }.is_transient());
        assert!(!Error::Validation("nope".into()).is_transient());
        assert!(!Error::Unsupported("task reassignment").is_transient());
    }

    #[test]
    fn unsupported_message_names_the_feature() {
        let msg = Error::Unsupported("task reassignment").to_string();
        assert_eq!(msg, "task reassignment is not available");
    }
}
