//! Backend fault types.
//!
//! The distinction between "backend reachable but unhappy" and "backend
//! unreachable" is load-bearing: the two map to different client-facing
//! statuses in the error envelope.

/// Failure talking to the backend service.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// No response within the configured read timeout.
    #[error("{0}")]
    Timeout(String),

    /// Connection or transport failure.
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// The outgoing request could not be constructed.
    #[error("invalid backend request: {0}")]
    InvalidRequest(String),

    /// The backend answered 404.
    #[error("{summary}")]
    NotFound { summary: String },

    /// The backend answered non-2xx with a domain error payload.
    #[error("backend returned {status}")]
    Domain { status: u16, payload: String },
}
