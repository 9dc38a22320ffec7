//! Central error handling.
//!
//! # Data Flow
//! ```text
//! any subsystem raises ApiError
//!     → envelope.rs (derive status / errorcode / summary, apply defaults)
//!     → render.rs (format-negotiated body, protocol headers)
//!     → client response
//! ```
//!
//! # Design Decisions
//! - Components never render responses themselves; they return a typed
//!   fault and exactly one mapper converts it into a response
//! - The fault taxonomy is a closed enum; every variant has a defined
//!   envelope shape
//! - Backend status payloads are passed through verbatim, with the
//!   `origin` attribute forced to "backend"

mod envelope;
mod render;

pub use envelope::ErrorEnvelope;
pub use render::{invoked_response, ok_response, render_error, ErrorContext, ErrorFormat};

use crate::backend::BackendError;

/// A typed fault raised anywhere in the request-handling chain.
///
/// Every variant maps to exactly one client-facing envelope shape; see
/// [`ErrorEnvelope::from_error`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A record failed model-level validation.
    #[error("invalid record")]
    InvalidRecord { errors: Vec<String> },

    /// An explicit domain fault carrying its own status and errorcode.
    #[error("{message}")]
    Api {
        status: u16,
        errorcode: String,
        message: String,
    },

    /// The backend answered with a domain-level `<status>` payload.
    #[error("backend error payload")]
    BackendDomain { payload: String },

    /// The backend could not be reached or the transport failed.
    #[error("{summary}")]
    BackendTransport { status: u16, summary: String },

    /// The backend did not answer within the configured read timeout.
    #[error("{message}")]
    Timeout { message: String },

    /// Missing write permission on a project.
    #[error("{message}")]
    ProjectWritePermission { message: String },

    /// Missing write permission on a package.
    #[error("{message}")]
    PackageWritePermission { message: String },

    /// The requested resource does not exist (backend or record).
    #[error("{message}")]
    NotFound { message: String },

    /// No route services this request.
    #[error("{message}")]
    NoRoute { message: String },

    /// A policy check denied a capability on a record.
    #[error("not authorized to {capability} this {record_type}")]
    NotAuthorized {
        capability: String,
        record_type: String,
    },

    /// Local storage failure (body staging).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Anything that should never surface to clients with detail.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Construct an explicit domain fault.
    pub fn api(status: u16, errorcode: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            errorcode: errorcode.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn no_route(message: impl Into<String>) -> Self {
        Self::NoRoute {
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Timeout(message) => ApiError::Timeout { message },
            BackendError::Unreachable(summary) => ApiError::BackendTransport {
                status: 500,
                summary,
            },
            BackendError::InvalidRequest(summary) => ApiError::BackendTransport {
                status: 500,
                summary,
            },
            BackendError::NotFound { summary } => ApiError::NotFound { message: summary },
            BackendError::Domain { payload, .. } => ApiError::BackendDomain { payload },
        }
    }
}
