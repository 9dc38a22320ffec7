//! Authentication collaborators.
//!
//! Credential verification lives outside this crate; the router only needs
//! to know who the caller is and whether a login is required. The trait
//! seam lets deployments plug in their own verifier.

use axum::http::request::Parts;
use axum::http::HeaderName;

use crate::config::AuthConfig;
use crate::error::ApiError;

/// The caller identity attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum User {
    Identified { login: String },
    Nobody,
}

impl User {
    pub fn is_nobody(&self) -> bool {
        matches!(self, User::Nobody)
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            User::Identified { login } => f.write_str(login),
            User::Nobody => f.write_str("_nobody_"),
        }
    }
}

/// Extracts the caller identity and enforces login requirements.
pub trait Authenticator: Send + Sync {
    fn extract_user(&self, parts: &Parts) -> Result<User, ApiError>;

    fn require_login(&self, user: &User) -> Result<(), ApiError> {
        if user.is_nobody() {
            return Err(ApiError::api(
                401,
                "authentication_required",
                "Authentication required",
            ));
        }
        Ok(())
    }
}

/// Trusts a header set by the authenticating proxy in front of the router.
pub struct HeaderAuthenticator {
    header: HeaderName,
}

impl HeaderAuthenticator {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, ApiError> {
        let header = HeaderName::from_lowercase(config.user_header.to_lowercase().as_bytes())
            .map_err(|e| ApiError::internal(format!("bad user header name: {e}")))?;
        Ok(Self::new(header))
    }
}

impl Authenticator for HeaderAuthenticator {
    fn extract_user(&self, parts: &Parts) -> Result<User, ApiError> {
        match parts.headers.get(&self.header).map(|v| v.to_str()) {
            Some(Ok(login)) if !login.is_empty() => Ok(User::Identified {
                login: login.to_string(),
            }),
            Some(Err(_)) => Err(ApiError::api(
                400,
                "invalid_request",
                "malformed user header",
            )),
            _ => Ok(User::Nobody),
        }
    }
}
