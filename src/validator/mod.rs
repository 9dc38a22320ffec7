//! Schema validation collaborators.
//!
//! The actual schema rules live outside this crate; the router invokes
//! validation as an opaque pass/fail step before dispatch (requests) and
//! after dispatch (buffered responses). Offload redirects and streamed
//! relays never produce a local body, so they are never response-validated.

use crate::error::ApiError;
use crate::forward::ForwardMethod;

/// What the validator gets to see about a request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: ForwardMethod,
    pub path: String,
    pub content_type: Option<String>,
}

/// Opaque pass/fail schema validation.
pub trait SchemaValidator: Send + Sync {
    fn validate_request(
        &self,
        descriptor: &RequestDescriptor,
        body: Option<&[u8]>,
    ) -> Result<(), ApiError>;

    fn validate_response(&self, descriptor: &RequestDescriptor, body: &[u8])
        -> Result<(), ApiError>;
}

/// Accepts everything; the default when no schemas are wired in.
pub struct NoopValidator;

impl SchemaValidator for NoopValidator {
    fn validate_request(
        &self,
        _descriptor: &RequestDescriptor,
        _body: Option<&[u8]>,
    ) -> Result<(), ApiError> {
        Ok(())
    }

    fn validate_response(
        &self,
        _descriptor: &RequestDescriptor,
        _body: &[u8],
    ) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Standard fault for a failed schema check.
pub fn validation_failed(detail: impl std::fmt::Display) -> ApiError {
    ApiError::api(400, "validation_failed", detail.to_string())
}
