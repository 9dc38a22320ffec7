//! Inbound request classification.

use axum::http::request::Parts;
use axum::http::header::CONTENT_TYPE;

use crate::auth::User;
use crate::error::ApiError;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// The closed set of methods the router forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl ForwardMethod {
    /// Classify an HTTP method. Anything outside the closed set is a
    /// routing fault.
    pub fn from_method(method: &axum::http::Method) -> Result<Self, ApiError> {
        match method.as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(ApiError::no_route(format!("no route for method {other}"))),
        }
    }

    pub fn is_read(self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

/// Per-request context threaded through the forwarding chain.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: User,
}

/// The path sent to the backend: request path plus query string.
pub fn request_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}

/// The media type without parameters, lowercased.
pub fn content_type_essence(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
}

/// Whether the request carries a form-encoded body.
pub fn is_form_request(parts: &Parts) -> bool {
    content_type_essence(parts).as_deref() == Some(FORM_CONTENT_TYPE)
}
