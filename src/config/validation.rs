//! Semantic configuration validation.
//!
//! Serde handles the syntactic layer; this module checks the values make
//! sense together before the config is accepted into the system. All errors
//! are collected and reported at once, not just the first.

use crate::config::schema::{OffloadConfig, RouterConfig};

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: &str) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Validate a deserialized config.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(err("listener.bind_address", "not a valid socket address"));
    }

    if config.backend.host.is_empty() {
        errors.push(err("backend.host", "must not be empty"));
    }
    if config.backend.port == 0 {
        errors.push(err("backend.port", "must not be zero"));
    }
    if config.backend.read_timeout_secs == 0 {
        errors.push(err("backend.read_timeout_secs", "must not be zero"));
    }

    match &config.offload {
        OffloadConfig::XRewrite { host } if host.is_empty() => {
            errors.push(err("offload.host", "x_rewrite requires a non-empty host"));
        }
        OffloadConfig::NginxAccel { prefix } if !prefix.starts_with('/') => {
            errors.push(err("offload.prefix", "nginx_accel prefix must start with '/'"));
        }
        _ => {}
    }

    if axum::http::HeaderName::from_lowercase(config.auth.user_header.to_lowercase().as_bytes())
        .is_err()
    {
        errors.push(err("auth.user_header", "not a valid header name"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(err("observability.metrics_address", "not a valid socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
