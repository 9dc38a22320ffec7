//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the API router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Backend service endpoint and transfer settings.
    pub backend: BackendConfig,

    /// API protocol settings.
    pub api: ApiConfig,

    /// GET/HEAD offload strategy for the surrounding proxy tier.
    pub offload: OffloadConfig,

    /// Schema validation toggles.
    pub validation: ValidationConfig,

    /// Authentication settings.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum size for buffered form-encoded POST bodies.
    /// Non-form bodies are staged to disk and are not subject to this limit.
    pub max_form_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_form_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Backend service endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend host.
    pub host: String,

    /// Backend port.
    pub port: u16,

    /// Read timeout in seconds. Backend operations may be long-running,
    /// so the default is deliberately large.
    pub read_timeout_secs: u64,

    /// Directory for staged request bodies. Defaults to the system temp dir.
    pub staging_dir: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5352,
            read_timeout_secs: 1000,
            staging_dir: None,
        }
    }
}

/// API protocol settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Version string served in the `X-Opensuse-APIVersion` header.
    pub version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Offload strategy for GET/HEAD requests.
///
/// Exactly one variant is active for the lifetime of the process. With
/// anything other than `None`, the router answers GET/HEAD with redirect
/// headers and lets the surrounding infrastructure fetch the content
/// directly from the backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum OffloadConfig {
    /// The router relays backend bytes itself.
    #[default]
    None,

    /// apache mod_xforward: `X-Forward` header pointing at the backend.
    XForward,

    /// lighttpd: `X-Rewrite-URI` / `X-Rewrite-Host` headers.
    XRewrite {
        /// Host the proxy tier should rewrite to.
        host: String,
    },

    /// nginx: `X-Accel-Redirect` header under a configured location prefix.
    NginxAccel {
        /// Internal location prefix (e.g., "/internal").
        prefix: String,
    },
}

/// Schema validation toggles.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ValidationConfig {
    /// Validate response bodies against schemas after dispatch.
    /// Only applies to locally buffered responses; offloaded and streamed
    /// relays never produce a local body to validate.
    pub response_schema_validation: bool,
}

/// Authentication settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Reject requests from unauthenticated users.
    pub require_login: bool,

    /// Answer 401 with a `Negotiate` challenge instead of a Basic realm.
    pub kerberos_mode: bool,

    /// Trusted header carrying the authenticated login, set by the
    /// authenticating proxy in front of this router.
    pub user_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_login: false,
            kerberos_mode: false,
            user_header: "x-username".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
