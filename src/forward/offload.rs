//! GET/HEAD offload strategies.
//!
//! Instead of relaying backend bytes itself, the router can answer a read
//! request with redirect headers that tell the surrounding proxy tier to
//! fetch the resource straight from the backend. Which protocol is spoken
//! depends on what sits in front: apache mod_xforward, lighttpd rewrite,
//! or nginx X-Accel. The choice is fixed at startup and never changes
//! mid-request.

use crate::config::schema::{OffloadConfig, RouterConfig};

pub const CACHE_CONTROL_NO_TRANSFORM: (&str, &str) = ("cache-control", "no-transform");

/// The active offload protocol, resolved once from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffloadStrategy {
    None,
    XForward { backend: String },
    XRewrite { host: String },
    NginxAccel { prefix: String, backend: String },
}

/// Which redirect protocol produced a decision, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    XForward,
    XRewrite,
    NginxAccel,
}

/// Outcome of asking the strategy about a read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffloadDecision {
    /// The router must relay the bytes itself.
    NotApplicable,
    /// Answer 200/empty with these headers; the proxy tier does the rest.
    Redirect {
        kind: RedirectKind,
        headers: Vec<(&'static str, String)>,
    },
}

impl OffloadStrategy {
    pub fn from_config(config: &RouterConfig) -> Self {
        let backend = format!("{}:{}", config.backend.host, config.backend.port);
        match &config.offload {
            OffloadConfig::None => Self::None,
            OffloadConfig::XForward => Self::XForward { backend },
            OffloadConfig::XRewrite { host } => Self::XRewrite { host: host.clone() },
            OffloadConfig::NginxAccel { prefix } => Self::NginxAccel {
                prefix: prefix.clone(),
                backend,
            },
        }
    }

    /// Decide how a GET/HEAD for `path` is serviced.
    pub fn decide(&self, path: &str) -> OffloadDecision {
        match self {
            Self::None => OffloadDecision::NotApplicable,
            Self::XForward { backend } => OffloadDecision::Redirect {
                kind: RedirectKind::XForward,
                headers: vec![
                    ("x-forward", format!("http://{backend}{path}")),
                    cache_control(),
                ],
            },
            Self::XRewrite { host } => OffloadDecision::Redirect {
                kind: RedirectKind::XRewrite,
                headers: vec![
                    ("x-rewrite-uri", path.to_string()),
                    ("x-rewrite-host", host.clone()),
                    cache_control(),
                ],
            },
            Self::NginxAccel { prefix, backend } => OffloadDecision::Redirect {
                kind: RedirectKind::NginxAccel,
                headers: vec![
                    ("x-accel-redirect", format!("{prefix}/http/{backend}{path}")),
                    cache_control(),
                ],
            },
        }
    }
}

fn cache_control() -> (&'static str, String) {
    (
        CACHE_CONTROL_NO_TRANSFORM.0,
        CACHE_CONTROL_NO_TRANSFORM.1.to_string(),
    )
}
