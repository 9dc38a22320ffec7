//! Front-tier request router for a build-service API.
//!
//! Authenticates and validates inbound HTTP requests, then relays most of
//! them unchanged to the internal backend service, streaming large bodies
//! instead of buffering them. GET/HEAD traffic can alternatively be offloaded
//! to the surrounding reverse-proxy tier via redirect headers.
//!
//! ```text
//! Client ──▶ http::server ──▶ forward::controller ──┬─▶ forward::offload (redirect headers)
//!                 │                                 └─▶ backend::client ──▶ backend service
//!                 │                                          │
//!                 └──◀── error (single envelope) ◀── fault ◀─┘
//! ```

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod validator;

pub use config::RouterConfig;
pub use error::ApiError;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
