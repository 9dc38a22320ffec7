//! Backend service client subsystem.
//!
//! # Data Flow
//! ```text
//! forward::controller
//!     → client.rs (build request, single backend endpoint, read timeout)
//!     → backend service
//!     → BackendResponse (buffered bytes or a streamed body)
//! ```
//!
//! # Design Decisions
//! - One backend endpoint, fixed at startup; no per-request routing
//! - Non-2xx replies are faults, never relayed blindly: 404 and domain
//!   payloads stay distinguishable from transport failures
//! - A response body is bound to one connection and consumed at most once,
//!   enforced by taking `self` by value

pub mod client;
pub mod error;

pub use client::{BackendClient, BackendResponse, PostBody};
pub use error::BackendError;
