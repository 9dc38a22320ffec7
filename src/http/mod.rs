//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, API version header)
//!     → authenticate, validate request schema
//!     → forward::controller (offload / backend relay)
//!     → validate response schema (buffered replies only)
//!     → Send to client, or error envelope on any fault
//! ```

pub mod server;

pub use server::{ApiServer, AppState};
