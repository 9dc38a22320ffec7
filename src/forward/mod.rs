//! Backend forwarding subsystem, the core of the router.
//!
//! # Data Flow
//! ```text
//! http::server (authenticated, validated request)
//!     → request.rs (closed method set, backend path)
//!     → controller.rs (per-method relay strategy)
//!         ├─ GET/HEAD → offload.rs (redirect headers) or streamed relay
//!         ├─ POST     → form bytes verbatim, or stage.rs → backend
//!         ├─ PUT      → stage.rs → backend
//!         └─ DELETE   → backend
//!     → Forwarded (redirect, stream, or buffered bytes)
//! ```
//!
//! # Design Decisions
//! - Method dispatch is an exhaustive match over a closed enum
//! - Large bodies are staged to unlinked temp files, never held in memory
//! - GET relays stream chunk-by-chunk; only mutating replies are buffered
//! - The authenticated user travels in an explicit RequestContext

pub mod controller;
pub mod offload;
pub mod request;
pub mod stage;

pub use controller::{Forwarded, ForwardingController};
pub use offload::{OffloadDecision, OffloadStrategy};
pub use request::{ForwardMethod, RequestContext};
pub use stage::StagedBody;
