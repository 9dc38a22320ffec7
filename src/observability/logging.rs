//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured
/// level when set.
pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("api_router={level},tower_http={level}"))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
