//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::Request;
use axum::http::header::CONTENT_TYPE;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;

use api_router::auth::HeaderAuthenticator;
use api_router::lifecycle::Shutdown;
use api_router::validator::SchemaValidator;
use api_router::{ApiServer, RouterConfig};

/// Records what the mock backend saw, for assertions.
#[derive(Clone, Default)]
pub struct BackendProbe {
    hits: Arc<AtomicU32>,
    last_body: Arc<Mutex<Option<Bytes>>>,
    last_content_type: Arc<Mutex<Option<String>>>,
}

#[allow(dead_code)]
impl BackendProbe {
    pub fn record(&self, content_type: Option<String>, body: Bytes) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        *self.last_body.lock().unwrap() = Some(body);
        *self.last_content_type.lock().unwrap() = content_type;
    }

    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Option<Bytes> {
        self.last_body.lock().unwrap().clone()
    }

    pub fn last_content_type(&self) -> Option<String> {
        self.last_content_type.lock().unwrap().clone()
    }
}

/// A catch-all backend that records every request and answers with an
/// "ok" status document.
#[allow(dead_code)]
pub fn echo_backend(probe: BackendProbe) -> Router {
    Router::new().route(
        "/{*path}",
        any(move |request: Request| {
            let probe = probe.clone();
            async move {
                let (parts, body) = request.into_parts();
                let content_type = parts
                    .headers
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
                probe.record(content_type, bytes);
                (
                    [(CONTENT_TYPE, "text/xml")],
                    "<status code=\"ok\"><summary>Ok</summary></status>",
                )
            }
        }),
    )
}

/// Start a mock backend on an ephemeral port.
pub async fn start_backend(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Base config pointing the router at the given backend.
pub fn router_config(backend: SocketAddr) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.backend.host = backend.ip().to_string();
    config.backend.port = backend.port();
    config.observability.metrics_enabled = false;
    config
}

/// Start the router under test; returns its base URL and the shutdown
/// handle keeping it alive.
pub async fn start_router(config: RouterConfig) -> (String, Shutdown) {
    serve(ApiServer::new(config)).await
}

/// Start the router with a custom schema validator wired in.
#[allow(dead_code)]
pub async fn start_router_with_validator(
    config: RouterConfig,
    validator: Arc<dyn SchemaValidator>,
) -> (String, Shutdown) {
    let authenticator = Arc::new(HeaderAuthenticator::from_config(&config.auth).unwrap());
    serve(ApiServer::with_collaborators(config, authenticator, validator)).await
}

async fn serve(server: ApiServer) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let subscription = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run_with_shutdown(listener, subscription).await;
    });
    (format!("http://{}", addr), shutdown)
}
