//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all forwarding handler
//! - Wire up middleware (tracing, request ID, API version header)
//! - Authenticate and schema-validate requests before forwarding
//! - Convert every fault into the single error envelope

use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{HeaderName, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{Authenticator, HeaderAuthenticator};
use crate::config::RouterConfig;
use crate::error::{render_error, ApiError, ErrorContext};
use crate::forward::{Forwarded, ForwardMethod, ForwardingController, RequestContext};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::validator::{NoopValidator, RequestDescriptor, SchemaValidator};

pub const API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-opensuse-apiversion");

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RouterConfig>,
    pub controller: Arc<ForwardingController>,
    pub authenticator: Arc<dyn Authenticator>,
    pub validator: Arc<dyn SchemaValidator>,
}

/// HTTP server for the API router.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Create a server with the default collaborators: header-based user
    /// extraction and no-op schema validation.
    pub fn new(config: RouterConfig) -> Self {
        let authenticator = HeaderAuthenticator::from_config(&config.auth).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Bad user header in auth config, using x-username");
            HeaderAuthenticator::new(HeaderName::from_static("x-username"))
        });
        Self::with_collaborators(config, Arc::new(authenticator), Arc::new(NoopValidator))
    }

    /// Create a server with explicit collaborators.
    pub fn with_collaborators(
        config: RouterConfig,
        authenticator: Arc<dyn Authenticator>,
        validator: Arc<dyn SchemaValidator>,
    ) -> Self {
        let state = AppState {
            controller: Arc::new(ForwardingController::from_config(&config)),
            config: Arc::new(config),
            authenticator,
            validator,
        };
        let router = Self::build_router(state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let version = HeaderValue::from_str(&state.config.api.version)
            .unwrap_or_else(|_| HeaderValue::from_static("unknown"));

        Router::new()
            .route("/", any(api_handler))
            .route("/{*path}", any(api_handler))
            .with_state(state)
            // Uploads are staged to disk, not memory; no body cap here.
            .layer(DefaultBodyLimit::disable())
            .layer(SetResponseHeaderLayer::overriding(
                API_VERSION_HEADER,
                version,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until an OS shutdown signal arrives.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server until the given shutdown subscription fires.
    pub async fn run_with_shutdown(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: authenticate, validate, forward, envelope faults.
async fn api_handler(State(state): State<AppState>, request: Request<Body>) -> impl IntoResponse {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();
    let error_ctx = ErrorContext::from_parts(&parts, &state.config);

    let response = match handle(&state, &parts, body).await {
        Ok(response) => response,
        Err(fault) => {
            tracing::debug!(fault = %fault, path = %parts.uri.path(), "request failed");
            render_error(&fault, &error_ctx)
        }
    };

    metrics::record_request(&method, response.status().as_u16(), started);
    response
}

async fn handle(
    state: &AppState,
    parts: &Parts,
    body: Body,
) -> Result<Response<Body>, ApiError> {
    let user = state.authenticator.extract_user(parts)?;
    if state.config.auth.require_login {
        state.authenticator.require_login(&user)?;
    }
    let ctx = RequestContext { user };

    let descriptor = RequestDescriptor {
        method: ForwardMethod::from_method(&parts.method)?,
        path: parts.uri.path().to_string(),
        content_type: crate::forward::request::content_type_essence(parts),
    };
    state.validator.validate_request(&descriptor, None)?;

    match state.controller.forward(&ctx, parts, body).await? {
        Forwarded::Redirected(response) => Ok(response),
        Forwarded::Streamed(response) => Ok(response),
        Forwarded::Buffered {
            status,
            content_type,
            body,
        } => {
            if should_validate_response(state, status, &content_type) {
                state.validator.validate_response(&descriptor, &body)?;
            }
            relay_response(status, &content_type, body)
        }
    }
}

fn should_validate_response(state: &AppState, status: StatusCode, content_type: &str) -> bool {
    state.config.validation.response_schema_validation
        && status == StatusCode::OK
        && !content_type.contains("json")
}

fn relay_response(
    status: StatusCode,
    content_type: &str,
    body: Bytes,
) -> Result<Response<Body>, ApiError> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_DISPOSITION, "inline")
        .body(Body::from(body))
        .map_err(ApiError::internal)
}
