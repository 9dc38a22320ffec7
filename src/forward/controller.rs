//! Orchestration of a single forwarded request.

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{Response, StatusCode};

use crate::backend::{BackendClient, PostBody};
use crate::config::RouterConfig;
use crate::error::ApiError;
use crate::forward::offload::{OffloadDecision, OffloadStrategy};
use crate::forward::request::{
    content_type_essence, is_form_request, request_path, ForwardMethod, RequestContext,
};
use crate::forward::stage::StagedBody;

/// How a request was serviced.
pub enum Forwarded {
    /// Redirect headers for the proxy tier; the body was never produced
    /// locally, so response validation does not apply.
    Redirected(Response<Body>),
    /// A read relay streaming backend chunks as they arrive.
    Streamed(Response<Body>),
    /// A fully buffered backend reply, still subject to response validation.
    Buffered {
        status: StatusCode,
        content_type: String,
        body: Bytes,
    },
}

/// Drives one request through offload decision, backend call, and relay.
pub struct ForwardingController {
    client: BackendClient,
    offload: OffloadStrategy,
    max_form_body: usize,
    staging_dir: Option<std::path::PathBuf>,
}

impl ForwardingController {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            client: BackendClient::from_config(&config.backend),
            offload: OffloadStrategy::from_config(config),
            max_form_body: config.listener.max_form_body_bytes,
            staging_dir: config.backend.staging_dir.clone(),
        }
    }

    /// Relay `parts`/`body` to the backend and shape the reply.
    pub async fn forward(
        &self,
        ctx: &RequestContext,
        parts: &Parts,
        body: Body,
    ) -> Result<Forwarded, ApiError> {
        let method = ForwardMethod::from_method(&parts.method)?;
        let path = request_path(parts);
        tracing::debug!(user = %ctx.user, method = ?method, path = %path, "forwarding");

        match method {
            ForwardMethod::Get | ForwardMethod::Head => self.relay_read(&path).await,
            ForwardMethod::Post => {
                if is_form_request(parts) {
                    // Form data is small and relayed verbatim, no staging.
                    let bytes = axum::body::to_bytes(body, self.max_form_body)
                        .await
                        .map_err(|e| {
                            ApiError::api(400, "invalid_request", format!("unreadable body: {e}"))
                        })?;
                    let content_type = content_type_essence(parts);
                    let response = self
                        .client
                        .post(&path, PostBody::Form(bytes), content_type.as_deref())
                        .await?;
                    Self::relay_buffered(response).await
                } else {
                    let staged = StagedBody::stage(body, self.staging_dir.as_deref()).await?;
                    let content_type = content_type_essence(parts);
                    let response = self
                        .client
                        .post(&path, PostBody::Staged(staged), content_type.as_deref())
                        .await?;
                    Self::relay_buffered(response).await
                }
            }
            ForwardMethod::Put => {
                let staged = StagedBody::stage(body, self.staging_dir.as_deref()).await?;
                let response = self.client.put(&path, staged).await?;
                Self::relay_buffered(response).await
            }
            ForwardMethod::Delete => {
                let response = self.client.delete(&path).await?;
                Self::relay_buffered(response).await
            }
        }
    }

    async fn relay_read(&self, path: &str) -> Result<Forwarded, ApiError> {
        match self.offload.decide(path) {
            OffloadDecision::Redirect { kind, headers } => {
                tracing::debug!(kind = ?kind, path = %path, "offloading to proxy tier");
                let mut builder = Response::builder().status(StatusCode::OK);
                for (name, value) in headers {
                    builder = builder.header(name, value);
                }
                let response = builder.body(Body::empty()).map_err(ApiError::internal)?;
                Ok(Forwarded::Redirected(response))
            }
            OffloadDecision::NotApplicable => {
                let backend = self.client.get(path).await?;
                let status = backend.status;
                let content_type = backend.content_type.clone();
                let length = backend.length;

                let mut builder = Response::builder()
                    .status(status)
                    .header(CONTENT_TYPE, content_type.as_str());
                if let Some(length) = length {
                    builder = builder.header(CONTENT_LENGTH, length);
                }
                if inline_disposition(&content_type) {
                    builder = builder.header(CONTENT_DISPOSITION, "inline");
                }
                let response = builder
                    .body(backend.into_relay_body())
                    .map_err(ApiError::internal)?;
                Ok(Forwarded::Streamed(response))
            }
        }
    }

    async fn relay_buffered(
        response: crate::backend::BackendResponse,
    ) -> Result<Forwarded, ApiError> {
        let status = response.status;
        let content_type = response.content_type.clone();
        let body = response.into_bytes().await?;
        Ok(Forwarded::Buffered {
            status,
            content_type,
            body,
        })
    }
}

fn inline_disposition(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    matches!(essence, "text/plain" | "text/xml")
}
