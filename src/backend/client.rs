//! HTTP client for the internal backend service.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::backend::error::BackendError;
use crate::config::schema::BackendConfig;
use crate::forward::stage::StagedBody;

const OCTET_STREAM: &str = "application/octet-stream";

/// Client for the single internal backend endpoint.
///
/// Connection pooling is hyper's; each response body stays bound to the
/// connection it arrived on.
#[derive(Clone)]
pub struct BackendClient {
    client: Client<HttpConnector, Body>,
    host: String,
    port: u16,
    read_timeout: Duration,
}

/// Request body for POST forwards.
pub enum PostBody {
    /// Form-encoded bytes relayed verbatim, no staging involved.
    Form(Bytes),
    /// A staged request body streamed from temporary storage.
    Staged(StagedBody),
}

/// A reply from the backend.
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub length: Option<u64>,
    body: ResponseBody,
}

enum ResponseBody {
    Buffered(Bytes),
    Streaming(Incoming),
}

impl BackendResponse {
    /// Consume the response into its full body.
    pub async fn into_bytes(self) -> Result<Bytes, BackendError> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(incoming) => Ok(incoming
                .collect()
                .await
                .map_err(|e| BackendError::Unreachable(e.to_string()))?
                .to_bytes()),
        }
    }

    /// Consume the response into a body that can be relayed to a caller,
    /// pulling chunks lazily for streamed replies.
    pub fn into_relay_body(self) -> Body {
        match self.body {
            ResponseBody::Buffered(bytes) => Body::from(bytes),
            ResponseBody::Streaming(incoming) => Body::new(incoming),
        }
    }
}

impl BackendClient {
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            host: config.host.clone(),
            port: config.port,
            read_timeout: Duration::from_secs(config.read_timeout_secs),
        }
    }

    /// GET with a streaming body accessor.
    pub async fn get(&self, path: &str) -> Result<BackendResponse, BackendError> {
        let request = self
            .builder(Method::GET, path)
            .body(Body::empty())
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
        self.dispatch(request, true).await
    }

    /// POST either a verbatim form body or a staged upload.
    pub async fn post(
        &self,
        path: &str,
        body: PostBody,
        content_type: Option<&str>,
    ) -> Result<BackendResponse, BackendError> {
        let request = match body {
            PostBody::Form(bytes) => self
                .builder(Method::POST, path)
                .header(
                    CONTENT_TYPE,
                    content_type.unwrap_or("application/x-www-form-urlencoded"),
                )
                .body(Body::from(bytes)),
            PostBody::Staged(staged) => {
                let length = staged.len();
                self.builder(Method::POST, path)
                    .header(CONTENT_TYPE, content_type.unwrap_or(OCTET_STREAM))
                    .header(CONTENT_LENGTH, length)
                    .body(staged.into_body())
            }
        }
        .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
        self.dispatch(request, false).await
    }

    /// PUT always streams from a staged body.
    pub async fn put(&self, path: &str, body: StagedBody) -> Result<BackendResponse, BackendError> {
        let length = body.len();
        let request = self
            .builder(Method::PUT, path)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(CONTENT_LENGTH, length)
            .body(body.into_body())
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
        self.dispatch(request, false).await
    }

    /// DELETE carries no body.
    pub async fn delete(&self, path: &str) -> Result<BackendResponse, BackendError> {
        let request = self
            .builder(Method::DELETE, path)
            .body(Body::empty())
            .map_err(|e| BackendError::InvalidRequest(e.to_string()))?;
        self.dispatch(request, false).await
    }

    fn builder(&self, method: Method, path: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(format!("http://{}:{}{}", self.host, self.port, path))
    }

    async fn dispatch(
        &self,
        request: Request<Body>,
        stream_body: bool,
    ) -> Result<BackendResponse, BackendError> {
        let response = match tokio::time::timeout(self.read_timeout, self.client.request(request))
            .await
        {
            Err(_) => {
                return Err(BackendError::Timeout(format!(
                    "no response from backend within {}s",
                    self.read_timeout.as_secs()
                )))
            }
            Ok(Err(e)) => return Err(BackendError::Unreachable(e.to_string())),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            let payload = response
                .into_body()
                .collect()
                .await
                .map_err(|e| BackendError::Unreachable(e.to_string()))?
                .to_bytes();
            let payload = String::from_utf8_lossy(&payload).into_owned();
            if status == StatusCode::NOT_FOUND {
                return Err(BackendError::NotFound { summary: payload });
            }
            return Err(BackendError::Domain {
                status: status.as_u16(),
                payload,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(OCTET_STREAM)
            .to_string();
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let body = if stream_body {
            ResponseBody::Streaming(response.into_body())
        } else {
            ResponseBody::Buffered(
                response
                    .into_body()
                    .collect()
                    .await
                    .map_err(|e| BackendError::Unreachable(e.to_string()))?
                    .to_bytes(),
            )
        };

        Ok(BackendResponse {
            status,
            content_type,
            length,
            body,
        })
    }
}
