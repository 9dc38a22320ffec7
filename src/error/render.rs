//! Format-negotiated rendering of error envelopes and status documents.

use axum::body::Body;
use axum::http::header::{
    HeaderName, HeaderValue, CONTENT_TYPE, LOCATION, REFERER, SET_COOKIE, WWW_AUTHENTICATE,
};
use axum::http::request::Parts;
use axum::http::{Response, StatusCode};
use quick_xml::escape::escape;

use crate::config::RouterConfig;
use crate::error::{ApiError, ErrorEnvelope};

pub const ERRORCODE_HEADER: HeaderName = HeaderName::from_static("x-opensuse-errorcode");

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Response format negotiated from the Accept header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    Xml,
    Json,
    Html,
}

/// Per-request inputs the renderer needs besides the fault itself.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub format: ErrorFormat,
    pub referer: Option<String>,
    pub kerberos_mode: bool,
}

impl ErrorContext {
    pub fn from_parts(parts: &Parts, config: &RouterConfig) -> Self {
        let accept = parts
            .headers
            .get(axum::http::header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let format = if accept.contains("json") {
            ErrorFormat::Json
        } else if accept.contains("html") {
            ErrorFormat::Html
        } else {
            ErrorFormat::Xml
        };
        let referer = parts
            .headers
            .get(REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self {
            format,
            referer,
            kerberos_mode: config.auth.kerberos_mode,
        }
    }
}

/// Convert a fault into the final client response.
///
/// Backend status payloads are emitted verbatim regardless of the
/// negotiated format; everything else renders as the status document,
/// a JSON object, or an HTML redirect-back.
pub fn render_error(err: &ApiError, ctx: &ErrorContext) -> Response<Body> {
    let envelope = ErrorEnvelope::from_error(err);
    let status =
        StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = if let Some(xml) = &envelope.raw_xml {
        plain_body(status, XML_CONTENT_TYPE, xml.clone())
    } else {
        match ctx.format {
            ErrorFormat::Xml => plain_body(
                status,
                XML_CONTENT_TYPE,
                status_document(&envelope.errorcode, &envelope.summary),
            ),
            ErrorFormat::Json => {
                let body = serde_json::json!({
                    "errorcode": envelope.errorcode,
                    "summary": envelope.summary,
                });
                plain_body(status, "application/json", body.to_string())
            }
            ErrorFormat::Html => redirect_back(&envelope, ctx),
        }
    };

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&envelope.errorcode) {
        headers.insert(ERRORCODE_HEADER, value);
    }
    if envelope.status == 401 && !headers.contains_key(WWW_AUTHENTICATE) {
        let challenge = if ctx.kerberos_mode {
            HeaderValue::from_static("Negotiate")
        } else {
            HeaderValue::from_static("basic realm=\"API login\"")
        };
        headers.insert(WWW_AUTHENTICATE, challenge);
    }
    response
}

/// The XML status document used for errors and acknowledgements.
pub fn status_document(code: &str, summary: &str) -> String {
    format!(
        "<status code=\"{}\">\n  <summary>{}</summary>\n</status>\n",
        escape(code),
        escape(summary)
    )
}

/// 200 acknowledgement for locally serviced operations.
pub fn ok_response() -> Response<Body> {
    plain_body(StatusCode::OK, XML_CONTENT_TYPE, status_document("ok", "Ok"))
}

/// 200 acknowledgement for asynchronously invoked jobs.
pub fn invoked_response() -> Response<Body> {
    plain_body(
        StatusCode::OK,
        XML_CONTENT_TYPE,
        status_document("invoked", "Job invoked"),
    )
}

fn plain_body(status: StatusCode, content_type: &str, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

/// Browser clients are sent back where they came from. A flash cookie is
/// set only when there is no referer to return to.
fn redirect_back(envelope: &ErrorEnvelope, ctx: &ErrorContext) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::FOUND;

    let location = ctx.referer.as_deref().unwrap_or("/");
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(LOCATION, value);
    }

    if ctx.referer.is_none() {
        let flash = format!(
            "flash_error={}({}); path=/",
            envelope.errorcode,
            cookie_safe(&envelope.summary)
        );
        if let Ok(value) = HeaderValue::from_str(&flash) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

fn cookie_safe(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != ';' && c != ',' || c == ' ' {
                c
            } else {
                ' '
            }
        })
        .collect()
}
