//! Envelope derivation: fault → (status, errorcode, summary).
//!
//! The mapping is evaluated as one exhaustive match over the fault enum,
//! followed by a normalization pass that fills in whatever the match left
//! unset. Derivation is a pure function of the fault, so mapping the same
//! fault twice yields the same envelope.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::ApiError;

/// The normalized client-facing shape of a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub errorcode: String,
    pub summary: String,

    /// Backend `<status>` payload to emit verbatim instead of the regular
    /// status document, with `origin="backend"` forced.
    pub raw_xml: Option<String>,
}

/// Envelope fields before defaults are applied.
#[derive(Debug, Default)]
struct PartialEnvelope {
    status: Option<u16>,
    errorcode: Option<String>,
    summary: Option<String>,
    raw_xml: Option<String>,
}

impl ErrorEnvelope {
    /// Map a fault to its envelope.
    pub fn from_error(err: &ApiError) -> Self {
        finalize(partial(err), true)
    }
}

fn partial(err: &ApiError) -> PartialEnvelope {
    let mut out = PartialEnvelope::default();
    match err {
        ApiError::InvalidRecord { errors } => {
            out.status = Some(400);
            out.errorcode = Some("invalid_record".to_string());
            out.summary = Some(errors.join("\n"));
        }
        ApiError::Api {
            status,
            errorcode,
            message,
        } => {
            out.status = Some(*status);
            out.errorcode = Some(errorcode.clone());
            out.summary = Some(message.clone());
        }
        ApiError::BackendDomain { payload } => {
            let (code, normalized) = normalize_backend_payload(payload);
            out.status = Some(code.unwrap_or(500));
            out.summary = Some(normalized.clone());
            out.raw_xml = Some(normalized);
        }
        ApiError::BackendTransport { status, summary } => {
            out.status = Some(*status);
            out.errorcode = Some("uncaught_exception".to_string());
            out.summary = Some(summary.clone());
        }
        ApiError::Timeout { message } => {
            out.status = Some(408);
            out.errorcode = Some("timeout_error".to_string());
            out.summary = Some(message.clone());
        }
        ApiError::ProjectWritePermission { message } => {
            out.status = Some(403);
            out.errorcode = Some("modify_project_no_permission".to_string());
            out.summary = Some(message.clone());
        }
        ApiError::PackageWritePermission { message } => {
            out.status = Some(403);
            out.errorcode = Some("modify_package_no_permission".to_string());
            out.summary = Some(message.clone());
        }
        ApiError::NotFound { message } => {
            out.status = Some(404);
            out.errorcode = Some("not_found".to_string());
            out.summary = Some(message.clone());
        }
        ApiError::NoRoute { message } => {
            out.status = Some(404);
            out.errorcode = Some("not_route".to_string());
            out.summary = Some(message.clone());
        }
        ApiError::NotAuthorized {
            capability,
            record_type,
        } => {
            let action = capability_action(capability);
            let resource = underscore(record_type);
            out.status = Some(403);
            out.errorcode = Some(format!("{}_{}_not_authorized", action, resource));
            out.summary = Some(format!(
                "You are not authorized to {} this {}.",
                action,
                humanize(&resource)
            ));
        }
        ApiError::Io(err) => {
            out.status = Some(500);
            out.summary = Some(err.to_string());
        }
        ApiError::Internal(message) => {
            out.status = Some(500);
            out.summary = Some(message.clone());
        }
    }
    out
}

/// Apply the defaults for anything the mapping left unset. Order matters:
/// the 404 defaults run before the catch-all summary and errorcode ones.
fn finalize(partial: PartialEnvelope, has_fault: bool) -> ErrorEnvelope {
    let status = partial.status.unwrap_or(400);
    let mut errorcode = partial.errorcode;
    let mut summary = partial.summary;

    if status == 404 {
        summary.get_or_insert_with(|| "Not found".to_string());
        errorcode.get_or_insert_with(|| "not_found".to_string());
    }

    let summary = summary.unwrap_or_else(|| "Internal Server Error".to_string());
    let errorcode = errorcode.unwrap_or_else(|| {
        if has_fault {
            "uncaught_exception".to_string()
        } else {
            "unknown".to_string()
        }
    });

    ErrorEnvelope {
        status,
        errorcode,
        summary,
        raw_xml: partial.raw_xml,
    }
}

/// Map a denied capability name to the action word used in the errorcode
/// and message. Unknown capabilities pass through unchanged.
fn capability_action(capability: &str) -> &str {
    match capability {
        "index?" => "list",
        "show?" => "view",
        "create?" | "new?" => "create",
        "update?" => "update",
        "edit?" => "edit",
        "destroy?" => "delete",
        "create_branch?" => "create_branch",
        "accept?" => "accept",
        other => other,
    }
}

/// CamelCase → snake_case.
fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// snake_case → readable words.
fn humanize(name: &str) -> String {
    name.replace('_', " ")
}

/// Extract the `code` attribute from a backend `<status>` payload and force
/// `origin="backend"` on the root element when absent. Unparseable payloads
/// are passed through untouched with no code.
fn normalize_backend_payload(payload: &str) -> (Option<u16>, String) {
    match rewrite_payload(payload) {
        Some((code, xml)) => (code, xml),
        None => (None, payload.to_string()),
    }
}

fn rewrite_payload(payload: &str) -> Option<(Option<u16>, String)> {
    let mut reader = Reader::from_str(payload);
    let mut writer = Writer::new(Vec::new());
    let mut code = None;
    let mut root_seen = false;

    loop {
        match reader.read_event().ok()? {
            Event::Start(e) if !root_seen => {
                root_seen = true;
                let (parsed, elem) = force_origin(&e)?;
                code = parsed;
                writer.write_event(Event::Start(elem)).ok()?;
            }
            Event::Empty(e) if !root_seen => {
                root_seen = true;
                let (parsed, elem) = force_origin(&e)?;
                code = parsed;
                writer.write_event(Event::Empty(elem)).ok()?;
            }
            Event::Eof => break,
            event => writer.write_event(event).ok()?,
        }
    }

    if !root_seen {
        return None;
    }
    let xml = String::from_utf8(writer.into_inner()).ok()?;
    Some((code, xml))
}

fn force_origin(elem: &BytesStart<'_>) -> Option<(Option<u16>, BytesStart<'static>)> {
    let name = String::from_utf8(elem.name().as_ref().to_vec()).ok()?;
    let mut out = BytesStart::new(name);
    let mut code = None;
    let mut has_origin = false;

    for attr in elem.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"code" => {
                code = std::str::from_utf8(attr.value.as_ref())
                    .ok()
                    .and_then(|v| v.parse().ok());
            }
            b"origin" => has_origin = true,
            _ => {}
        }
        out.push_attribute(attr);
    }
    if !has_origin {
        out.push_attribute(("origin", "backend"));
    }
    Some((code, out))
}
