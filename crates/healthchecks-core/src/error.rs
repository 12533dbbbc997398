//! Error types for the Healthchecks.io clients.
//!
//! Failures coming out of the HTTP layer start life as a [`TransportError`].
//! [`classify`] then sorts them into one of two stable kinds:
//!
//! - [`RequestError`]: the request was dispatched but no response came back
//!   (DNS failure, connection refused, timeout, size limit).
//! - [`StatusCodeError`]: a response arrived with a failing status code.
//!
//! Anything else (configuration problems, validation failures, bad ping
//! payloads) passes through [`classify`] untouched.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;
use serde::Serialize;

/// The main error type for Healthchecks.io client operations.
#[derive(Debug, thiserror::Error)]
pub enum HealthchecksError {
    /// Client construction failed (missing credential, bad identifier, bad URL).
    #[error("{0}")]
    Config(String),

    /// Input rejected by a validation schema before any request was made.
    ///
    /// Carries every collected message, joined.
    #[error("{0}")]
    Validation(String),

    /// A ping payload was neither empty nor a string.
    #[error("The {action} payload must be a string")]
    InvalidPayload { action: String },

    /// A transport failure that matched neither classification predicate.
    #[error(transparent)]
    Transport(TransportError),

    /// The request never produced a response.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// A response was received with a failing status code.
    #[error(transparent)]
    StatusCode(#[from] StatusCodeError),

    /// Serializing a typed input failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HealthchecksError {
    /// Create a configuration error with a message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error from a joined message string
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a payload type mismatch error for a ping action
    pub fn invalid_payload<S: Into<String>>(action: S) -> Self {
        Self::InvalidPayload {
            action: action.into(),
        }
    }

    /// Whether this is a wrapped [`RequestError`].
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Whether this is a wrapped [`StatusCodeError`].
    pub fn is_status_code_error(&self) -> bool {
        matches!(self, Self::StatusCode(_))
    }

    /// The HTTP status code, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::StatusCode(err) => Some(err.status_code),
            Self::Transport(err) => err.response.as_ref().and_then(|r| r.status),
            _ => None,
        }
    }
}

impl From<TransportError> for HealthchecksError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Result type alias for Healthchecks.io client operations
pub type Result<T> = std::result::Result<T, HealthchecksError>;

/// The request a transport failure belongs to.
///
/// Its presence on a [`TransportError`] means the request was actually
/// dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMeta {
    pub method: String,
    pub url: String,
}

impl RequestMeta {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }
}

/// The response attached to a failed call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub status: Option<u16>,
    /// Reason phrase as reported by the transport, if any.
    pub status_text: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

/// A raw failure from the HTTP layer, before classification.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    /// Short failure kind such as `timeout`, `connect` or `limit`.
    pub code: Option<String>,
    pub request: Option<RequestMeta>,
    pub response: Option<ErrorResponse>,
    #[source]
    pub source: Option<reqwest::Error>,
}

impl TransportError {
    /// A bare transport failure with no request or response attached.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            code: None,
            request: None,
            response: None,
            source: None,
        }
    }

    /// Wrap a reqwest failure.
    ///
    /// Builder errors never left the process, so they do not get the
    /// request marker attached.
    pub fn from_reqwest(err: reqwest::Error, request: RequestMeta) -> Self {
        let code = reqwest_code(&err);
        let request = if err.is_builder() {
            None
        } else {
            Some(request)
        };

        Self {
            message: err.to_string(),
            code: Some(code.to_string()),
            request,
            response: None,
            source: Some(err),
        }
    }

    /// A dispatched request that came back with a failing status.
    pub fn status(request: RequestMeta, response: ErrorResponse) -> Self {
        let status = response.status.unwrap_or_default();
        Self {
            message: format!("Request failed with status code {}", status),
            code: None,
            request: Some(request),
            response: Some(response),
            source: None,
        }
    }

    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_request(mut self, request: RequestMeta) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_response(mut self, response: ErrorResponse) -> Self {
        self.response = Some(response);
        self
    }

    /// Drop everything transport-specific, keeping only what is safe to log
    /// or serialize.
    pub fn strip(self) -> ErrorCause {
        ErrorCause {
            message: self.message,
        }
    }
}

fn reqwest_code(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else if err.is_redirect() {
        "redirect"
    } else if err.is_body() {
        "body"
    } else if err.is_decode() {
        "decode"
    } else if err.is_builder() {
        "builder"
    } else {
        "request"
    }
}

/// The original failure attached to a wrapped error, stripped of transport
/// internals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCause {
    pub message: String,
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ErrorCause {}

/// The request was dispatched but never produced a response.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
    #[source]
    pub cause: ErrorCause,
}

impl RequestError {
    pub const NAME: &'static str = "RequestError";

    pub fn new(cause: TransportError) -> Self {
        Self {
            message: cause.to_string(),
            cause: cause.strip(),
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }
}

/// A response was received, but its status code signals failure.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct StatusCodeError {
    pub message: String,
    pub status_code: u16,
    pub status_message: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
    #[source]
    pub cause: ErrorCause,
}

impl StatusCodeError {
    pub const NAME: &'static str = "StatusCodeError";

    pub fn new(mut cause: TransportError) -> Self {
        let response = cause.response.take().unwrap_or_default();
        let status_code = response.status.unwrap_or_default();
        let status_message = response
            .status_text
            .filter(|text| !text.is_empty())
            .or_else(|| reason_phrase(status_code).map(str::to_string));

        Self {
            message: cause.to_string(),
            status_code,
            status_message,
            headers: response.headers,
            body: response.body,
            cause: cause.strip(),
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }
}

/// Canonical reason phrase for a status code, e.g. `404` -> `Not Found`.
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
}

/// True when the request was dispatched and no response came back.
pub fn is_request_error(err: &TransportError) -> bool {
    err.request.is_some() && err.response.is_none()
}

/// True when a response with a status code is attached.
pub fn is_response_error(err: &TransportError) -> bool {
    err.response
        .as_ref()
        .is_some_and(|response| response.status.is_some())
}

/// Normalise a caught failure into the stable error taxonomy.
///
/// Only [`HealthchecksError::Transport`] values are candidates for wrapping;
/// every other variant is returned as-is.
pub fn classify(err: HealthchecksError) -> HealthchecksError {
    match err {
        HealthchecksError::Transport(err) if is_request_error(&err) => {
            tracing::warn!("request error: {}", err);
            RequestError::new(err).into()
        }
        HealthchecksError::Transport(err) if is_response_error(&err) => {
            tracing::warn!("status code error: {}", err);
            StatusCodeError::new(err).into()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta() -> RequestMeta {
        RequestMeta::new("GET", "https://healthchecks.io/api/v1/checks/")
    }

    fn response(status: u16, status_text: Option<&str>) -> ErrorResponse {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        ErrorResponse {
            status: Some(status),
            status_text: status_text.map(str::to_string),
            headers,
            body: json!("Bad stuff"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = HealthchecksError::config("A HealthChecks.io Api Key is a required option.");
        assert_eq!(
            err.to_string(),
            "A HealthChecks.io Api Key is a required option."
        );

        let err = HealthchecksError::invalid_payload("success");
        assert_eq!(err.to_string(), "The success payload must be a string");
    }

    #[test]
    fn request_error_predicate() {
        let err = TransportError::new("connect ECONNREFUSED").with_request(meta());
        assert!(is_request_error(&err));
        assert!(!is_response_error(&err));

        let not_dispatched = TransportError::new("builder error");
        assert!(!is_request_error(&not_dispatched));
    }

    #[test]
    fn response_error_predicate() {
        let err = TransportError::status(meta(), response(403, None));
        assert!(is_response_error(&err));
        assert!(!is_request_error(&err));

        let no_status = TransportError::new("odd")
            .with_request(meta())
            .with_response(ErrorResponse::default());
        assert!(!is_response_error(&no_status));
        assert!(!is_request_error(&no_status));
    }

    #[test]
    fn classify_wraps_request_errors() {
        let err = TransportError::new("Oops, something happened")
            .with_code("timeout")
            .with_request(meta());

        match classify(err.into()) {
            HealthchecksError::Request(err) => {
                assert_eq!(err.name(), "RequestError");
                assert_eq!(err.message, "Oops, something happened");
                assert_eq!(err.cause.message, "Oops, something happened");
            }
            other => panic!("expected RequestError, got {:?}", other),
        }
    }

    #[test]
    fn classify_wraps_status_code_errors() {
        let text = "Authentication failed or rate-limit reached";
        let err = TransportError::status(meta(), response(403, Some(text)));

        match classify(err.into()) {
            HealthchecksError::StatusCode(err) => {
                assert_eq!(err.name(), "StatusCodeError");
                assert_eq!(err.message, "Request failed with status code 403");
                assert_eq!(err.status_code, 403);
                assert_eq!(err.status_message.as_deref(), Some(text));
                assert_eq!(err.headers["content-type"], "text/plain");
                assert_eq!(err.body, json!("Bad stuff"));
                assert_eq!(err.cause.message, err.message);
            }
            other => panic!("expected StatusCodeError, got {:?}", other),
        }
    }

    #[test]
    fn status_message_falls_back_to_reason_phrase() {
        let err = TransportError::status(meta(), response(404, None));
        let err = StatusCodeError::new(err);
        assert_eq!(err.status_message.as_deref(), Some("Not Found"));

        let err = TransportError::status(meta(), response(429, Some("")));
        let err = StatusCodeError::new(err);
        assert_eq!(err.status_message.as_deref(), Some("Too Many Requests"));
    }

    #[test]
    fn classify_passes_other_errors_through() {
        let err = classify(HealthchecksError::validation("The 'uuid' cannot be empty"));
        assert!(matches!(err, HealthchecksError::Validation(ref m) if m == "The 'uuid' cannot be empty"));

        let err = classify(HealthchecksError::invalid_payload("fail"));
        assert!(matches!(err, HealthchecksError::InvalidPayload { .. }));

        let err = classify(TransportError::new("never sent").into());
        assert!(matches!(err, HealthchecksError::Transport(_)));
    }

    #[test]
    fn wrapped_errors_serialize_without_transport_internals() {
        let err = StatusCodeError::new(TransportError::status(meta(), response(500, None)));
        let value = serde_json::to_value(&err).unwrap();

        assert_eq!(value["status_code"], 500);
        assert_eq!(value["status_message"], "Internal Server Error");
        assert_eq!(
            value["cause"],
            json!({ "message": "Request failed with status code 500" })
        );
    }

    #[test]
    fn status_code_accessor() {
        let err: HealthchecksError =
            StatusCodeError::new(TransportError::status(meta(), response(401, None))).into();
        assert_eq!(err.status_code(), Some(401));
        assert!(err.is_status_code_error());
        assert!(!err.is_request_error());

        assert_eq!(HealthchecksError::config("x").status_code(), None);
    }
}
