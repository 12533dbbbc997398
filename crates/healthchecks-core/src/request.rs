//! Request shaping and the shared send path used by both clients.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{reason_phrase, ErrorResponse, RequestMeta, Result, TransportError};

/// Query parameters as ordered key/value pairs. Repeated keys are sent
/// repeatedly (`tag=a&tag=b`).
pub type QueryParams = Vec<(String, String)>;

/// Method, path, and optional query and body for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    /// Path relative to the client's base URL.
    pub url: String,
    pub params: Option<QueryParams>,
    pub data: Option<Value>,
}

impl RequestOptions {
    /// Build request options.
    ///
    /// The body is only kept for PUT, POST, PATCH and DELETE, and only when
    /// it is a JSON object.
    pub fn new(
        method: Method,
        url: impl Into<String>,
        params: Option<QueryParams>,
        body: Option<Value>,
    ) -> Self {
        let data = match body {
            Some(body @ Value::Object(_)) if accepts_body(&method) => Some(body),
            _ => None,
        };

        Self {
            method,
            url: url.into(),
            params,
            data,
        }
    }
}

fn accepts_body(method: &Method) -> bool {
    *method == Method::PUT
        || *method == Method::POST
        || *method == Method::PATCH
        || *method == Method::DELETE
}

/// How a response body should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// JSON, falling back to the raw text when the body does not parse.
    Json,
    /// Plain text.
    Text,
}

impl ResponseFormat {
    fn decode(self, bytes: &[u8]) -> Value {
        let text = String::from_utf8_lossy(bytes);
        match self {
            ResponseFormat::Json if !text.trim().is_empty() => {
                serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned()))
            }
            _ => Value::String(text.into_owned()),
        }
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    /// Reason phrase sent by the server, when it differs from the canonical one.
    pub status_text: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

impl RawResponse {
    /// The server's reason phrase, falling back to the canonical phrase.
    pub fn status_message(&self) -> Option<String> {
        self.status_text
            .clone()
            .filter(|text| !text.is_empty())
            .or_else(|| reason_phrase(self.status.as_u16()).map(str::to_string))
    }
}

/// Send one request and collect its response.
///
/// Non-2xx responses and bodies larger than `max_content_length` come back as
/// a [`TransportError`], ready for [`classify`](crate::error::classify).
pub async fn send(
    request: RequestBuilder,
    meta: RequestMeta,
    format: ResponseFormat,
    max_content_length: Option<usize>,
) -> std::result::Result<RawResponse, TransportError> {
    tracing::debug!("{} {}", meta.method, meta.url);

    let response = request
        .send()
        .await
        .map_err(|err| TransportError::from_reqwest(err, meta.clone()))?;

    let status = response.status();
    let status_text = server_reason(&response);
    let headers = collect_headers(response.headers());

    let bytes = read_body(response, &meta, max_content_length).await?;
    let data = format.decode(&bytes);

    if !status.is_success() {
        let response = ErrorResponse {
            status: Some(status.as_u16()),
            status_text,
            headers,
            body: data,
        };
        return Err(TransportError::status(meta, response));
    }

    Ok(RawResponse {
        status,
        status_text,
        headers,
        data,
    })
}

/// hyper only records the reason phrase when it is not the canonical one.
fn server_reason(response: &Response) -> Option<String> {
    response
        .extensions()
        .get::<hyper::ext::ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
}

/// Read the body chunk by chunk, failing as soon as `limit` is passed.
async fn read_body(
    mut response: Response,
    meta: &RequestMeta,
    limit: Option<usize>,
) -> std::result::Result<Vec<u8>, TransportError> {
    if let (Some(limit), Some(length)) = (limit, response.content_length()) {
        if length > limit as u64 {
            return Err(content_limit_exceeded(limit, meta));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|err| TransportError::from_reqwest(err, meta.clone()))?
    {
        body.extend_from_slice(&chunk);
        if let Some(limit) = limit {
            if body.len() > limit {
                return Err(content_limit_exceeded(limit, meta));
            }
        }
    }

    Ok(body)
}

fn content_limit_exceeded(limit: usize, meta: &RequestMeta) -> TransportError {
    TransportError::new(format!("maxContentLength size of {} exceeded", limit))
        .with_code("limit")
        .with_request(meta.clone())
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

/// The full response returned when a client runs in full-response mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullResponse {
    pub status_code: u16,
    pub status_message: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

/// What a management API call resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// The decoded payload only.
    Data(Value),
    /// Status, headers and payload.
    Full(FullResponse),
}

impl ApiResponse {
    /// Normalise a raw response according to the client's response mode.
    pub fn from_raw(raw: RawResponse, full_response: bool) -> Self {
        if full_response {
            let status_message = raw.status_message();
            ApiResponse::Full(FullResponse {
                status_code: raw.status.as_u16(),
                status_message,
                headers: raw.headers,
                data: raw.data,
            })
        } else {
            ApiResponse::Data(raw.data)
        }
    }

    pub fn data(&self) -> &Value {
        match self {
            ApiResponse::Data(data) => data,
            ApiResponse::Full(full) => &full.data,
        }
    }

    pub fn into_data(self) -> Value {
        match self {
            ApiResponse::Data(data) => data,
            ApiResponse::Full(full) => full.data,
        }
    }

    /// Deserialize the payload into a caller-provided type.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_data())?)
    }
}
