//! Ping API client implementation.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client as HttpClient, Method};
use serde_json::Value;

use healthchecks_config::{PingClientConfig, PingClientOptions};
use healthchecks_core::request::send;
use healthchecks_core::{classify, HealthchecksError, RequestMeta, ResponseFormat, Result};

use crate::payload::{Payload, PingAction};

const TEXT_CONTENT: &str = "text/plain; charset=utf-8";

/// Sends success, fail and start signals for one check.
#[derive(Debug, Clone)]
pub struct PingClient {
    config: PingClientConfig,
    http: HttpClient,
}

impl PingClient {
    /// Create a client for the check in `options.uuid`.
    ///
    /// # Errors
    ///
    /// Returns [`HealthchecksError::Config`] when the UUID is missing or
    /// invalid, or the base URL cannot be used.
    pub fn new(options: PingClientOptions) -> Result<Self> {
        Self::from_config(options.resolve()?)
    }

    pub fn from_config(config: PingClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .default_headers(request_headers())
            .build()
            .map_err(|err| {
                HealthchecksError::config(format!("failed to build HTTP client: {}", err))
            })?;

        tracing::debug!("ping client for {} via {}", config.uuid, config.base_url);

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &PingClientConfig {
        &self.config
    }

    /// Signal that the job completed.
    ///
    /// Returns the response text only when `return_response` is enabled.
    pub async fn success(&self, payload: impl Into<Payload>) -> Result<Option<String>> {
        let body = payload.into().into_body(PingAction::Success)?;
        self.signal("", body).await
    }

    /// Signal that the job failed.
    pub async fn fail(&self, payload: impl Into<Payload>) -> Result<Option<String>> {
        let body = payload.into().into_body(PingAction::Fail)?;
        self.signal("/fail", body).await
    }

    /// Signal that the job started. Never carries a payload.
    pub async fn start(&self) -> Result<Option<String>> {
        self.signal("/start", None).await
    }

    async fn signal(&self, suffix: &str, body: Option<String>) -> Result<Option<String>> {
        self.perform_request(suffix, body).await.map_err(classify)
    }

    async fn perform_request(&self, suffix: &str, body: Option<String>) -> Result<Option<String>> {
        let url = format!("{}/{}{}", self.config.base_url, self.config.uuid, suffix);
        let method = if body.is_some() { Method::POST } else { Method::GET };
        let meta = RequestMeta::new(method.as_str(), url.clone());

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.body(body);
        }

        let raw = send(request, meta, ResponseFormat::Text, None).await?;

        if !self.config.return_response {
            return Ok(None);
        }

        Ok(Some(match raw.data {
            Value::String(text) => text,
            other => other.to_string(),
        }))
    }
}

fn request_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(TEXT_CONTENT));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(healthchecks_core::USER_AGENT),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const UUID: &str = "3c1169a0-7b50-11ea-873d-3c970e75c219";

    #[test]
    fn headers_are_plain_text() {
        let headers = request_headers();
        assert_eq!(headers[ACCEPT], TEXT_CONTENT);
        assert_eq!(headers[CONTENT_TYPE], TEXT_CONTENT);
        assert_eq!(headers[USER_AGENT], healthchecks_core::USER_AGENT);
        assert!(!headers.contains_key("x-api-key"));
    }

    #[test]
    fn construction_requires_a_valid_uuid() {
        let client = PingClient::new(PingClientOptions::new(UUID)).unwrap();
        assert_eq!(client.config().uuid, UUID);

        let err = PingClient::new(PingClientOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "A Healthchecks.io UUID must be provided.");

        let err = PingClient::new(PingClientOptions::new("nope")).unwrap_err();
        assert!(matches!(err, HealthchecksError::Config(_)));
    }

    #[tokio::test]
    async fn invalid_payload_fails_before_sending() {
        // Nothing listens here; reaching the network would be a RequestError.
        let options = PingClientOptions::new(UUID).with_base_url("http://127.0.0.1:1");
        let client = PingClient::new(options).unwrap();

        let err = client.fail(json!({ "exit": 1 })).await.unwrap_err();
        assert_eq!(err.to_string(), "The fail payload must be a string");
    }
}
