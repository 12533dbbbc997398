//! Management API client implementation.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client as HttpClient, Method};
use serde_json::{json, Value};

use healthchecks_config::{ApiClientConfig, ApiClientOptions};
use healthchecks_core::request::send;
use healthchecks_core::validation::{
    ensure_valid, Schema, CHECK_SCHEMA, FLIPS_QUERY_SCHEMA, TAGS_SCHEMA, UUID_OR_UNIQUE_KEY_SCHEMA,
    UUID_SCHEMA,
};
use healthchecks_core::{
    classify, ApiResponse, HealthchecksError, QueryParams, RequestMeta, RequestOptions,
    ResponseFormat, Result, TransportError,
};

use crate::types::{CheckDefinition, FlipsQuery};

const JSON_CONTENT: &str = "application/json; charset=utf-8";

/// A client for the Healthchecks.io management API.
///
/// Every call validates its inputs first and fails with
/// [`HealthchecksError::Validation`] before touching the network. Transport
/// failures come back as [`HealthchecksError::Request`] or
/// [`HealthchecksError::StatusCode`].
///
/// ```no_run
/// use healthchecks_client::{ApiClient, ApiClientOptions, CheckDefinition};
///
/// # async fn example() -> healthchecks_client::Result<()> {
/// let client = ApiClient::new(ApiClientOptions::new("my-api-key"))?;
///
/// let check = CheckDefinition::new().with_name("backups").with_timeout(86400);
/// let created = client.create_check(&check).await?;
/// println!("{}", created.data());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ApiClientConfig,
    http: HttpClient,
}

impl ApiClient {
    /// Create a client from loose options.
    ///
    /// `HC_API_KEY`, when set, is used instead of `options.api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`HealthchecksError::Config`] if no usable API key is found or
    /// the base URL is invalid.
    pub fn new(options: ApiClientOptions) -> Result<Self> {
        Self::from_config(options.resolve()?)
    }

    /// Create a client from already-resolved settings.
    pub fn from_config(config: ApiClientConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .default_headers(request_headers(&config.api_key)?)
            .build()
            .map_err(|err| {
                HealthchecksError::config(format!("failed to build HTTP client: {}", err))
            })?;

        tracing::debug!(
            "management client for {} (api v{})",
            config.base_url,
            config.api_version
        );

        Ok(Self { config, http })
    }

    /// The settings this client was built with.
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Versioned path for a resource, e.g. `/api/v1/checks/`.
    fn path(&self, resource: &str) -> String {
        format!("/api/v{}/{}", self.config.api_version, resource)
    }

    fn request_options(
        &self,
        method: Method,
        resource: &str,
        params: Option<QueryParams>,
        body: Option<Value>,
    ) -> RequestOptions {
        RequestOptions::new(method, self.path(resource), params, body)
    }

    async fn perform_request(&self, options: RequestOptions) -> Result<ApiResponse> {
        let url = format!("{}{}", self.config.base_url, options.url);
        let meta = RequestMeta::new(options.method.as_str(), url.clone());

        let mut request = self.http.request(options.method.clone(), &url);

        if let Some(params) = &options.params {
            request = request.query(params);
        }

        if let Some(data) = &options.data {
            let body = serde_json::to_vec(data)?;
            if body.len() > self.config.max_body_length {
                return Err(TransportError::new("Request body larger than maxBodyLength limit")
                    .with_code("limit")
                    .with_request(meta)
                    .into());
            }
            request = request.body(body);
        }

        let raw = send(
            request,
            meta,
            ResponseFormat::Json,
            Some(self.config.max_content_length),
        )
        .await?;

        Ok(ApiResponse::from_raw(raw, self.config.full_response))
    }

    async fn execute(&self, options: RequestOptions) -> Result<ApiResponse> {
        self.perform_request(options).await.map_err(classify)
    }

    /// List checks, optionally only those carrying all of `tags`.
    pub async fn get_checks(&self, tags: &[&str]) -> Result<ApiResponse> {
        check_input(&[(&json!(tags), &TAGS_SCHEMA)])?;

        let params = tags
            .iter()
            .map(|tag| ("tag".to_string(), tag.to_string()))
            .collect();

        let options = self.request_options(Method::GET, "checks/", Some(params), None);
        self.execute(options).await
    }

    /// Get one check by UUID or unique key.
    pub async fn get_check(&self, uuid: &str) -> Result<ApiResponse> {
        check_input(&[(&json!(uuid), &UUID_OR_UNIQUE_KEY_SCHEMA)])?;

        let options = self.request_options(Method::GET, &format!("checks/{}", uuid), None, None);
        self.execute(options).await
    }

    /// Create a check.
    pub async fn create_check(&self, check: &CheckDefinition) -> Result<ApiResponse> {
        let body = serde_json::to_value(check)?;
        check_input(&[(&body, &CHECK_SCHEMA)])?;

        let options = self.request_options(Method::POST, "checks/", None, Some(body));
        self.execute(options).await
    }

    /// Update an existing check. Only the fields set on `check` change.
    pub async fn update_check(&self, uuid: &str, check: &CheckDefinition) -> Result<ApiResponse> {
        let body = serde_json::to_value(check)?;
        check_input(&[(&json!(uuid), &UUID_SCHEMA), (&body, &CHECK_SCHEMA)])?;

        let options =
            self.request_options(Method::POST, &format!("checks/{}", uuid), None, Some(body));
        self.execute(options).await
    }

    /// Disable monitoring for a check without removing it.
    pub async fn pause_check(&self, uuid: &str) -> Result<ApiResponse> {
        check_input(&[(&json!(uuid), &UUID_SCHEMA)])?;

        let options =
            self.request_options(Method::POST, &format!("checks/{}/pause", uuid), None, None);
        self.execute(options).await
    }

    /// Permanently delete a check.
    pub async fn delete_check(&self, uuid: &str) -> Result<ApiResponse> {
        check_input(&[(&json!(uuid), &UUID_SCHEMA)])?;

        let options =
            self.request_options(Method::DELETE, &format!("checks/{}", uuid), None, None);
        self.execute(options).await
    }

    /// List the pings a check has received.
    pub async fn list_pings(&self, uuid: &str) -> Result<ApiResponse> {
        check_input(&[(&json!(uuid), &UUID_SCHEMA)])?;

        let options =
            self.request_options(Method::GET, &format!("checks/{}/pings", uuid), None, None);
        self.execute(options).await
    }

    /// List a check's status changes.
    pub async fn list_flips(&self, uuid: &str, query: &FlipsQuery) -> Result<ApiResponse> {
        let query_value = serde_json::to_value(query)?;
        check_input(&[
            (&json!(uuid), &UUID_OR_UNIQUE_KEY_SCHEMA),
            (&query_value, &FLIPS_QUERY_SCHEMA),
        ])?;

        let options = self.request_options(
            Method::GET,
            &format!("checks/{}/flips", uuid),
            Some(query.to_params()),
            None,
        );
        self.execute(options).await
    }

    /// List the account's notification integrations.
    pub async fn get_integrations(&self) -> Result<ApiResponse> {
        let options = self.request_options(Method::GET, "channels", None, None);
        self.execute(options).await
    }
}

/// Validate each value in turn, failing on the first that does not pass.
fn check_input(inputs: &[(&Value, &Schema)]) -> Result<()> {
    for (value, schema) in inputs {
        ensure_valid(Some(*value), schema)?;
    }
    Ok(())
}

fn request_headers(api_key: &str) -> Result<HeaderMap> {
    let api_key = HeaderValue::from_str(api_key)
        .map_err(|_| HealthchecksError::config("The Api Key contains invalid header characters"))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT));
    headers.insert("X-Api-Key", api_key);
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(healthchecks_core::USER_AGENT),
    );
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_KEY: &str = "gPTCzVUYtiNJhdaAMeMXHkFf4Yd0Pe1Vx";

    fn client() -> ApiClient {
        let config = ApiClientOptions::new(API_KEY)
            .resolve_with_env(None)
            .unwrap();
        ApiClient::from_config(config).unwrap()
    }

    #[test]
    fn test_path_building() {
        let client = client();
        assert_eq!(client.path("checks/"), "/api/v1/checks/");

        let config = ApiClientOptions::new(API_KEY)
            .with_api_version(2)
            .resolve_with_env(None)
            .unwrap();
        let client = ApiClient::from_config(config).unwrap();
        assert_eq!(client.path("channels"), "/api/v2/channels");
    }

    #[test]
    fn test_request_headers() {
        let headers = request_headers(API_KEY).unwrap();
        assert_eq!(headers[ACCEPT], JSON_CONTENT);
        assert_eq!(headers[CONTENT_TYPE], JSON_CONTENT);
        assert_eq!(headers["x-api-key"], API_KEY);
        assert_eq!(headers[USER_AGENT], healthchecks_core::USER_AGENT);

        assert!(request_headers("bad\nkey").is_err());
    }

    #[test]
    fn test_request_options() {
        let client = client();

        let options = client.request_options(Method::GET, "checks/", None, None);
        assert_eq!(options.url, "/api/v1/checks/");
        assert_eq!(options.params, None);
        assert_eq!(options.data, None);

        let params = vec![("tag".to_string(), "prod".to_string())];
        let options = client.request_options(Method::GET, "checks/", Some(params.clone()), None);
        assert_eq!(options.params, Some(params));
        assert_eq!(options.data, None);

        let body = json!({ "name": "backups" });
        let options = client.request_options(Method::POST, "checks/", None, Some(body.clone()));
        assert_eq!(options.params, None);
        assert_eq!(options.data, Some(body));
    }

    #[test]
    fn test_check_input_stops_at_first_failing_value() {
        let err = check_input(&[
            (&json!(""), &UUID_SCHEMA),
            (&json!({ "timeout": 1 }), &CHECK_SCHEMA),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "The 'uuid' cannot be empty");

        assert!(check_input(&[]).is_ok());
    }
}
