//! Client configuration for the Healthchecks.io clients.
//!
//! This crate is responsible for:
//! - Defining the option structs callers use to construct each client
//! - Applying defaults (base URLs, timeout, size limits, API version)
//! - Resolving the API key, with `HC_API_KEY` taking precedence
//! - Loading options from TOML files
//!
//! Options are loose (everything optional, zero means "use the default").
//! Resolution turns them into an immutable [`ApiClientConfig`] or
//! [`PingClientConfig`], or fails before any client is built.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use healthchecks_core::validation::{ensure_valid, UUID_SCHEMA};
use healthchecks_core::{HealthchecksError, Result};

/// Base URL of the management API.
pub const DEFAULT_API_BASE_URL: &str = "https://healthchecks.io";

/// Base URL of the ping API.
pub const DEFAULT_PING_BASE_URL: &str = "https://hc-ping.com";

/// Request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Largest response body accepted by the management client, in bytes.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 10_000;

/// Largest request body sent by the management client, in bytes.
pub const DEFAULT_MAX_BODY_LENGTH: usize = 2000;

/// Management API version used in request paths (`/api/v1/`).
pub const DEFAULT_API_VERSION: u32 = 1;

/// Environment variable holding the management API key.
pub const API_KEY_ENV: &str = "HC_API_KEY";

const MISSING_API_KEY: &str = "A HealthChecks.io Api Key is a required option.";
const MISSING_UUID: &str = "A Healthchecks.io UUID must be provided.";

/// Options for the management API client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiClientOptions {
    /// API key. Ignored when `HC_API_KEY` is set to a non-empty value.
    pub api_key: Option<String>,

    /// Override for the management API base URL.
    pub base_url: Option<String>,

    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Return status, headers and payload instead of the bare payload.
    pub full_response: bool,

    /// Largest accepted response body, in bytes.
    pub max_content_length: Option<usize>,

    /// Largest request body, in bytes.
    pub max_body_length: Option<usize>,

    /// Management API version.
    pub api_version: Option<u32>,
}

impl ApiClientOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout_millis(timeout));
        self
    }

    pub fn with_full_response(mut self, full_response: bool) -> Self {
        self.full_response = full_response;
        self
    }

    pub fn with_max_content_length(mut self, bytes: usize) -> Self {
        self.max_content_length = Some(bytes);
        self
    }

    pub fn with_max_body_length(mut self, bytes: usize) -> Self {
        self.max_body_length = Some(bytes);
        self
    }

    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ApiClientConfig> {
        self.resolve_with_env(std::env::var(API_KEY_ENV).ok())
    }

    /// Resolve using `env_api_key` as the value of `HC_API_KEY`.
    ///
    /// A non-empty environment key wins over `api_key`. Whichever is used is
    /// trimmed and must not be empty.
    pub fn resolve_with_env(&self, env_api_key: Option<String>) -> Result<ApiClientConfig> {
        let api_key = env_api_key
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| HealthchecksError::config(MISSING_API_KEY))?;

        Ok(ApiClientConfig {
            api_key,
            base_url: resolve_base_url(self.base_url.as_deref(), DEFAULT_API_BASE_URL)?,
            timeout: resolve_timeout(self.timeout_ms),
            full_response: self.full_response,
            max_content_length: self
                .max_content_length
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_CONTENT_LENGTH),
            max_body_length: self
                .max_body_length
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_BODY_LENGTH),
            api_version: self
                .api_version
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_API_VERSION),
        })
    }
}

/// Resolved, immutable management client settings.
#[derive(Clone, PartialEq)]
pub struct ApiClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub full_response: bool,
    pub max_content_length: usize,
    pub max_body_length: usize,
    pub api_version: u32,
}

impl fmt::Debug for ApiClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("full_response", &self.full_response)
            .field("max_content_length", &self.max_content_length)
            .field("max_body_length", &self.max_body_length)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Options for the ping client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PingClientOptions {
    /// UUID of the check being pinged.
    pub uuid: Option<String>,

    /// Override for the ping API base URL.
    pub base_url: Option<String>,

    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,

    /// Return the response text from each ping.
    pub return_response: bool,
}

impl PingClientOptions {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout_millis(timeout));
        self
    }

    pub fn with_return_response(mut self, return_response: bool) -> Self {
        self.return_response = return_response;
        self
    }

    /// Resolve the options, validating the UUID.
    pub fn resolve(&self) -> Result<PingClientConfig> {
        let uuid = match self.uuid.as_deref() {
            Some(uuid) if !uuid.is_empty() => uuid,
            _ => return Err(HealthchecksError::config(MISSING_UUID)),
        };

        ensure_valid(Some(&Value::String(uuid.to_string())), &UUID_SCHEMA)
            .map_err(|err| HealthchecksError::config(err.to_string()))?;

        Ok(PingClientConfig {
            uuid: uuid.to_string(),
            base_url: resolve_base_url(self.base_url.as_deref(), DEFAULT_PING_BASE_URL)?,
            timeout: resolve_timeout(self.timeout_ms),
            return_response: self.return_response,
        })
    }
}

/// Resolved, immutable ping client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PingClientConfig {
    pub uuid: String,
    pub base_url: String,
    pub timeout: Duration,
    pub return_response: bool,
}

/// Whole milliseconds, rounded up so a non-zero duration never becomes 0.
fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

fn resolve_timeout(timeout_ms: Option<u64>) -> Duration {
    Duration::from_millis(timeout_ms.filter(|ms| *ms > 0).unwrap_or(DEFAULT_TIMEOUT_MS))
}

/// Fall back to `default` when unset or blank; otherwise require an absolute
/// http(s) URL. Trailing slashes are removed.
fn resolve_base_url(base_url: Option<&str>, default: &str) -> Result<String> {
    let base_url = match base_url.map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => return Ok(default.to_string()),
    };

    let parsed = Url::parse(base_url).map_err(|err| {
        HealthchecksError::config(format!("invalid base URL '{}': {}", base_url, err))
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(HealthchecksError::config(format!(
            "invalid base URL '{}': must start with http:// or https://",
            base_url
        )));
    }

    Ok(base_url.trim_end_matches('/').to_string())
}

/// Options for both clients as read from a configuration file.
///
/// ```toml
/// [api]
/// api_key = "..."
/// full_response = true
///
/// [ping]
/// uuid = "3c1169a0-7b50-11ea-873d-3c970e75c219"
/// timeout_ms = 10000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HealthchecksConfig {
    #[serde(default)]
    pub api: Option<ApiClientOptions>,

    #[serde(default)]
    pub ping: Option<PingClientOptions>,
}

/// Load configuration from a specific file path.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<HealthchecksConfig> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref).map_err(|err| {
        HealthchecksError::config(format!(
            "failed to read config file '{}': {}",
            path_ref.display(),
            err
        ))
    })?;

    let cfg: HealthchecksConfig = toml::from_str(&contents).map_err(|err| {
        HealthchecksError::config(format!(
            "failed to parse config file '{}': {}",
            path_ref.display(),
            err
        ))
    })?;

    tracing::debug!("loaded configuration from {}", path_ref.display());
    Ok(cfg)
}

/// Load configuration using the default search order:
/// 1. `/etc/healthchecks/healthchecks.toml`
/// 2. `./healthchecks.toml`
pub fn load_default() -> Result<HealthchecksConfig> {
    let candidates = [
        PathBuf::from("/etc/healthchecks/healthchecks.toml"),
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("healthchecks.toml"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return load_from_path(candidate);
        }
    }

    Err(HealthchecksError::config(
        "no configuration file found; create /etc/healthchecks/healthchecks.toml or ./healthchecks.toml",
    ))
}
