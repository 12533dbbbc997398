//! Client for the Healthchecks.io management API.
//!
//! Wraps the `/api/v{n}/` endpoints for checks, pings, flips and
//! integrations. Inputs are validated locally before any request is made.
//!
//! ```no_run
//! use healthchecks_client::{ApiClient, ApiClientOptions, FlipsQuery};
//!
//! # async fn example() -> healthchecks_client::Result<()> {
//! let client = ApiClient::new(ApiClientOptions::new("my-api-key").with_full_response(true))?;
//!
//! let checks = client.get_checks(&["prod"]).await?;
//! let flips = client
//!     .list_flips("3c1169a0-7b50-11ea-873d-3c970e75c219", &FlipsQuery::new().with_seconds(3600))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod types;

pub use client::ApiClient;
pub use types::{CheckDefinition, FlipsQuery};

pub use healthchecks_config::{ApiClientConfig, ApiClientOptions};
pub use healthchecks_core::{
    ApiResponse, FullResponse, HealthchecksError, RequestError, Result, StatusCodeError,
};
