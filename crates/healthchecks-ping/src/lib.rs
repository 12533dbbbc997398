//! Client for the Healthchecks.io ping API.
//!
//! Monitored jobs call [`PingClient::start`] when they begin and
//! [`PingClient::success`] or [`PingClient::fail`] when they finish. Signals
//! without a payload are sent as GET; a text payload is POSTed.
//!
//! ```no_run
//! use healthchecks_ping::{ping, PingAction, PingClient, PingClientOptions};
//!
//! # async fn example() -> healthchecks_ping::Result<()> {
//! let uuid = "3c1169a0-7b50-11ea-873d-3c970e75c219";
//!
//! let client = PingClient::new(PingClientOptions::new(uuid))?;
//! client.start().await?;
//! client.success("backup finished in 42s").await?;
//!
//! // Or in one call:
//! ping(uuid, PingAction::Fail, "disk full").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod payload;

pub use client::PingClient;
pub use payload::{Payload, PingAction};

pub use healthchecks_config::{PingClientConfig, PingClientOptions};
pub use healthchecks_core::{HealthchecksError, RequestError, Result, StatusCodeError};

/// Send a single ping for `uuid` using the default settings.
pub async fn ping(
    uuid: &str,
    action: PingAction,
    payload: impl Into<Payload>,
) -> Result<Option<String>> {
    ping_with(PingClientOptions::new(uuid), action, payload).await
}

/// Send a single ping with a transient client built from `options`.
pub async fn ping_with(
    options: PingClientOptions,
    action: PingAction,
    payload: impl Into<Payload>,
) -> Result<Option<String>> {
    let client = PingClient::new(options)?;
    match action {
        PingAction::Fail => client.fail(payload).await,
        PingAction::Success => client.success(payload).await,
    }
}
