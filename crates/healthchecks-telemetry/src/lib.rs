//! Logging setup for applications using the Healthchecks.io clients.
//!
//! The client crates only emit `tracing` events (requests at `debug`,
//! classified failures at `warn`). Nothing is printed unless the embedding
//! application installs a subscriber; [`init`] is the one-call way to do so.

use std::env;
use std::str::FromStr;

use time::{format_description, UtcOffset};
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::prelude::*;

/// Filter used when neither an explicit level nor `RUST_LOG` is given.
pub const DEFAULT_FILTER: &str = "info";

/// Error type for telemetry initialisation failures.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Provided log level string could not be parsed.
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    /// A global subscriber is already installed, or installing it failed.
    #[error("failed to init telemetry: {0}")]
    SubscriberInit(String),
}

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Install the global `tracing` subscriber.
///
/// Filter precedence: `level` if given, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`]. `level` may be a plain level (`"debug"`) or a full
/// filter expression (`"warn,healthchecks_client=debug"`).
///
/// ```ignore
/// healthchecks_telemetry::init(Some("healthchecks_ping=debug"))?;
/// ```
///
/// Calling this twice returns [`TelemetryError::SubscriberInit`].
pub fn init(level: Option<&str>) -> Result<()> {
    let filter = build_filter(level, env::var("RUST_LOG").ok().as_deref())?;

    let timer = OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        format_description::parse(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]",
        )
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?,
    );

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(timer);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
}

fn build_filter(level: Option<&str>, rust_log: Option<&str>) -> Result<EnvFilter> {
    match (level, rust_log) {
        (Some(level), _) => parse_level_filter(level),
        (None, Some(rust_log)) => parse_level_filter(rust_log),
        (None, None) => Ok(EnvFilter::new(DEFAULT_FILTER)),
    }
}

/// Parse a plain level or a full `EnvFilter` expression.
fn parse_level_filter(level_str: &str) -> Result<EnvFilter> {
    if Level::from_str(level_str).is_ok() {
        return Ok(EnvFilter::new(level_str));
    }

    EnvFilter::builder()
        .parse(level_str)
        .map_err(|e| TelemetryError::InvalidLevel(format!("{} ({})", level_str, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_level() {
        let f = parse_level_filter("debug").expect("should parse debug level");
        assert_eq!(f.to_string(), "debug");
    }

    #[test]
    fn parse_full_expression() {
        parse_level_filter("warn,healthchecks_ping=debug").expect("should parse expression");
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_level_filter("healthchecks=notalevel").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidLevel(_)));
    }

    #[test]
    fn explicit_level_beats_rust_log() {
        let f = build_filter(Some("error"), Some("trace")).unwrap();
        assert_eq!(f.to_string(), "error");

        let f = build_filter(None, Some("trace")).unwrap();
        assert_eq!(f.to_string(), "trace");

        let f = build_filter(None, None).unwrap();
        assert_eq!(f.to_string(), DEFAULT_FILTER);
    }

    #[test]
    fn second_init_fails() {
        // The first call may already have happened in another test thread.
        let _ = init(Some("info"));
        assert!(matches!(
            init(Some("info")),
            Err(TelemetryError::SubscriberInit(_))
        ));
    }
}
