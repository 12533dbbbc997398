//! Ping payloads and actions.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use healthchecks_core::{HealthchecksError, Result};

/// Data attached to a success or fail ping.
///
/// Empty strings and falsy JSON (`null`, `false`, `0`) count as no payload,
/// which sends a plain GET. Text is POSTed as the request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    Json(Value),
}

impl Payload {
    /// The request body for `action`, or `None` when there is nothing to send.
    pub(crate) fn into_body(self, action: PingAction) -> Result<Option<String>> {
        match self {
            Payload::Empty => Ok(None),
            Payload::Text(text) => Ok(Some(text).filter(|t| !t.is_empty())),
            Payload::Json(value) if is_falsy(&value) => Ok(None),
            Payload::Json(Value::String(text)) => Ok(Some(text)),
            Payload::Json(_) => Err(HealthchecksError::invalid_payload(action.as_str())),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Option<&str>> for Payload {
    fn from(text: Option<&str>) -> Self {
        text.map_or(Payload::Empty, Payload::from)
    }
}

impl From<Option<String>> for Payload {
    fn from(text: Option<String>) -> Self {
        text.map_or(Payload::Empty, Payload::Text)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// Which signal a one-shot [`ping`](crate::ping) sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PingAction {
    #[default]
    Success,
    Fail,
}

impl PingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PingAction::Success => "success",
            PingAction::Fail => "fail",
        }
    }
}

impl fmt::Display for PingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything other than `fail` means success.
impl FromStr for PingAction {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "fail" => PingAction::Fail,
            _ => PingAction::Success,
        })
    }
}

impl From<&str> for PingAction {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}
