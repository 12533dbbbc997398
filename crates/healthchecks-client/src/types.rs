//! Typed inputs for the management API.

use serde::{Deserialize, Serialize};

use healthchecks_core::QueryParams;

/// Fields for creating or updating a check.
///
/// Unset fields are left out of the request body, so an update only touches
/// what is set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Space separated tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Expected period between pings, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,

    /// Grace period, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace: Option<i64>,

    /// Cron expression. Takes over from `timeout` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    /// Timezone for `schedule`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,

    /// Notification channels to assign: `"*"`, or a comma separated list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<String>,

    /// Fields used to find an existing check instead of creating a new one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<Vec<String>>,
}

impl CheckDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    pub fn with_timeout(mut self, seconds: i64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn with_grace(mut self, seconds: i64) -> Self {
        self.grace = Some(seconds);
        self
    }

    pub fn with_schedule(mut self, schedule: impl Into<String>, tz: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self.tz = Some(tz.into());
        self
    }

    pub fn with_channels(mut self, channels: impl Into<String>) -> Self {
        self.channels = Some(channels.into());
        self
    }

    pub fn with_unique<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Filters for listing a check's flips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipsQuery {
    /// Only flips from the last `seconds` seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<i64>,

    /// Only flips after this UNIX timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    /// Only flips before this UNIX timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

impl FlipsQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seconds(mut self, seconds: i64) -> Self {
        self.seconds = Some(seconds);
        self
    }

    pub fn with_range(mut self, start: i64, end: i64) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub(crate) fn to_params(self) -> QueryParams {
        [
            ("seconds", self.seconds),
            ("start", self.start),
            ("end", self.end),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v.to_string())))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_fields_are_skipped() {
        let check = CheckDefinition::new().with_name("backups").with_timeout(3600);
        assert_eq!(
            serde_json::to_value(&check).unwrap(),
            json!({ "name": "backups", "timeout": 3600 })
        );
        assert_eq!(serde_json::to_value(CheckDefinition::default()).unwrap(), json!({}));
    }

    #[test]
    fn flips_query_params() {
        let query = FlipsQuery::new().with_seconds(60).with_range(1, 2);
        assert_eq!(
            query.to_params(),
            vec![
                ("seconds".to_string(), "60".to_string()),
                ("start".to_string(), "1".to_string()),
                ("end".to_string(), "2".to_string()),
            ]
        );
        assert!(FlipsQuery::default().to_params().is_empty());
    }
}
