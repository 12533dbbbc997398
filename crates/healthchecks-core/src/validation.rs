//! Input validation schemas.
//!
//! Each schema is a static set of rules over a `serde_json::Value`, the same
//! shape the values take on the wire. Object schemas collect every field
//! violation; the per-item check on `unique` stops at the first bad item.
//!
//! ```rust
//! use healthchecks_core::validation::{validate, UUID_SCHEMA};
//! use serde_json::json;
//!
//! let result = validate(Some(&json!("not-a-uuid")), &UUID_SCHEMA);
//! assert!(!result.valid);
//! assert_eq!(
//!     result.errors.as_deref(),
//!     Some("The 'uuid' must be a valid UUID string")
//! );
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{HealthchecksError, Result};

/// Lower bound for a check's `timeout` and `grace`, in seconds.
pub const TIMEOUT_MIN: i64 = 60;

/// Upper bound for a check's `timeout` and `grace`, in seconds (30 days).
pub const TIMEOUT_MAX: i64 = 2_592_000;

/// Values accepted inside a check's `unique` list.
pub const UNIQUE_FIELDS: &[&str] = &["name", "tags", "timeout", "grace"];

const MESSAGE_DELIMITER: &str = ".";

/// A single value rule.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Required, non-empty, canonical UUID string.
    Uuid,
    /// Required UUID or 40 character hex unique key.
    UuidOrUniqueKey,
    /// Optional, nullable list of strings.
    StringList,
    /// Optional, nullable string; empty allowed.
    OptionalString,
    /// Optional integer; null rejected.
    Integer,
    /// Optional, nullable integer within `[min, max]`.
    BoundedInteger { min: i64, max: i64 },
    /// Optional, nullable list whose items must be one of `allowed`.
    OneOfList { allowed: &'static [&'static str] },
}

#[derive(Debug)]
enum Shape {
    Value(Rule),
    Object(&'static [(&'static str, Rule)]),
}

/// A named validation schema.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    shape: Shape,
}

impl Schema {
    const fn value(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            shape: Shape::Value(rule),
        }
    }

    const fn object(name: &'static str, fields: &'static [(&'static str, Rule)]) -> Self {
        Self {
            name,
            shape: Shape::Object(fields),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Check identifier.
pub static UUID_SCHEMA: Schema = Schema::value("uuid", Rule::Uuid);

/// Check identifier or its SHA1 unique key.
pub static UUID_OR_UNIQUE_KEY_SCHEMA: Schema = Schema::value("uuid", Rule::UuidOrUniqueKey);

/// Tag filter for listing checks.
pub static TAGS_SCHEMA: Schema = Schema::value("tags", Rule::StringList);

/// Query parameters for listing flips.
pub static FLIPS_QUERY_SCHEMA: Schema = Schema::object(
    "flips query",
    &[
        ("seconds", Rule::Integer),
        ("start", Rule::Integer),
        ("end", Rule::Integer),
    ],
);

const TIMEOUT_RANGE: Rule = Rule::BoundedInteger {
    min: TIMEOUT_MIN,
    max: TIMEOUT_MAX,
};

/// Check definition for create and update.
pub static CHECK_SCHEMA: Schema = Schema::object(
    "check",
    &[
        ("name", Rule::OptionalString),
        ("tags", Rule::OptionalString),
        ("desc", Rule::OptionalString),
        ("timeout", TIMEOUT_RANGE),
        ("grace", TIMEOUT_RANGE),
        ("schedule", Rule::OptionalString),
        ("tz", Rule::OptionalString),
        ("channels", Rule::OptionalString),
        (
            "unique",
            Rule::OneOfList {
                allowed: UNIQUE_FIELDS,
            },
        ),
    ],
);

/// Outcome of running a value through a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    /// All violation messages, joined. `None` when valid.
    pub errors: Option<String>,
}

impl ValidationResult {
    fn from_messages(messages: Vec<String>) -> Self {
        if messages.is_empty() {
            Self {
                valid: true,
                errors: None,
            }
        } else {
            Self {
                valid: false,
                errors: Some(messages.join(MESSAGE_DELIMITER)),
            }
        }
    }

    /// Convert into a `Result`, failing with [`HealthchecksError::Validation`].
    pub fn into_result(self) -> Result<()> {
        match self.errors {
            Some(errors) => Err(HealthchecksError::validation(errors)),
            None => Ok(()),
        }
    }
}

/// Validate a value against a schema. `None` means the value is absent.
pub fn validate(value: Option<&Value>, schema: &Schema) -> ValidationResult {
    let mut messages = Vec::new();

    match &schema.shape {
        Shape::Value(rule) => check_rule(*rule, schema.name, value, &mut messages),
        Shape::Object(fields) => check_object(schema.name, fields, value, &mut messages),
    }

    ValidationResult::from_messages(messages)
}

/// Validate and fail with the joined messages.
pub fn ensure_valid(value: Option<&Value>, schema: &Schema) -> Result<()> {
    validate(value, schema).into_result()
}

/// Whether a string is a canonical (hyphenated) UUID.
pub fn is_uuid(value: &str) -> bool {
    uuid_regex().is_match(value)
}

/// Whether a string is a 40 character hexadecimal unique key.
pub fn is_unique_key(value: &str) -> bool {
    unique_key_regex().is_match(value)
}

fn uuid_regex() -> &'static Regex {
    static UUID_REGEX: OnceLock<Regex> = OnceLock::new();
    UUID_REGEX.get_or_init(|| {
        Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("UUID pattern is valid")
    })
}

fn unique_key_regex() -> &'static Regex {
    static UNIQUE_KEY_REGEX: OnceLock<Regex> = OnceLock::new();
    UNIQUE_KEY_REGEX
        .get_or_init(|| Regex::new(r"^(?i)[0-9a-f]{40}$").expect("unique key pattern is valid"))
}

fn check_object(
    name: &str,
    fields: &[(&'static str, Rule)],
    value: Option<&Value>,
    messages: &mut Vec<String>,
) {
    let object = match value {
        None => return,
        Some(Value::Object(object)) => object,
        Some(_) => {
            messages.push(format!("The '{}' value must be an object", name));
            return;
        }
    };

    for (field, rule) in fields {
        check_rule(*rule, field, object.get(*field), messages);
    }

    // Unknown keys are reported after the declared fields.
    for key in object.keys() {
        if !fields.iter().any(|(field, _)| *field == key.as_str()) {
            messages.push(format!("\"{}\" is not allowed", key));
        }
    }
}

fn check_rule(rule: Rule, field: &str, value: Option<&Value>, messages: &mut Vec<String>) {
    match rule {
        Rule::Uuid => check_uuid(field, value, messages),
        Rule::UuidOrUniqueKey => {
            let ok = matches!(value, Some(Value::String(s)) if is_uuid(s) || is_unique_key(s));
            if !ok {
                messages.push(format!(
                    "The '{}' must be a valid UUID or unique key (SHA1) string",
                    field
                ));
            }
        }
        Rule::StringList => match value {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
            Some(_) => messages.push(format!("The '{}' must be an array of strings", field)),
        },
        Rule::OptionalString => match value {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => messages.push(format!("The '{}' value must be a string", field)),
        },
        Rule::Integer => match value {
            None => {}
            Some(v) if as_integer(v).is_some() => {}
            Some(_) => messages.push(format!("The '{}' value must be an integer", field)),
        },
        Rule::BoundedInteger { min, max } => check_bounded(field, min, max, value, messages),
        Rule::OneOfList { allowed } => match value {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                let bad_item = items
                    .iter()
                    .any(|item| !matches!(item, Value::String(s) if allowed.contains(&s.as_str())));
                if bad_item {
                    messages.push(format!(
                        "A '{}' item must be a string that equals either {}",
                        field,
                        quoted_choices(allowed)
                    ));
                }
            }
            Some(_) => messages.push(format!("The '{}' value must be an array of strings", field)),
        },
    }
}

fn check_uuid(field: &str, value: Option<&Value>, messages: &mut Vec<String>) {
    let message = match value {
        None => format!("The '{}' is a required value", field),
        Some(Value::String(s)) if s.is_empty() => format!("The '{}' cannot be empty", field),
        Some(Value::String(s)) if is_uuid(s) => return,
        Some(Value::String(_)) => format!("The '{}' must be a valid UUID string", field),
        Some(_) => format!("The '{}' must be a string", field),
    };
    messages.push(message);
}

fn check_bounded(
    field: &str,
    min: i64,
    max: i64,
    value: Option<&Value>,
    messages: &mut Vec<String>,
) {
    let number = match value {
        None | Some(Value::Null) => return,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(_) => f64::NAN,
    };

    if number.is_nan() {
        messages.push(range_message(field, min, max));
        return;
    }

    if number.fract() != 0.0 {
        messages.push(range_message(field, min, max));
    }
    if number < min as f64 {
        messages.push(format!(
            "The '{}' value must be larger than or equal to {}",
            field, min
        ));
    }
    if number > max as f64 {
        messages.push(format!(
            "The '{}' value must be smaller than or equal to {}",
            field, max
        ));
    }
}

fn range_message(field: &str, min: i64, max: i64) -> String {
    format!(
        "The '{}' value must be an integer between {} and {}",
        field, min, max
    )
}

/// Integral JSON numbers, including floats such as `60.0`.
fn as_integer(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(number) => number,
        _ => return None,
    };
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    let float = number.as_f64()?;
    if float.fract() == 0.0 && float.abs() <= i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

/// `'a', 'b', or 'c'`
fn quoted_choices(choices: &[&str]) -> String {
    let quoted: Vec<String> = choices.iter().map(|c| format!("'{}'", c)).collect();
    match quoted.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, or {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}
