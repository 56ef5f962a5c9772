//! Scalar views of JSON values.
//!
//! Filters and parameter sources address values inside arbitrary JSON
//! payloads and then need them as text, as a number or as a boolean. The
//! coercions here are deliberately lenient: a numeric string is a number,
//! `"TRUE"` is a boolean, and an object is its own compact JSON text.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The shape of a resolved value.
///
/// `Json` marks an object or array block. Everything except `String` may be
/// injected into a document verbatim when raw data is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// JSON `null`.
    Null,
    /// `true` or `false`.
    Bool,
    /// Any JSON number.
    Number,
    /// A string, or text produced by a template or a default.
    String,
    /// An object or array.
    Json,
}

impl ValueKind {
    /// Classifies a JSON value.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) | Value::Object(_) => Self::Json,
        }
    }

    /// Returns true for kinds that keep their JSON type when injected raw.
    #[must_use]
    pub const fn is_raw(self) -> bool {
        !matches!(self, Self::String)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool => write!(f, "Bool"),
            Self::Number => write!(f, "Number"),
            Self::String => write!(f, "String"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

/// Text form of a value: strings unquoted, `null` empty, blocks as compact JSON.
#[must_use]
pub fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Numeric form of a value. Unparseable input reads as `0.0`.
#[must_use]
pub fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

/// Boolean form of a value.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => parse_bool(&s.to_lowercase()).unwrap_or(false),
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        _ => false,
    }
}

/// Parses the boolean spellings accepted by Go's `strconv.ParseBool`.
#[must_use]
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Builds a JSON number from a float, mapping non-finite values to `null`.
#[must_use]
pub fn from_f64(f: f64) -> Value {
    serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
}
