//! Error types for sensorlogic.
//!
//! All errors are strongly typed using thiserror so callers can tell a
//! structural problem (missing path, malformed payload) from a
//! configuration problem or a failure inside an embedded language.

use std::fmt;

use thiserror::Error;

/// The five independent filter categories of a dependency filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Expression filters.
    Expr,
    /// Data filters.
    Data,
    /// Context filter.
    Context,
    /// Time filter.
    Time,
    /// Script filter.
    Script,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Expr => "expr",
            Self::Data => "data",
            Self::Context => "context",
            Self::Time => "time",
            Self::Script => "script",
        };
        f.write_str(name)
    }
}

/// Why a single filter could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterCause {
    #[error("path '{path}' does not exist")]
    PathNotFound {
        path: String,
    },

    #[error("event data not valid JSON")]
    InvalidJson,

    #[error("event has no context")]
    MissingContext,

    #[error("no values specified")]
    NoValues,

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("invalid boolean value '{value}'")]
    InvalidBool {
        value: String,
    },

    #[error("invalid number value '{value}'")]
    InvalidNumber {
        value: String,
    },

    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex {
        pattern: String,
        reason: String,
    },

    #[error("comparator '{comparator}' is not supported for {json_type} values")]
    UnsupportedComparator {
        comparator: String,
        json_type: String,
    },

    #[error("{0}")]
    Expression(String),

    #[error("{0}")]
    Script(#[from] ScriptError),

    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),

    #[error("invalid time '{value}', expected hh:mm:ss")]
    InvalidTime {
        value: String,
    },
}

/// Error returned by the filter engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("{kind} filter error ({cause})")]
    Single {
        kind: FilterKind,
        cause: FilterCause,
    },

    #[error("{kind} filter errors [{}]", join(.causes))]
    Multiple {
        kind: FilterKind,
        causes: Vec<FilterCause>,
    },

    #[error("{}", join(.0))]
    Combined(Vec<FilterError>),
}

impl FilterError {
    /// Wraps a single cause.
    #[must_use]
    pub fn single(kind: FilterKind, cause: impl Into<FilterCause>) -> Self {
        Self::Single {
            kind,
            cause: cause.into(),
        }
    }

    /// The filter category, if the error belongs to exactly one.
    #[must_use]
    pub const fn kind(&self) -> Option<FilterKind> {
        match self {
            Self::Single { kind, .. } | Self::Multiple { kind, .. } => Some(*kind),
            Self::Combined(_) => None,
        }
    }
}

/// Separator used whenever several filter errors are reported together.
pub const ERROR_LIST_SEPARATOR: &str = " / ";

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(ERROR_LIST_SEPARATOR)
}

/// Failures of an embedded scripting runtime (Lua or jq).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("failed to compile {language} program: {message}")]
    Compile {
        language: &'static str,
        message: String,
    },

    #[error("{language} runtime error: {message}")]
    Runtime {
        language: &'static str,
        message: String,
    },

    #[error("no output available from the {language} program")]
    NoOutput {
        language: &'static str,
    },

    #[error("{language} output must be {expected}")]
    UnexpectedOutput {
        language: &'static str,
        expected: &'static str,
    },
}

/// Template rendering failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template '{template}' failed to render: {message}")]
    Render {
        template: String,
        message: String,
    },

    #[error("template '{template}' evaluated to empty string or no value")]
    Empty {
        template: String,
    },
}

/// Errors raised while writing into a JSON document by path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    EmptyPath,

    #[error("cannot set '{path}': '{segment}' is not an object or array")]
    NotAContainer {
        path: String,
        segment: String,
    },

    #[error("cannot set '{path}': '{segment}' is not a valid array index")]
    InvalidIndex {
        path: String,
        segment: String,
    },

    #[error("document is not valid JSON: {message}")]
    InvalidDocument {
        message: String,
    },
}

/// Errors raised by the transform engine.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("event data is not valid JSON: {message}")]
    InvalidJson {
        message: String,
    },

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("failed to encode transformed data: {message}")]
    Encode {
        message: String,
    },
}

/// Errors raised by the parameter resolver and payload mutator.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("unable to resolve '{dependency}' parameter value: {reason}")]
    Unresolved {
        dependency: String,
        reason: String,
    },

    #[error("event payload could not be rendered: {message}")]
    Payload {
        message: String,
    },

    #[error("raw value for '{dest}' is not valid JSON: {message}")]
    InvalidRawValue {
        dest: String,
        message: String,
    },

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("failed to (de)serialize resource: {message}")]
    Resource {
        message: String,
    },
}

/// Validation errors for filter, transform and parameter specifications.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },

    #[error("Invalid time filter: start ({start}) and stop ({stop}) must differ")]
    EmptyTimeWindow {
        start: String,
        stop: String,
    },

    #[error("Only one of '{first}' and '{second}' may be set")]
    MutuallyExclusive {
        first: String,
        second: String,
    },
}

/// Top-level error type for sensorlogic.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl SensorError {
    /// Returns true if this is a filter error.
    #[must_use]
    pub const fn is_filter(&self) -> bool {
        matches!(self, Self::Filter(_))
    }

    /// Returns true if this is a transform error.
    #[must_use]
    pub const fn is_transform(&self) -> bool {
        matches!(self, Self::Transform(_))
    }

    /// Returns true if this is a parameter error.
    #[must_use]
    pub const fn is_param(&self) -> bool {
        matches!(self, Self::Param(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for sensorlogic operations.
pub type SensorResult<T> = Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_filter_error_message() {
        let err = FilterError::single(
            FilterKind::Data,
            FilterCause::PathNotFound {
                path: "a.b".to_string(),
            },
        );
        assert_eq!(err.to_string(), "data filter error (path 'a.b' does not exist)");
        assert_eq!(err.kind(), Some(FilterKind::Data));
    }

    #[test]
    fn test_multiple_filter_error_message() {
        let err = FilterError::Multiple {
            kind: FilterKind::Expr,
            causes: vec![
                FilterCause::PathNotFound {
                    path: "x".to_string(),
                },
                FilterCause::Expression("bad".to_string()),
            ],
        };
        assert_eq!(
            err.to_string(),
            "expr filter errors [path 'x' does not exist / bad]"
        );
    }

    #[test]
    fn test_combined_filter_error_message() {
        let err = FilterError::Combined(vec![
            FilterError::single(FilterKind::Time, FilterCause::InvalidTimezone("Mars/Base".to_string())),
            FilterError::single(FilterKind::Data, FilterCause::InvalidJson),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("time filter error (invalid timezone 'Mars/Base')"));
        assert!(msg.contains(" / data filter error (event data not valid JSON)"));
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn test_template_error_empty() {
        let err = TemplateError::Empty {
            template: "{{Input.x}}".to_string(),
        };
        assert!(err.to_string().contains("evaluated to empty string or no value"));
    }

    #[test]
    fn test_script_error_messages() {
        let err = ScriptError::NoOutput { language: "jq" };
        assert_eq!(err.to_string(), "no output available from the jq program");
        let err = ScriptError::UnexpectedOutput {
            language: "jq",
            expected: "a JSON object",
        };
        assert_eq!(err.to_string(), "jq output must be a JSON object");
    }

    #[test]
    fn test_sensor_error_from_filter() {
        let err: SensorError = FilterError::single(FilterKind::Context, FilterCause::MissingContext).into();
        assert!(err.is_filter());
        assert!(!err.is_param());
    }

    #[test]
    fn test_sensor_error_from_validation() {
        let err: SensorError = ValidationError::MissingField {
            field: "path".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Required field 'path' is missing"));
    }

    #[test]
    fn test_sensor_error_from_param() {
        let err: SensorError = ParamError::Unresolved {
            dependency: "dep".to_string(),
            reason: "no value".to_string(),
        }
        .into();
        assert!(err.is_param());
        assert!(!err.is_transform());
    }
}
