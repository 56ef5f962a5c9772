//! Specification validation.
//!
//! Filters, transforms and parameters are usually deserialized from
//! user-supplied configuration. Evaluation reports malformed specifications
//! lazily, one event at a time; `validate()` rejects them up front.

use crate::error::{FilterCause, ValidationError};
use crate::filter::{Candidates, ContextFilter, DataFilter, EventDependencyFilter, ExprFilter, TimeFilter};
use crate::params::TriggerParameter;
use crate::time::{parse_time_of_day, parse_timezone};
use crate::transform::TransformSpec;

/// Validate a non-empty trimmed string field.
fn validate_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[allow(clippy::needless_pass_by_value)]
fn invalid(field: &'static str, cause: FilterCause) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        reason: cause.to_string(),
    }
}

impl DataFilter {
    /// Validates this filter.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty path or value, a value that does
    /// not parse for the declared type, or an ordering comparator on a
    /// non-numeric type.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_empty("data.path", &self.path)?;
        if self.value.is_empty() {
            return Err(ValidationError::MissingField {
                field: "data.value".to_string(),
            });
        }
        for value in &self.value {
            validate_non_empty("data.value", value)?;
        }
        let candidates = Candidates::compile(self.json_type, &self.value).map_err(|e| invalid("data.value", e))?;
        if !matches!(candidates, Candidates::Number(_)) && !self.comparator.is_equality() {
            return Err(ValidationError::InvalidValue {
                field: "data.comparator".to_string(),
                reason: format!(
                    "comparator '{}' is not supported for {} values",
                    self.comparator, self.json_type
                ),
            });
        }
        Ok(())
    }
}

impl ExprFilter {
    /// Validates this filter.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty expression or a field without a
    /// path or name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_empty("exprs.expr", &self.expr)?;
        for field in &self.fields {
            validate_non_empty("exprs.fields.path", &field.path)?;
            validate_non_empty("exprs.fields.name", &field.name)?;
        }
        Ok(())
    }
}

impl ContextFilter {
    /// Validates this filter.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` when no field is set; such a
    /// filter matches every event.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [&self.event_type, &self.subject, &self.source, &self.data_content_type];
        if fields.iter().all(|f| f.is_empty()) {
            return Err(ValidationError::MissingField {
                field: "context".to_string(),
            });
        }
        Ok(())
    }
}

impl TimeFilter {
    /// Validates this filter.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a malformed time of day, an unknown
    /// timezone or identical start and stop.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let start = parse_time_of_day(&self.start).map_err(|e| invalid("time.start", e))?;
        let stop = parse_time_of_day(&self.stop).map_err(|e| invalid("time.stop", e))?;
        if start == stop {
            return Err(ValidationError::EmptyTimeWindow {
                start: self.start.clone(),
                stop: self.stop.clone(),
            });
        }
        if let Some(tz) = &self.timezone {
            parse_timezone(tz).map_err(|e| invalid("time.timezone", e))?;
        }
        Ok(())
    }
}

impl EventDependencyFilter {
    /// Validates every filter this dependency carries.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(time) = &self.time {
            time.validate()?;
        }
        if let Some(context) = &self.context {
            context.validate()?;
        }
        for data in &self.data {
            data.validate()?;
        }
        for expr in &self.exprs {
            expr.validate()?;
        }
        Ok(())
    }
}

impl TransformSpec {
    /// Validates this transform.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MutuallyExclusive` when both a jq program and
    /// a script are set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.jq.is_empty() && !self.script.is_empty() {
            return Err(ValidationError::MutuallyExclusive {
                first: "jq".to_string(),
                second: "script".to_string(),
            });
        }
        Ok(())
    }
}

impl TriggerParameter {
    /// Validates this parameter.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` when the source names no dependency.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_empty("src.dependencyName", &self.src.dependency_name)
    }
}
