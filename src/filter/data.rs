//! Data filter.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use super::combine::fold_list;
use super::{Comparator, DataFilter, JsonType, LogicalOperator};
use crate::error::{FilterCause, FilterError, FilterKind};
use crate::event::Event;
use crate::path;
use crate::template;
use crate::value::{number, parse_bool, text, truthy};

/// The candidate values of a data filter, parsed for its declared type.
#[derive(Debug, Clone)]
pub enum Candidates {
    /// Booleans compared with the inspected value's boolean view.
    Bool(Vec<bool>),
    /// Numbers compared with the inspected value's numeric view.
    Number(Vec<f64>),
    /// Patterns matched against the inspected value's text.
    String(Vec<Regex>),
}

impl Candidates {
    /// Parses `values` as `json_type`.
    ///
    /// # Errors
    ///
    /// Returns `FilterCause::NoValues` for an empty list, otherwise the parse
    /// error of the first value that does not fit the type.
    pub fn compile(json_type: JsonType, values: &[String]) -> Result<Self, FilterCause> {
        if values.is_empty() {
            return Err(FilterCause::NoValues);
        }
        Ok(match json_type {
            JsonType::Bool => Self::Bool(
                values
                    .iter()
                    .map(|v| parse_bool(v).ok_or_else(|| FilterCause::InvalidBool { value: v.clone() }))
                    .collect::<Result<_, _>>()?,
            ),
            JsonType::Number => Self::Number(
                values
                    .iter()
                    .map(|v| v.parse::<f64>().map_err(|_| FilterCause::InvalidNumber { value: v.clone() }))
                    .collect::<Result<_, _>>()?,
            ),
            JsonType::String => Self::String(
                values
                    .iter()
                    .map(|v| {
                        Regex::new(v).map_err(|e| FilterCause::InvalidRegex {
                            pattern: v.clone(),
                            reason: e.to_string(),
                        })
                    })
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Compares `subject` against the candidates.
    ///
    /// `!=` passes only when the subject equals (or matches) none of the
    /// candidates; every other comparator passes when it holds for any one.
    ///
    /// # Errors
    ///
    /// Returns `FilterCause::UnsupportedComparator` for an ordering comparator
    /// on booleans or strings.
    pub fn matches(&self, subject: &Value, comparator: Comparator) -> Result<bool, FilterCause> {
        match self {
            Self::Bool(values) => {
                require_equality(comparator, JsonType::Bool)?;
                let actual = truthy(subject);
                Ok(apply_equality(comparator, values.iter().any(|v| *v == actual)))
            }
            Self::Number(values) => {
                let actual = number(subject);
                let ordering = |candidate: &f64| actual.partial_cmp(candidate);
                Ok(if comparator == Comparator::NotEqualTo {
                    values.iter().all(|c| ordering(c) != Some(Ordering::Equal))
                } else {
                    values.iter().any(|c| ordering(c).is_some_and(|o| comparator.holds(o)))
                })
            }
            Self::String(patterns) => {
                require_equality(comparator, JsonType::String)?;
                let actual = text(subject);
                Ok(apply_equality(comparator, patterns.iter().any(|re| re.is_match(&actual))))
            }
        }
    }
}

fn require_equality(comparator: Comparator, json_type: JsonType) -> Result<(), FilterCause> {
    if comparator.is_equality() {
        Ok(())
    } else {
        Err(FilterCause::UnsupportedComparator {
            comparator: comparator.to_string(),
            json_type: json_type.to_string(),
        })
    }
}

const fn apply_equality(comparator: Comparator, any_matched: bool) -> bool {
    match comparator {
        Comparator::NotEqualTo => !any_matched,
        _ => any_matched,
    }
}

impl DataFilter {
    /// Evaluates this filter against a parsed document.
    ///
    /// # Errors
    ///
    /// Returns a `FilterCause` when the path is missing, no values are
    /// configured, the template fails or a value does not fit the type.
    pub fn matches(&self, doc: &Value) -> Result<bool, FilterCause> {
        let found = path::get(doc, &self.path).ok_or_else(|| FilterCause::PathNotFound {
            path: self.path.clone(),
        })?;
        if self.value.is_empty() {
            return Err(FilterCause::NoValues);
        }
        let subject = match self.template.as_deref() {
            Some(tpl) if !tpl.is_empty() => Value::String(template::render(tpl, &Value::String(text(&found)))?),
            _ => found,
        };
        Candidates::compile(self.json_type, &self.value)?.matches(&subject, self.comparator)
    }
}

pub(crate) fn filter_data(
    filters: &[DataFilter],
    operator: LogicalOperator,
    event: &Event,
) -> Result<bool, FilterError> {
    if filters.is_empty() {
        return Ok(true);
    }
    let doc = match event.data_value() {
        Ok(Some(doc)) => doc,
        Ok(None) => return Ok(true),
        Err(_) => return Err(FilterError::single(FilterKind::Data, FilterCause::InvalidJson)),
    };
    fold_list(FilterKind::Data, operator, filters, |f| f.matches(&doc))
}
