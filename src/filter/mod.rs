//! Event filtering.
//!
//! A dependency filter ([`EventDependencyFilter`]) is made of five independent
//! categories: expressions, data matches, a context match, a daily time window
//! and a Lua script. [`filter`] evaluates all five against one event and
//! combines the verdicts with a [`LogicalOperator`]:
//!
//! - `and`: every configured category must pass. The first error (in the
//!   order expr, data, context, time, script) is returned.
//! - `or`: any configured category passing is enough and errors from the
//!   others are dropped. Without a pass, the collected errors are returned.
//!
//! The data and expr lists carry their own operator with the same shape:
//! under `and` the first failure or error stops evaluation, under `or` the
//! first pass does.

mod combine;
mod context;
mod data;
mod expr;
mod script;
mod time;

pub use combine::{all_branches, any_branch};
pub use data::Candidates;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::event::Event;
use crate::script::{LuaRuntime, ScriptPredicate};

/// How a list of filters, or the categories of a filter, combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    /// Every member must pass. The empty string on the wire means `and`.
    #[default]
    #[serde(rename = "and", alias = "")]
    And,
    /// Any member passing is enough.
    #[serde(rename = "or")]
    Or,
}

/// Comparison applied by a data filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    /// `>=`
    #[serde(rename = ">=")]
    GreaterThanOrEqualTo,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
    /// `=`; also the empty string.
    #[default]
    #[serde(rename = "=", alias = "")]
    EqualTo,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqualTo,
    /// `<`
    #[serde(rename = "<")]
    LessThan,
    /// `<=`
    #[serde(rename = "<=")]
    LessThanOrEqualTo,
}

impl Comparator {
    /// Whether `event <op> candidate` holds given their ordering.
    #[must_use]
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::GreaterThanOrEqualTo => ordering != Ordering::Less,
            Self::GreaterThan => ordering == Ordering::Greater,
            Self::EqualTo => ordering == Ordering::Equal,
            Self::NotEqualTo => ordering != Ordering::Equal,
            Self::LessThan => ordering == Ordering::Less,
            Self::LessThanOrEqualTo => ordering != Ordering::Greater,
        }
    }

    /// Returns true for `=` and `!=`, the only comparators defined for every type.
    #[must_use]
    pub const fn is_equality(self) -> bool {
        matches!(self, Self::EqualTo | Self::NotEqualTo)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::GreaterThanOrEqualTo => ">=",
            Self::GreaterThan => ">",
            Self::EqualTo => "=",
            Self::NotEqualTo => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqualTo => "<=",
        };
        f.write_str(symbol)
    }
}

/// Declared type of the value a data filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonType {
    /// Boolean; values are parsed as booleans.
    Bool,
    /// Number; values are parsed as floats.
    Number,
    /// String; values are regular expressions.
    String,
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
        }
    }
}

/// Daily window the event time must fall in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilter {
    /// Inclusive start, `hh:mm:ss`.
    pub start: String,
    /// Exclusive stop, `hh:mm:ss`. A stop at or before start wraps past midnight.
    pub stop: String,
    /// IANA timezone of `start` and `stop`; UTC when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Expected values of event context fields. Empty fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextFilter {
    /// Expected event type.
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub event_type: String,
    /// Expected subject.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject: String,
    /// Expected source.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Expected data content type.
    #[serde(rename = "datacontenttype", skip_serializing_if = "String::is_empty")]
    pub data_content_type: String,
}

/// Match on one value of the event data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFilter {
    /// Path of the inspected value.
    pub path: String,
    /// How to interpret `value` and the inspected value.
    #[serde(rename = "type")]
    pub json_type: JsonType,
    /// Candidates; the filter passes when any one matches (for `!=`, when none does).
    #[serde(default)]
    pub value: Vec<String>,
    /// Comparison to apply; `=` by default.
    #[serde(default)]
    pub comparator: Comparator,
    /// Template applied to the inspected value before comparing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

/// Boolean expression over named values extracted from the event data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprFilter {
    /// The expression, e.g. `a == "b" && c > 10`.
    pub expr: String,
    /// Values bound into the expression.
    #[serde(default)]
    pub fields: Vec<PayloadField>,
}

/// Binds the value at `path` to the variable `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadField {
    /// Path of the value in the event data.
    pub path: String,
    /// Variable name in the expression.
    pub name: String,
}

/// All filters of one event dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventDependencyFilter {
    /// Daily time window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeFilter>,
    /// Context match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextFilter>,
    /// Data matches.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataFilter>,
    /// Expression filters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exprs: Vec<ExprFilter>,
    /// How `data` combines.
    pub data_logical_operator: LogicalOperator,
    /// How `exprs` combines.
    pub expr_logical_operator: LogicalOperator,
    /// Lua predicate over the event data, bound as `event`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub script: String,
}

/// Evaluates `filter` against `event` using the default Lua runtime for scripts.
///
/// A missing filter always passes.
///
/// # Errors
///
/// Returns `FilterError` when a filter cannot be evaluated, subject to the
/// operator's error policy.
pub fn filter(
    event: &Event,
    filter: Option<&EventDependencyFilter>,
    operator: LogicalOperator,
) -> Result<bool, FilterError> {
    filter_with(&LuaRuntime::new(), event, filter, operator)
}

/// Evaluates `filter` against `event`, running scripts on `runtime`.
///
/// # Errors
///
/// See [`filter`].
pub fn filter_with(
    runtime: &dyn ScriptPredicate,
    event: &Event,
    filter: Option<&EventDependencyFilter>,
    operator: LogicalOperator,
) -> Result<bool, FilterError> {
    let Some(spec) = filter else {
        return Ok(true);
    };

    let branches = [
        (!spec.exprs.is_empty(), expr::filter_expr(&spec.exprs, spec.expr_logical_operator, event)),
        (!spec.data.is_empty(), data::filter_data(&spec.data, spec.data_logical_operator, event)),
        (spec.context.is_some(), Ok(context::filter_context(spec.context.as_ref(), event.context.as_ref()))),
        (spec.time.is_some(), time::filter_time(spec.time.as_ref(), event)),
        (!spec.script.is_empty(), script::filter_script(runtime, &spec.script, event)),
    ];

    let verdict = match operator {
        LogicalOperator::And => all_branches(branches.into_iter().map(|(_, result)| result)),
        LogicalOperator::Or => any_branch(branches),
    };
    tracing::debug!(
        operator = ?operator,
        event_id = event.context.as_ref().map_or("", |c| c.id.as_str()),
        verdict = ?verdict,
        "evaluated dependency filter"
    );
    verdict
}
