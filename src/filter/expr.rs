//! Expression filter.

use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Value as ExprValue};
use serde_json::Value;

use super::combine::fold_list;
use super::{ExprFilter, LogicalOperator};
use crate::error::{FilterCause, FilterError, FilterKind};
use crate::event::Event;
use crate::path;

impl ExprFilter {
    /// Binds the fields from `doc` and evaluates the expression.
    ///
    /// Only a boolean `true` result passes.
    ///
    /// # Errors
    ///
    /// Returns `FilterCause::PathNotFound` for a missing field and
    /// `FilterCause::Expression` when the expression does not parse or evaluate.
    pub fn matches(&self, doc: &Value) -> Result<bool, FilterCause> {
        let mut context = HashMapContext::new();
        for field in &self.fields {
            let found = path::get(doc, &field.path).ok_or_else(|| FilterCause::PathNotFound {
                path: field.path.clone(),
            })?;
            context
                .set_value(field.name.clone(), to_expr_value(&found))
                .map_err(|e| FilterCause::Expression(e.to_string()))?;
        }
        let tree = build_operator_tree(&self.expr).map_err(|e| FilterCause::Expression(e.to_string()))?;
        let result = tree
            .eval_with_context(&context)
            .map_err(|e| FilterCause::Expression(e.to_string()))?;
        Ok(result == ExprValue::Boolean(true))
    }
}

fn to_expr_value(value: &Value) -> ExprValue {
    match value {
        Value::Null => ExprValue::Empty,
        Value::Bool(b) => ExprValue::Boolean(*b),
        Value::Number(n) => n
            .as_i64()
            .map_or_else(|| ExprValue::Float(n.as_f64().unwrap_or(f64::NAN)), ExprValue::Int),
        Value::String(s) => ExprValue::String(s.clone()),
        Value::Array(items) => ExprValue::Tuple(items.iter().map(to_expr_value).collect()),
        Value::Object(_) => ExprValue::String(value.to_string()),
    }
}

/// Evaluates the expression filters of a dependency.
///
/// Filters without fields have nothing to check and are skipped.
pub(crate) fn filter_expr(
    filters: &[ExprFilter],
    operator: LogicalOperator,
    event: &Event,
) -> Result<bool, FilterError> {
    if filters.is_empty() {
        return Ok(true);
    }
    let doc = match event.data_value() {
        Ok(Some(doc)) => doc,
        Ok(None) => return Ok(true),
        Err(_) => return Err(FilterError::single(FilterKind::Expr, FilterCause::InvalidJson)),
    };
    let active: Vec<&ExprFilter> = filters.iter().filter(|f| !f.fields.is_empty()).collect();
    fold_list(FilterKind::Expr, operator, &active, |f| f.matches(&doc))
}
