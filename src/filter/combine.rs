//! Verdict combinators.

use super::LogicalOperator;
use crate::error::{FilterCause, FilterError, FilterKind};

/// Folds category verdicts under `and`: the first error wins, then any `false`.
///
/// # Errors
///
/// Returns the first error in iteration order.
pub fn all_branches<I>(branches: I) -> Result<bool, FilterError>
where
    I: IntoIterator<Item = Result<bool, FilterError>>,
{
    branches
        .into_iter()
        .try_fold(true, |pass, verdict| Ok(verdict? && pass))
}

/// Folds `(configured, verdict)` pairs under `or`.
///
/// Any configured category passing wins and discards every error. Otherwise
/// the collected errors are returned together, or `false` if there are none.
///
/// # Errors
///
/// Returns `FilterError::Combined` when nothing passed and something failed.
pub fn any_branch<I>(branches: I) -> Result<bool, FilterError>
where
    I: IntoIterator<Item = (bool, Result<bool, FilterError>)>,
{
    let mut errors = Vec::new();
    let mut pass = false;
    for (configured, verdict) in branches {
        match verdict {
            Ok(ok) => pass |= configured && ok,
            Err(e) => errors.push(e),
        }
    }
    if pass || errors.is_empty() {
        Ok(pass)
    } else {
        Err(FilterError::Combined(errors))
    }
}

/// Folds a filter list lazily under its own operator.
///
/// Under `and` the first failing or erroring item stops the fold. Under `or`
/// the first passing item stops it and errors are collected until then.
pub(crate) fn fold_list<T, F>(
    kind: FilterKind,
    operator: LogicalOperator,
    items: &[T],
    mut check: F,
) -> Result<bool, FilterError>
where
    F: FnMut(&T) -> Result<bool, FilterCause>,
{
    match operator {
        LogicalOperator::And => {
            for item in items {
                if !check(item).map_err(|cause| FilterError::single(kind, cause))? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        LogicalOperator::Or => {
            let mut causes = Vec::new();
            for item in items {
                match check(item) {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(cause) => causes.push(cause),
                }
            }
            if causes.is_empty() {
                Ok(false)
            } else {
                Err(FilterError::Multiple { kind, causes })
            }
        }
    }
}
