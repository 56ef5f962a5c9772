//! Context filter.

use super::ContextFilter;
use crate::event::EventContext;

/// Subset match of `expected` against `actual`.
///
/// Only the non-empty expected fields are compared. Nothing expected always
/// passes; something expected of a missing context never does.
pub(crate) fn filter_context(expected: Option<&ContextFilter>, actual: Option<&EventContext>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    let Some(actual) = actual else {
        return false;
    };
    [
        (&expected.event_type, &actual.event_type),
        (&expected.subject, &actual.subject),
        (&expected.source, &actual.source),
        (&expected.data_content_type, &actual.data_content_type),
    ]
    .iter()
    .all(|(want, got)| want.is_empty() || want == got)
}
