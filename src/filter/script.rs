//! Script filter.

use crate::error::{FilterCause, FilterError, FilterKind};
use crate::event::Event;
use crate::script::ScriptPredicate;

/// Runs `script` with the event data bound as `event`.
///
/// An empty script or an event without data passes.
pub(crate) fn filter_script(runtime: &dyn ScriptPredicate, script: &str, event: &Event) -> Result<bool, FilterError> {
    if script.is_empty() {
        return Ok(true);
    }
    let wrap = |cause: FilterCause| FilterError::single(FilterKind::Script, cause);
    let Some(data) = event.data_value().map_err(|_| wrap(FilterCause::InvalidJson))? else {
        return Ok(true);
    };
    runtime.evaluate(script, &data).map_err(|e| wrap(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventContext;
    use crate::script::LuaRuntime;

    fn event(data: &str) -> Event {
        Event::new(EventContext::new("webhook", "webhook"), data)
    }

    #[test]
    fn test_script_verdicts() {
        let rt = LuaRuntime::new();
        let data = r#"{"a": "b", "c": 10, "d": {"e": false}}"#;
        let pass = r#"if event.a == "b" and event.c == 10 and event.d.e == false then return true else return false end"#;
        assert!(filter_script(&rt, pass, &event(data)).unwrap());
        assert!(!filter_script(&rt, r#"return event.a == "x""#, &event(data)).unwrap());
    }

    #[test]
    fn test_empty_script_and_no_data_pass() {
        let rt = LuaRuntime::new();
        assert!(filter_script(&rt, "", &event("not json")).unwrap());
        let no_data = Event {
            context: None,
            data: None,
        };
        assert!(filter_script(&rt, "return false", &no_data).unwrap());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let rt = LuaRuntime::new();
        let err = filter_script(&rt, "return true", &event("not json")).unwrap_err();
        assert_eq!(err.to_string(), "script filter error (event data not valid JSON)");
    }

    #[test]
    fn test_script_failure_is_error() {
        let rt = LuaRuntime::new();
        let err = filter_script(&rt, "return event.x.y", &event("{}")).unwrap_err();
        assert_eq!(err.kind(), Some(FilterKind::Script));
    }
}
