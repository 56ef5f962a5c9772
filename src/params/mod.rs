//! Trigger parameters.
//!
//! A trigger parameter pulls one value out of the events accepted for a
//! dependency ([`resolve_param_value`]) and writes it into a destination
//! document ([`construct_payload`], [`apply_params`]).
//!
//! Resolution order for a dependency that has an event:
//!
//! 1. No key and no template: the default value, or else the whole event.
//! 2. A template on the selected side (data wins over context), rendered
//!    with the side bound as `Input`.
//! 3. A key on the selected side, looked up with [`crate::path::get`].
//! 4. The default value.
//!
//! A dependency without an event resolves to its default value, or to
//! nothing at all. Nothing is not an error: the parameter is skipped.

mod apply;

pub use apply::{apply_params, apply_resource_parameters, apply_template_parameters, construct_payload};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParamError;
use crate::event::Event;
use crate::path;
use crate::template;
use crate::value::{text, ValueKind};

/// Where a parameter value comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerParameterSource {
    /// Dependency whose event supplies the value.
    pub dependency_name: String,
    /// Path into the serialized event context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_key: Option<String>,
    /// Template over the serialized event context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_template: Option<String>,
    /// Path into the event data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
    /// Template over the event data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_template: Option<String>,
    /// Default used when nothing else resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Inject non-string values with their JSON type instead of as strings.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub use_raw_data: bool,
}

impl TriggerParameterSource {
    /// A source reading `key` from the data of `dependency`'s event.
    #[must_use]
    pub fn data_key(dependency: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            dependency_name: dependency.into(),
            data_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// A source reading `key` from the context of `dependency`'s event.
    #[must_use]
    pub fn context_key(dependency: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            dependency_name: dependency.into(),
            context_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Requests raw injection of non-string values.
    #[must_use]
    pub const fn with_raw_data(mut self) -> Self {
        self.use_raw_data = true;
        self
    }

    fn data_selector(&self) -> Option<Selector<'_>> {
        Selector::new(self.data_key.as_deref(), self.data_template.as_deref())
    }

    fn context_selector(&self) -> Option<Selector<'_>> {
        Selector::new(self.context_key.as_deref(), self.context_template.as_deref())
    }
}

/// How a resolved value is combined with the value already at the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerParameterOperation {
    /// Replace. The empty string on the wire means the same.
    #[default]
    #[serde(rename = "", alias = "none")]
    None,
    /// Existing text followed by the new value.
    #[serde(rename = "append")]
    Append,
    /// New value followed by the existing text.
    #[serde(rename = "prepend")]
    Prepend,
    /// Replace.
    #[serde(rename = "overwrite")]
    Overwrite,
}

/// A source and the path its value is written to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerParameter {
    /// Where the value comes from.
    pub src: TriggerParameterSource,
    /// Destination path. Empty means the value is the whole payload.
    pub dest: String,
    /// How to combine with the existing value.
    #[serde(skip_serializing_if = "is_default_operation")]
    pub operation: TriggerParameterOperation,
}

fn is_default_operation(operation: &TriggerParameterOperation) -> bool {
    *operation == TriggerParameterOperation::None
}

impl TriggerParameter {
    /// Creates a parameter that replaces the value at `dest`.
    #[must_use]
    pub fn new(src: TriggerParameterSource, dest: impl Into<String>) -> Self {
        Self {
            src,
            dest: dest.into(),
            operation: TriggerParameterOperation::None,
        }
    }

    /// Sets the operation.
    #[must_use]
    pub const fn with_operation(mut self, operation: TriggerParameterOperation) -> Self {
        self.operation = operation;
        self
    }
}

/// A resolved parameter value and the shape it had in its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// Text of the value; compact JSON for objects and arrays.
    pub value: String,
    /// Shape of the value. Defaults and template output are strings.
    pub kind: ValueKind,
}

impl ResolvedValue {
    /// A string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: ValueKind::String,
        }
    }

    /// Whether the value should be injected with its JSON type.
    #[must_use]
    pub const fn is_raw(&self, use_raw_data: bool) -> bool {
        use_raw_data && self.kind.is_raw()
    }
}

#[derive(Debug, Clone, Copy)]
struct Selector<'a> {
    key: Option<&'a str>,
    template: Option<&'a str>,
}

impl<'a> Selector<'a> {
    fn new(key: Option<&'a str>, template: Option<&'a str>) -> Option<Self> {
        let key = key.filter(|k| !k.is_empty());
        let template = template.filter(|t| !t.is_empty());
        (key.is_some() || template.is_some()).then_some(Self { key, template })
    }
}

/// Resolves the value of `src` against the accepted events.
///
/// Returns `Ok(None)` when the dependency has no event and no default.
///
/// # Errors
///
/// Returns `ParamError` when the event exists but neither its template, its
/// key nor a default value produce a value, or when the event payload cannot
/// be rendered and there is no default.
pub fn resolve_param_value(
    src: &TriggerParameterSource,
    events: &HashMap<String, Event>,
) -> Result<Option<ResolvedValue>, ParamError> {
    let Some(event) = events.get(&src.dependency_name) else {
        return Ok(src.value.as_deref().map(ResolvedValue::string));
    };

    let (selector, payload) = if let Some(selector) = src.data_selector() {
        (selector, event.data_as_json())
    } else if let Some(selector) = src.context_selector() {
        (selector, serialize_context(event))
    } else {
        return whole_event(src, event).map(Some);
    };

    let doc = match payload.and_then(|bytes| parse_payload(&bytes)) {
        Ok(doc) => doc,
        Err(err) => {
            return match src.value.as_deref() {
                Some(default) => {
                    tracing::debug!(
                        dependency = %src.dependency_name,
                        error = %err,
                        "failed to render the event payload, using the default value"
                    );
                    Ok(Some(ResolvedValue::string(default)))
                }
                None => Err(err),
            };
        }
    };

    let mut reason = String::from("no template, key or default value produced a value");

    if let Some(tpl) = selector.template {
        match template::render(tpl, &doc) {
            Ok(rendered) => return Ok(Some(ResolvedValue::string(rendered))),
            Err(err) => {
                tracing::debug!(
                    dependency = %src.dependency_name,
                    error = %err,
                    "parameter template failed, falling back to key or default value"
                );
                reason = err.to_string();
            }
        }
    }

    if let Some(key) = selector.key {
        match path::get(&doc, key) {
            Some(found) => return Ok(Some(by_kind(&found))),
            None => {
                tracing::debug!(dependency = %src.dependency_name, key, "parameter key not found in event payload");
                reason = format!("key '{key}' does not exist in the event payload");
            }
        }
    }

    match src.value.as_deref() {
        Some(default) => Ok(Some(ResolvedValue::string(default))),
        None => Err(ParamError::Unresolved {
            dependency: src.dependency_name.clone(),
            reason,
        }),
    }
}

fn whole_event(src: &TriggerParameterSource, event: &Event) -> Result<ResolvedValue, ParamError> {
    if let Some(default) = src.value.as_deref() {
        return Ok(ResolvedValue::string(default));
    }
    let serialized = serde_json::to_string(event).map_err(|e| ParamError::Payload {
        message: e.to_string(),
    })?;
    Ok(ResolvedValue::string(serialized))
}

fn serialize_context(event: &Event) -> Result<Vec<u8>, ParamError> {
    serde_json::to_vec(&event.context).map_err(|e| ParamError::Payload {
        message: e.to_string(),
    })
}

fn parse_payload(bytes: &[u8]) -> Result<Value, ParamError> {
    serde_json::from_slice(bytes).map_err(|e| ParamError::Payload {
        message: e.to_string(),
    })
}

fn by_kind(found: &Value) -> ResolvedValue {
    let kind = ValueKind::of(found);
    let value = match kind {
        ValueKind::Null => "null".to_string(),
        _ => text(found),
    };
    ResolvedValue { value, kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventContext, MEDIA_TYPE_YAML};

    fn events(data: &str) -> HashMap<String, Event> {
        let ctx = EventContext::new("webhook", "calendar").with_subject("example-1");
        HashMap::from([("dep".to_string(), Event::new(ctx, data))])
    }

    const DATA: &str = r#"{"name": {"first": "fake", "last": "user"}, "age": 30, "active": true, "gone": null}"#;

    #[test]
    fn test_absent_dependency() {
        let src = TriggerParameterSource::data_key("other", "name.first");
        assert_eq!(resolve_param_value(&src, &events(DATA)).unwrap(), None);

        let src = src.with_value("fallback");
        assert_eq!(
            resolve_param_value(&src, &events(DATA)).unwrap(),
            Some(ResolvedValue::string("fallback"))
        );
    }

    #[test]
    fn test_data_key_kinds() {
        let ev = events(DATA);
        let resolve = |key: &str| {
            resolve_param_value(&TriggerParameterSource::data_key("dep", key), &ev)
                .unwrap()
                .unwrap()
        };
        assert_eq!(resolve("name.first"), ResolvedValue::string("fake"));
        assert_eq!(
            resolve("name"),
            ResolvedValue {
                value: r#"{"first":"fake","last":"user"}"#.to_string(),
                kind: ValueKind::Json
            }
        );
        assert_eq!(resolve("age").kind, ValueKind::Number);
        assert_eq!(resolve("age").value, "30");
        assert_eq!(resolve("active").kind, ValueKind::Bool);
        assert_eq!(
            resolve("gone"),
            ResolvedValue {
                value: "null".to_string(),
                kind: ValueKind::Null
            }
        );
    }

    #[test]
    fn test_context_key() {
        let src = TriggerParameterSource::context_key("dep", "subject");
        let resolved = resolve_param_value(&src, &events(DATA)).unwrap().unwrap();
        assert_eq!(resolved, ResolvedValue::string("example-1"));
    }

    #[test]
    fn test_data_wins_over_context() {
        let src = TriggerParameterSource {
            context_key: Some("subject".to_string()),
            ..TriggerParameterSource::data_key("dep", "name.last")
        };
        let resolved = resolve_param_value(&src, &events(DATA)).unwrap().unwrap();
        assert_eq!(resolved.value, "user");
    }

    #[test]
    fn test_template_then_key_then_default() {
        let mut src = TriggerParameterSource::data_key("dep", "name.last");
        src.data_template = Some("{{upper Input.name.first}}".to_string());
        let ev = events(DATA);
        assert_eq!(resolve_param_value(&src, &ev).unwrap().unwrap().value, "FAKE");

        src.data_template = Some("{{Input.missing}}".to_string());
        assert_eq!(resolve_param_value(&src, &ev).unwrap().unwrap().value, "user");

        src.data_key = Some("missing".to_string());
        let err = resolve_param_value(&src, &ev).unwrap_err();
        assert!(matches!(err, ParamError::Unresolved { ref dependency, .. } if dependency == "dep"));

        let src = src.with_value("default");
        assert_eq!(
            resolve_param_value(&src, &ev).unwrap(),
            Some(ResolvedValue::string("default"))
        );
    }

    #[test]
    fn test_template_output_is_string() {
        let src = TriggerParameterSource {
            dependency_name: "dep".to_string(),
            data_template: Some("{{Input.age}}".to_string()),
            use_raw_data: true,
            ..TriggerParameterSource::default()
        };
        assert_eq!(
            resolve_param_value(&src, &events(DATA)).unwrap(),
            Some(ResolvedValue::string("30"))
        );
    }

    #[test]
    fn test_no_selector_returns_default_or_whole_event() {
        let ev = events(DATA);
        let src = TriggerParameterSource {
            dependency_name: "dep".to_string(),
            ..TriggerParameterSource::default()
        };
        let resolved = resolve_param_value(&src, &ev).unwrap().unwrap();
        assert_eq!(resolved.kind, ValueKind::String);
        let round_trip: Event = serde_json::from_str(&resolved.value).unwrap();
        assert_eq!(round_trip, ev["dep"]);

        let src = src.with_value("fixed");
        assert_eq!(resolve_param_value(&src, &ev).unwrap().unwrap().value, "fixed");
    }

    #[test]
    fn test_unrenderable_payload() {
        let mut ev = events("not json");
        let src = TriggerParameterSource::data_key("dep", "a");
        assert!(matches!(
            resolve_param_value(&src, &ev).unwrap_err(),
            ParamError::Payload { .. }
        ));
        let src = src.with_value("d");
        assert_eq!(resolve_param_value(&src, &ev).unwrap().unwrap().value, "d");

        if let Some(event) = ev.get_mut("dep") {
            event.data = Some(b"a: from-yaml\n".to_vec());
            if let Some(ctx) = event.context.as_mut() {
                ctx.data_content_type = MEDIA_TYPE_YAML.to_string();
            }
        }
        let src = TriggerParameterSource::data_key("dep", "a");
        assert_eq!(resolve_param_value(&src, &ev).unwrap().unwrap().value, "from-yaml");
    }

    #[test]
    fn test_wire_format() {
        let param: TriggerParameter = serde_json::from_value(serde_json::json!({
            "src": {"dependencyName": "dep", "dataKey": "a.b", "value": "x", "useRawData": true},
            "dest": "spec.name",
            "operation": "append"
        }))
        .unwrap();
        assert_eq!(param.src.data_key.as_deref(), Some("a.b"));
        assert!(param.src.use_raw_data);
        assert_eq!(param.operation, TriggerParameterOperation::Append);

        let op: TriggerParameterOperation = serde_json::from_str(r#""none""#).unwrap();
        assert_eq!(op, TriggerParameterOperation::None);
        let op: TriggerParameterOperation = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(op, TriggerParameterOperation::None);
        assert!(serde_json::from_str::<TriggerParameterOperation>(r#""merge""#).is_err());
    }
}
