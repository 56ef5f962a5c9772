//! Writing resolved parameters into documents.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{resolve_param_value, ResolvedValue, TriggerParameter, TriggerParameterOperation};
use crate::error::{ParamError, PathError};
use crate::event::Event;
use crate::path;
use crate::value::text;

/// Builds a trigger payload from scratch.
///
/// A parameter with an empty `dest` that resolves to a value short-circuits:
/// that value, as is, is the whole payload. Parameters resolving to nothing
/// are skipped. Returns an empty payload when no parameter set anything.
///
/// # Errors
///
/// Returns `ParamError` when a parameter cannot be resolved or written.
pub fn construct_payload(
    events: &HashMap<String, Event>,
    parameters: &[TriggerParameter],
) -> Result<Vec<u8>, ParamError> {
    let mut payload: Option<Value> = None;
    for parameter in parameters {
        let Some(resolved) = resolve_param_value(&parameter.src, events)? else {
            continue;
        };
        if parameter.dest.is_empty() {
            return Ok(resolved.value.into_bytes());
        }
        let doc = payload.get_or_insert_with(|| Value::Object(Map::new()));
        write(doc, parameter, &resolved)?;
    }
    payload.map_or_else(|| Ok(Vec::new()), |doc| encode(&doc))
}

/// Applies `parameters` to the JSON document `document`.
///
/// # Errors
///
/// Returns `ParamError` when the document is not JSON, or a parameter cannot
/// be resolved or written.
pub fn apply_params(
    document: &[u8],
    parameters: &[TriggerParameter],
    events: &HashMap<String, Event>,
) -> Result<Vec<u8>, ParamError> {
    let mut doc: Value = serde_json::from_slice(document).map_err(|e| PathError::InvalidDocument {
        message: e.to_string(),
    })?;
    apply_to_value(&mut doc, parameters, events)?;
    encode(&doc)
}

/// Patches an unstructured resource in place.
///
/// # Errors
///
/// See [`apply_params`].
pub fn apply_resource_parameters(
    events: &HashMap<String, Event>,
    parameters: &[TriggerParameter],
    resource: &mut Value,
) -> Result<(), ParamError> {
    apply_to_value(resource, parameters, events)
}

/// Returns a copy of `template` with `parameters` applied.
///
/// The template is converted to JSON, patched and converted back, so the
/// patched document must still fit `T`.
///
/// # Errors
///
/// Returns `ParamError::Resource` when the conversion fails in either
/// direction, and see [`apply_params`].
pub fn apply_template_parameters<T>(
    events: &HashMap<String, Event>,
    parameters: &[TriggerParameter],
    template: &T,
) -> Result<T, ParamError>
where
    T: Serialize + DeserializeOwned,
{
    let mut doc = serde_json::to_value(template).map_err(resource_error)?;
    apply_to_value(&mut doc, parameters, events)?;
    serde_json::from_value(doc).map_err(resource_error)
}

fn apply_to_value(
    doc: &mut Value,
    parameters: &[TriggerParameter],
    events: &HashMap<String, Event>,
) -> Result<(), ParamError> {
    for parameter in parameters {
        let Some(mut resolved) = resolve_param_value(&parameter.src, events)? else {
            continue;
        };
        match parameter.operation {
            TriggerParameterOperation::Append | TriggerParameterOperation::Prepend => {
                if let Some(current) = path::get(doc, &parameter.dest) {
                    let current = text(&current);
                    resolved = ResolvedValue::string(if parameter.operation == TriggerParameterOperation::Append {
                        current + &resolved.value
                    } else {
                        resolved.value + &current
                    });
                }
            }
            TriggerParameterOperation::None | TriggerParameterOperation::Overwrite => {}
        }
        write(doc, parameter, &resolved)?;
    }
    Ok(())
}

fn write(doc: &mut Value, parameter: &TriggerParameter, resolved: &ResolvedValue) -> Result<(), ParamError> {
    let value = if resolved.is_raw(parameter.src.use_raw_data) {
        serde_json::from_str(&resolved.value).map_err(|e| ParamError::InvalidRawValue {
            dest: parameter.dest.clone(),
            message: e.to_string(),
        })?
    } else {
        Value::String(resolved.value.clone())
    };
    path::set(doc, &parameter.dest, value)?;
    Ok(())
}

fn encode(doc: &Value) -> Result<Vec<u8>, ParamError> {
    serde_json::to_vec(doc).map_err(resource_error)
}

#[allow(clippy::needless_pass_by_value)]
fn resource_error(err: serde_json::Error) -> ParamError {
    ParamError::Resource {
        message: err.to_string(),
    }
}
