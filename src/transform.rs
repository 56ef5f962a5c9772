//! Event data transforms.
//!
//! A transform rewrites the data of an accepted event with either a jq
//! program or a Lua script. jq takes precedence when both are configured.
//! The result replaces the data and the content type becomes JSON; the rest
//! of the event context is left alone.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ScriptError, TransformError};
use crate::event::{Event, MEDIA_TYPE_JSON};
use crate::script::{JqRuntime, LuaRuntime, ScriptTransform};

/// How to rewrite event data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSpec {
    /// jq program; its first output must be an object.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub jq: String,
    /// Lua script with the data bound as `event`; must return a table.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub script: String,
}

impl TransformSpec {
    /// A jq transform.
    #[must_use]
    pub fn jq(program: impl Into<String>) -> Self {
        Self {
            jq: program.into(),
            script: String::new(),
        }
    }

    /// A Lua transform.
    #[must_use]
    pub fn script(script: impl Into<String>) -> Self {
        Self {
            jq: String::new(),
            script: script.into(),
        }
    }
}

/// Applies `transform` to `event` with the default jq and Lua runtimes.
///
/// # Errors
///
/// Returns `TransformError` when the data is not JSON or the program fails.
pub fn apply_transform(event: &Event, transform: Option<&TransformSpec>) -> Result<Event, TransformError> {
    apply_transform_with(&JqRuntime::new(), &LuaRuntime::new(), event, transform)
}

/// Applies `transform` to `event` using the given runtimes.
///
/// # Errors
///
/// See [`apply_transform`].
pub fn apply_transform_with(
    jq: &dyn ScriptTransform,
    lua: &dyn ScriptTransform,
    event: &Event,
    transform: Option<&TransformSpec>,
) -> Result<Event, TransformError> {
    let Some(spec) = transform else {
        return Ok(event.clone());
    };
    let Some(payload) = event.payload() else {
        return Ok(event.clone());
    };

    let output = if !spec.jq.is_empty() {
        let input = parse(payload)?;
        let output = jq.transform(&spec.jq, &input)?;
        if !output.is_object() {
            return Err(ScriptError::UnexpectedOutput {
                language: "jq",
                expected: "a JSON object",
            }
            .into());
        }
        output
    } else if !spec.script.is_empty() {
        let input = parse(payload)?;
        lua.transform(&spec.script, &input)?
    } else {
        return Ok(event.clone());
    };

    let data = serde_json::to_vec(&output).map_err(|e| TransformError::Encode { message: e.to_string() })?;
    let mut transformed = event.clone();
    if let Some(ctx) = transformed.context.as_mut() {
        ctx.data_content_type = MEDIA_TYPE_JSON.to_string();
    }
    transformed.data = Some(data);
    tracing::debug!(
        event_id = event.context.as_ref().map_or("", |c| c.id.as_str()),
        language = if spec.jq.is_empty() { "lua" } else { "jq" },
        "transformed event data"
    );
    Ok(transformed)
}

fn parse(payload: &[u8]) -> Result<Value, TransformError> {
    serde_json::from_slice(payload).map_err(|e| TransformError::InvalidJson { message: e.to_string() })
}
