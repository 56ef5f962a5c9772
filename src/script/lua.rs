//! Lua runtime.

use mlua::{Lua, MultiValue, Table, Value as LuaValue};
use serde_json::{Map, Value};

use super::{ScriptPredicate, ScriptTransform};
use crate::error::ScriptError;
use crate::value::from_f64;

const LANGUAGE: &str = "lua";

/// Name of the global the input is bound to.
pub const EVENT_GLOBAL: &str = "event";

/// Nesting limit when converting tables back to JSON.
const MAX_DEPTH: usize = 128;

/// Lua 5.4 runtime with the input bound to the global `event`.
///
/// Every call creates a new interpreter that is dropped on return.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaRuntime;

impl LuaRuntime {
    /// Creates a runtime.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `script` and hands its last return value to `finish`.
    ///
    /// Tables only stay readable while the interpreter is alive, so every
    /// conversion happens inside `finish`.
    fn run<T>(
        script: &str,
        input: &Value,
        finish: impl FnOnce(Option<LuaValue>) -> Result<T, ScriptError>,
    ) -> Result<T, ScriptError> {
        let lua = Lua::new();
        let event = to_lua(&lua, input).map_err(runtime)?;
        lua.globals().set(EVENT_GLOBAL, event).map_err(runtime)?;
        let values: MultiValue = lua.load(script).eval().map_err(|e| match e {
            mlua::Error::SyntaxError { message, .. } => ScriptError::Compile {
                language: LANGUAGE,
                message,
            },
            other => runtime(other),
        })?;
        let result = finish(values.into_iter().last());
        drop(lua);
        result
    }
}

impl ScriptPredicate for LuaRuntime {
    fn evaluate(&self, script: &str, input: &Value) -> Result<bool, ScriptError> {
        Self::run(script, input, |last| Ok(matches!(last, Some(LuaValue::Boolean(true)))))
    }
}

impl ScriptTransform for LuaRuntime {
    fn transform(&self, program: &str, input: &Value) -> Result<Value, ScriptError> {
        Self::run(program, input, |last| match last {
            Some(LuaValue::Table(table)) => from_table(&table, 0),
            Some(_) => Err(ScriptError::UnexpectedOutput {
                language: LANGUAGE,
                expected: "a table",
            }),
            None => Err(ScriptError::NoOutput { language: LANGUAGE }),
        })
    }
}

#[allow(clippy::needless_pass_by_value)]
fn runtime(e: mlua::Error) -> ScriptError {
    ScriptError::Runtime {
        language: LANGUAGE,
        message: e.to_string(),
    }
}

fn to_lua(lua: &Lua, value: &Value) -> mlua::Result<LuaValue> {
    Ok(match value {
        Value::Null => LuaValue::Nil,
        Value::Bool(b) => LuaValue::Boolean(*b),
        Value::Number(n) => n.as_i64().map_or_else(
            || LuaValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            LuaValue::Integer,
        ),
        Value::String(s) => LuaValue::String(lua.create_string(s)?),
        Value::Array(items) => {
            let table = lua.create_table_with_capacity(items.len(), 0)?;
            for (i, item) in items.iter().enumerate() {
                table.raw_set(i + 1, to_lua(lua, item)?)?;
            }
            LuaValue::Table(table)
        }
        Value::Object(map) => {
            let table = lua.create_table_with_capacity(0, map.len())?;
            for (key, item) in map {
                table.raw_set(key.as_str(), to_lua(lua, item)?)?;
            }
            LuaValue::Table(table)
        }
    })
}

fn from_lua(value: LuaValue, depth: usize) -> Result<Value, ScriptError> {
    Ok(match value {
        LuaValue::Boolean(b) => Value::Bool(b),
        LuaValue::Integer(i) => Value::from(i),
        LuaValue::Number(f) => from_f64(f),
        LuaValue::String(s) => Value::String(String::from(s.to_string_lossy())),
        LuaValue::Table(table) => from_table(&table, depth + 1)?,
        _ => Value::Null,
    })
}

fn from_table(table: &Table, depth: usize) -> Result<Value, ScriptError> {
    if depth > MAX_DEPTH {
        return Err(ScriptError::Runtime {
            language: LANGUAGE,
            message: "table nesting too deep to convert".to_string(),
        });
    }

    let mut entries = Vec::new();
    for pair in table.pairs::<LuaValue, LuaValue>() {
        entries.push(pair.map_err(runtime)?);
    }

    if is_array(table, &entries) {
        let mut items = vec![Value::Null; entries.len()];
        for (key, item) in entries {
            if let LuaValue::Integer(i) = key {
                let slot = usize::try_from(i - 1).unwrap_or_default();
                if let Some(dest) = items.get_mut(slot) {
                    *dest = from_lua(item, depth)?;
                }
            }
        }
        return Ok(Value::Array(items));
    }

    let mut map = Map::with_capacity(entries.len());
    for (key, item) in entries {
        let key = match key {
            LuaValue::String(s) => String::from(s.to_string_lossy()),
            LuaValue::Integer(i) => i.to_string(),
            LuaValue::Number(f) => f.to_string(),
            LuaValue::Boolean(b) => b.to_string(),
            _ => continue,
        };
        map.insert(key, from_lua(item, depth)?);
    }
    Ok(Value::Object(map))
}

/// A table is an array when its metatable says so or its keys are exactly `1..=n`.
fn is_array(table: &Table, entries: &[(LuaValue, LuaValue)]) -> bool {
    let flagged = table
        .metatable()
        .and_then(|mt| mt.get::<Option<bool>>("__is_array").ok().flatten())
        .unwrap_or(false);
    if flagged {
        return true;
    }
    let n = entries.len();
    n > 0
        && entries.iter().all(|(key, _)| match key {
            LuaValue::Integer(i) => usize::try_from(*i).is_ok_and(|i| (1..=n).contains(&i)),
            _ => false,
        })
}
