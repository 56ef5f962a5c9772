//! Embedded scripting capabilities.
//!
//! Script filters and transforms do not depend on a particular interpreter.
//! They see one of two capabilities:
//!
//! - [`ScriptPredicate`]: run a program against a JSON value and get a verdict
//! - [`ScriptTransform`]: run a program against a JSON value and get a new value
//!
//! [`LuaRuntime`] provides both, [`JqRuntime`] provides transforms. Each call
//! builds fresh interpreter state and drops it before returning, so runtimes
//! are stateless and may be shared freely across threads.

mod jq;
mod lua;

pub use jq::JqRuntime;
pub use lua::LuaRuntime;

use serde_json::Value;

use crate::error::ScriptError;

/// Evaluates a program to a boolean verdict.
pub trait ScriptPredicate: Send + Sync {
    /// Runs `script` with `input` exposed to it and reports whether it accepted.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError` when the program fails to compile or run.
    fn evaluate(&self, script: &str, input: &Value) -> Result<bool, ScriptError>;
}

/// Maps one JSON value to another.
pub trait ScriptTransform: Send + Sync {
    /// Runs `program` against `input` and returns its result.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError` when the program fails or produces no usable output.
    fn transform(&self, program: &str, input: &Value) -> Result<Value, ScriptError>;
}
