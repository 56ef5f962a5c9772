//! jq runtime.

use jaq_interpret::{Ctx, FilterT, ParseCtx, RcIter, Val};
use serde_json::Value;

use super::ScriptTransform;
use crate::error::ScriptError;

const LANGUAGE: &str = "jq";

/// jq runtime backed by jaq with the standard library loaded.
///
/// Only the first value a program emits is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct JqRuntime;

impl JqRuntime {
    /// Creates a runtime.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ScriptTransform for JqRuntime {
    fn transform(&self, program: &str, input: &Value) -> Result<Value, ScriptError> {
        let mut defs = ParseCtx::new(Vec::new());
        defs.insert_natives(jaq_core::core());
        defs.insert_defs(jaq_std::std());

        let (main, errs) = jaq_parse::parse(program, jaq_parse::main());
        let main = match main {
            Some(main) if errs.is_empty() => main,
            _ => {
                let message = errs
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ScriptError::Compile {
                    language: LANGUAGE,
                    message,
                });
            }
        };
        let filter = defs.compile(main);
        if !defs.errs.is_empty() {
            return Err(ScriptError::Compile {
                language: LANGUAGE,
                message: format!("{} undefined symbol(s) in program", defs.errs.len()),
            });
        }

        let inputs = RcIter::new(core::iter::empty());
        let mut out = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));
        match out.next() {
            Some(Ok(val)) => Ok(Value::from(val)),
            Some(Err(e)) => Err(ScriptError::Runtime {
                language: LANGUAGE,
                message: e.to_string(),
            }),
            None => Err(ScriptError::NoOutput { language: LANGUAGE }),
        }
    }
}
