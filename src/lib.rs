//! # sensorlogic - Decision core for event-driven triggers
//!
//! sensorlogic decides whether an event satisfies a dependency's filters,
//! rewrites accepted event data, and resolves trigger parameters from the
//! accepted events into a payload or a patched resource.
//!
//! ## Core Concepts
//!
//! - **Event**: a CloudEvents-style context plus an opaque data payload
//! - **Filter**: expr, data, context, time and script constraints combined with `and`/`or`
//! - **Transform**: a jq program or Lua script that rewrites event data
//! - **Trigger parameter**: a value pulled from an event and written at a path
//!
//! Every entry point is a pure function of its inputs; scripting and
//! template state is created per call.
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use sensorlogic::{
//!     construct_payload, filter, Comparator, DataFilter, Event, EventContext, EventDependencyFilter, JsonType,
//!     LogicalOperator, TriggerParameter, TriggerParameterSource,
//! };
//!
//! let event = Event::new(EventContext::new("webhook", "webhook"), r#"{"user": {"name": "ada"}, "retries": 3}"#);
//!
//! let spec = EventDependencyFilter {
//!     data: vec![DataFilter {
//!         path: "retries".to_string(),
//!         json_type: JsonType::Number,
//!         value: vec!["2".to_string()],
//!         comparator: Comparator::GreaterThan,
//!         template: None,
//!     }],
//!     ..EventDependencyFilter::default()
//! };
//! assert!(filter(&event, Some(&spec), LogicalOperator::And)?);
//!
//! let events = HashMap::from([("dep".to_string(), event)]);
//! let params = [TriggerParameter::new(TriggerParameterSource::data_key("dep", "user.name"), "name")];
//! assert_eq!(construct_payload(&events, &params)?, br#"{"name":"ada"}"#);
//! # Ok::<(), sensorlogic::SensorError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod error;
pub mod event;
pub mod value;

// Evaluation support
pub mod path;
pub mod script;
pub mod template;
pub mod time;

// Engines
pub mod filter;
pub mod params;
pub mod transform;
pub mod validation;

// Re-export primary types at crate root for convenience
pub use error::{
    FilterCause, FilterError, FilterKind, ParamError, PathError, ScriptError, SensorError, SensorResult,
    TemplateError, TransformError, ValidationError,
};
pub use event::{Event, EventContext};
pub use filter::{
    filter, filter_with, Comparator, ContextFilter, DataFilter, EventDependencyFilter, ExprFilter, JsonType,
    LogicalOperator, PayloadField, TimeFilter,
};
pub use params::{
    apply_params, apply_resource_parameters, apply_template_parameters, construct_payload, resolve_param_value,
    ResolvedValue, TriggerParameter, TriggerParameterOperation, TriggerParameterSource,
};
pub use script::{JqRuntime, LuaRuntime, ScriptPredicate, ScriptTransform};
pub use transform::{apply_transform, apply_transform_with, TransformSpec};
pub use value::ValueKind;
