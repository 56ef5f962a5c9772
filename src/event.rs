//! Event model.
//!
//! An [`Event`] is a CloudEvents-style metadata envelope ([`EventContext`])
//! plus an opaque data payload. The payload is usually JSON but may be any
//! byte string; only the filters and transforms that inspect structure care.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParamError;

/// Media type for JSON payloads.
pub const MEDIA_TYPE_JSON: &str = "application/json";

/// Media type for YAML payloads.
pub const MEDIA_TYPE_YAML: &str = "application/yaml";

/// Metadata describing where an event came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventContext {
    /// Unique identifier of the occurrence.
    pub id: String,
    /// The event source (e.g. the producing event source name).
    pub source: String,
    /// CloudEvents spec version.
    #[serde(rename = "specversion")]
    pub spec_version: String,
    /// The type of occurrence.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Media type of `data`.
    #[serde(rename = "datacontenttype")]
    pub data_content_type: String,
    /// Subject of the event in the context of the source.
    pub subject: String,
    /// When the occurrence happened.
    pub time: DateTime<Utc>,
}

impl EventContext {
    /// Creates a context with a fresh id and the current time.
    #[must_use]
    pub fn new(source: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            spec_version: "1.0".to_string(),
            event_type: event_type.into(),
            data_content_type: MEDIA_TYPE_JSON.to_string(),
            subject: String::new(),
            time: Utc::now(),
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the data content type.
    #[must_use]
    pub fn with_data_content_type(mut self, data_content_type: impl Into<String>) -> Self {
        self.data_content_type = data_content_type.into();
        self
    }

    /// Sets the event time.
    #[must_use]
    pub const fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// The media type of `data_content_type` without parameters.
    #[must_use]
    pub fn media_type(&self) -> String {
        self.data_content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

/// An event attached to a dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Metadata envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EventContext>,
    /// Raw payload; base64 on the wire.
    #[serde(default, with = "data_encoding")]
    pub data: Option<Vec<u8>>,
}

impl Event {
    /// Creates an event from a context and a payload.
    #[must_use]
    pub fn new(context: EventContext, data: impl Into<Vec<u8>>) -> Self {
        Self {
            context: Some(context),
            data: Some(data.into()),
        }
    }

    /// The payload, treating an empty payload like a missing one.
    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.data.as_deref().filter(|d| !d.is_empty())
    }

    /// Parses the payload as JSON, if present.
    ///
    /// Returns `Ok(None)` when the event carries no payload.
    ///
    /// # Errors
    ///
    /// Returns the parser error when the payload is not valid JSON.
    pub fn data_value(&self) -> Result<Option<serde_json::Value>, serde_json::Error> {
        self.data
            .as_deref()
            .map(serde_json::from_slice)
            .transpose()
    }

    /// Renders the payload as JSON according to its declared media type.
    ///
    /// JSON payloads are validated and returned as-is; YAML payloads are
    /// converted.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::Payload` when the media type is unsupported or
    /// the payload does not parse.
    pub fn data_as_json(&self) -> Result<Vec<u8>, ParamError> {
        let raw = self.data.as_deref().unwrap_or_default();
        let media_type = self.context.as_ref().map(EventContext::media_type).unwrap_or_default();
        match media_type.as_str() {
            MEDIA_TYPE_JSON => {
                serde_json::from_slice::<serde::de::IgnoredAny>(raw).map_err(|_| ParamError::Payload {
                    message: "event data is not valid JSON".to_string(),
                })?;
                Ok(raw.to_vec())
            }
            MEDIA_TYPE_YAML => {
                let value: serde_json::Value = serde_yaml::from_slice(raw).map_err(|e| ParamError::Payload {
                    message: format!("failed converting yaml event data to JSON: {e}"),
                })?;
                serde_json::to_vec(&value).map_err(|e| ParamError::Payload {
                    message: e.to_string(),
                })
            }
            other => Err(ParamError::Payload {
                message: format!("unsupported event content type: '{other}'"),
            }),
        }
    }
}

mod data_encoding {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|e| STANDARD.decode(e).map_err(serde::de::Error::custom))
            .transpose()
    }
}
