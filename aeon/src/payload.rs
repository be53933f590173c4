//! Conversion between models and the JSON bodies exchanged with observatories.
//!
//! Outgoing payloads drop absent fields rather than emitting `null`, and a
//! small field-name keyed table ([`OutputMapping`]) can switch individual time
//! fields from ISO strings to a numeric representation. Incoming payloads go
//! through `serde_path_to_error` so failures name the offending field.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::models::time::{TimeFormat, TimeValue};

/// Errors raised while producing or reading a payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("failed to serialize model: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid payload at {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot reformat field '{field}': {source}")]
    Format {
        field: String,
        #[source]
        source: ParseError,
    },
}

/// Per-field output representation overrides, keyed by field name.
///
/// A key matches at any depth of the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputMapping(BTreeMap<String, TimeFormat>);

impl OutputMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, format: TimeFormat) -> Self {
        self.0.insert(field.into(), format);
        self
    }

    /// LCO and SOAR expect orbital epochs as MJD numbers.
    pub fn lco() -> Self {
        Self::new()
            .with("epochofel", TimeFormat::Mjd)
            .with("epochofperih", TimeFormat::Mjd)
    }

    pub fn get(&self, field: &str) -> Option<TimeFormat> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialize `model` into a JSON object ready to send.
pub fn to_payload<T: Serialize>(
    model: &T,
    mapping: &OutputMapping,
) -> Result<Map<String, Value>, PayloadError> {
    let value = serde_json::to_value(model).map_err(PayloadError::Serialize)?;
    match value {
        Value::Object(mut map) => {
            shape_object(&mut map, mapping)?;
            Ok(map)
        }
        other => Err(PayloadError::NotAnObject(kind_name(&other))),
    }
}

fn shape_object(map: &mut Map<String, Value>, mapping: &OutputMapping) -> Result<(), PayloadError> {
    map.retain(|_, value| !value.is_null());
    for (key, value) in map.iter_mut() {
        match (mapping.get(key), &*value) {
            (Some(format), Value::String(text)) => {
                let time = TimeValue::parse(text).map_err(|source| PayloadError::Format {
                    field: key.clone(),
                    source,
                })?;
                *value = time.represent(format);
            }
            _ => shape_value(value, mapping)?,
        }
    }
    Ok(())
}

fn shape_value(value: &mut Value, mapping: &OutputMapping) -> Result<(), PayloadError> {
    match value {
        Value::Object(map) => shape_object(map, mapping),
        Value::Array(items) => items.iter_mut().try_for_each(|item| shape_value(item, mapping)),
        _ => Ok(()),
    }
}

/// Build a model from a parsed JSON body.
pub fn from_payload<T: DeserializeOwned>(payload: Value) -> Result<T, PayloadError> {
    serde_path_to_error::deserialize(payload).map_err(|err| PayloadError::Invalid {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

/// Build a model from raw JSON text.
pub fn from_json_str<T: DeserializeOwned>(text: &str) -> Result<T, PayloadError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| PayloadError::Invalid {
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

/// Deserialize one branch of a union, keeping the inner path in the message.
///
/// Used by the hand-written union deserializers, which buffer the input into a
/// [`Value`] to read the discriminator first.
pub(crate) fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        if path == "." {
            inner.to_string()
        } else {
            format!("{}: {}", path, inner)
        }
    })
}
