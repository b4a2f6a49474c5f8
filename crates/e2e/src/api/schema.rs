//! Shape checks for JSON responses the typed models do not cover

use std::fmt;

use reqwest::Response;
use serde_json::Value;

use crate::error::{E2eError, E2eResult};

/// JSON value kind expected for a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Boolean,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonKind::Null => "null",
            JsonKind::Boolean => "boolean",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// Fail unless `value` is an object carrying every key in `keys`
pub fn require_properties(value: &Value, keys: &[&str]) -> E2eResult<()> {
    let object = value.as_object().ok_or_else(|| {
        E2eError::AssertionFailed(format!("expected an object, found {}", JsonKind::of(value)))
    })?;

    let missing: Vec<&str> = keys.iter().copied().filter(|k| !object.contains_key(*k)).collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!("missing properties: {}", missing.join(", "))))
    }
}

/// Fail unless every `(key, kind)` pair is present in `value` with that kind
pub fn validate_response_schema(value: &Value, schema: &[(&str, JsonKind)]) -> E2eResult<()> {
    let keys: Vec<&str> = schema.iter().map(|(k, _)| *k).collect();
    require_properties(value, &keys)?;

    for (key, kind) in schema {
        let actual = JsonKind::of(&value[*key]);
        if actual != *kind {
            return Err(E2eError::AssertionFailed(format!(
                "property '{}' should be {}, found {}",
                key, kind, actual
            )));
        }
    }
    Ok(())
}

/// Check an error response's status and, optionally, that its message mentions `expected_message`
///
/// The message is read from `error.message` or, failing that, a top-level `message`.
pub async fn validate_error_response(
    response: Response,
    expected_status: u16,
    expected_message: Option<&str>,
) -> E2eResult<()> {
    let status = response.status().as_u16();
    if status != expected_status {
        return Err(E2eError::AssertionFailed(format!(
            "expected status {}, got {}",
            expected_status, status
        )));
    }

    let Some(expected) = expected_message else {
        return Ok(());
    };

    let body: Value = response.json().await?;
    let message = body
        .pointer("/error/message")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    if message.contains(expected) {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(format!(
            "error message {:?} does not mention {:?}",
            message, expected
        )))
    }
}
