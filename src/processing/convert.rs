//! Ready-made field functions.
//!
//! These cover the conversions most CSV pipelines start with. Any closure can be used instead via
//! [`super::field_fn`].

use thiserror::Error;

use crate::types::{DataType, Value};

use super::{field_fn, FieldFn};

/// Failure of a built-in conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{raw}' to {target:?}: {message}")]
pub struct ConvertError {
    pub raw: String,
    pub target: DataType,
    pub message: String,
}

/// Cast a value to `data_type`.
///
/// Strings are trimmed before parsing; an empty string becomes [`Value::Null`]. Values that
/// already have the target type pass through, and integers widen to floats.
pub fn cast(data_type: DataType) -> FieldFn {
    field_fn(move |v: Value| cast_value(v, data_type))
}

/// Trim surrounding whitespace from string values.
pub fn trim() -> FieldFn {
    map_str(|s| s.trim().to_owned())
}

pub fn upper() -> FieldFn {
    map_str(str::to_uppercase)
}

pub fn lower() -> FieldFn {
    map_str(str::to_lowercase)
}

/// Replace every occurrence of `from` with `to` in string values.
pub fn replace(from: impl Into<String>, to: impl Into<String>) -> FieldFn {
    let from = from.into();
    let to = to.into();
    map_str(move |s| s.replace(from.as_str(), to.as_str()))
}

/// Replace [`Value::Null`] with `default`.
pub fn default_if_null(default: impl Into<Value>) -> FieldFn {
    let default = default.into();
    field_fn(move |v: Value| {
        Ok::<_, ConvertError>(if v.is_null() { default.clone() } else { v })
    })
}

/// Apply `f` to string values; other values pass through.
fn map_str<F>(f: F) -> FieldFn
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    field_fn(move |v: Value| {
        Ok::<_, ConvertError>(match v {
            Value::Utf8(s) => Value::Utf8(f(&s)),
            other => other,
        })
    })
}

/// Convert one value to `data_type`. See [`cast`].
pub fn cast_value(value: Value, data_type: DataType) -> Result<Value, ConvertError> {
    let raw = match value {
        Value::Null => return Ok(Value::Null),
        Value::Utf8(s) => s,
        Value::Int64(v) if data_type == DataType::Float64 => return Ok(Value::Float64(v as f64)),
        other if other.data_type() == Some(data_type) => return Ok(other),
        other if data_type == DataType::Utf8 => return Ok(Value::Utf8(other.to_string())),
        other => other.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let err = |message: String| ConvertError {
        raw: raw.clone(),
        target: data_type,
        message,
    };

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| err(e.to_string())),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| err(e.to_string())),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool).map_err(err),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}
