//! Native attribute mapping → JSON-safe request body.

use super::KeepNulls;
use crate::shared::{camelize, Native};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Render a [`Native`] value as a request body.
///
/// Map keys are camelized, null-valued keys are dropped unless `keep` covers
/// them (paths use native names), dates become ISO-8601 strings, and
/// [`Native::Raw`] values are emitted untouched.
pub fn to_api(native: &Native, keep: &KeepNulls) -> Value {
    match native {
        Native::Null => Value::Null,
        Native::Bool(b) => Value::Bool(*b),
        Native::Int(i) => Value::from(*i),
        Native::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Native::String(s) => Value::String(s.clone()),
        Native::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        Native::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Native::List(items) => Value::Array(items.iter().map(|i| to_api(i, keep)).collect()),
        Native::Map(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                if value.is_null() && !keep.keeps(key) {
                    continue;
                }
                out.insert(camelize(key), to_api(value, &keep.descend(key)));
            }
            Value::Object(out)
        }
        Native::Raw(value) => value.clone(),
    }
}

/// [`to_api`] for any serde-serializable request type.
pub fn to_api_value<T: Serialize>(value: &T, keep: &KeepNulls) -> Result<Value, serde_json::Error> {
    Ok(to_api(&Native::from_serialize(value)?, keep))
}
