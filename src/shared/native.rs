//! Native value tree used on the request side.
//!
//! JSON has no date type and no way to mark a value as pre-formatted, so
//! request bodies are built as [`Native`] values and rendered to JSON by
//! [`crate::mapping::to_api`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute name → value, keyed by native (snake_case) names.
pub type NativeMap = BTreeMap<String, Native>;

#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    List(Vec<Native>),
    Map(NativeMap),
    /// Sent exactly as given: no key camelization, no null stripping.
    Raw(Value),
}

impl Native {
    pub fn is_null(&self) -> bool {
        matches!(self, Native::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Native::Null => "null",
            Native::Bool(_) => "bool",
            Native::Int(_) => "int",
            Native::Float(_) => "float",
            Native::String(_) => "string",
            Native::Date(_) => "date",
            Native::DateTime(_) => "datetime",
            Native::List(_) => "list",
            Native::Map(_) => "map",
            Native::Raw(_) => "raw",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Native::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a map from `(key, value)` pairs.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Native>,
        I: IntoIterator<Item = (K, V)>,
    {
        Native::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Convert any serde-serializable value. Dates serialized by chrono end up
    /// as strings, which is already their wire form.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(serde_json::to_value(value)?.into())
    }
}

impl From<Value> for Native {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Native::Null,
            Value::Bool(b) => Native::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Native::Int(i),
                None => Native::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Native::String(s),
            Value::Array(items) => Native::List(items.into_iter().map(Native::from).collect()),
            Value::Object(map) => {
                Native::Map(map.into_iter().map(|(k, v)| (k, Native::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Native {
    fn from(v: bool) -> Self {
        Native::Bool(v)
    }
}

impl From<i64> for Native {
    fn from(v: i64) -> Self {
        Native::Int(v)
    }
}

impl From<i32> for Native {
    fn from(v: i32) -> Self {
        Native::Int(v as i64)
    }
}

impl From<u32> for Native {
    fn from(v: u32) -> Self {
        Native::Int(v as i64)
    }
}

impl From<f64> for Native {
    fn from(v: f64) -> Self {
        Native::Float(v)
    }
}

impl From<&str> for Native {
    fn from(v: &str) -> Self {
        Native::String(v.to_string())
    }
}

impl From<String> for Native {
    fn from(v: String) -> Self {
        Native::String(v)
    }
}

impl From<NaiveDate> for Native {
    fn from(v: NaiveDate) -> Self {
        Native::Date(v)
    }
}

impl From<DateTime<Utc>> for Native {
    fn from(v: DateTime<Utc>) -> Self {
        Native::DateTime(v)
    }
}

impl<T: Into<Native>> From<Vec<T>> for Native {
    fn from(v: Vec<T>) -> Self {
        Native::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Native>> From<Option<T>> for Native {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Native::Null)
    }
}

impl From<NativeMap> for Native {
    fn from(v: NativeMap) -> Self {
        Native::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_value() {
        let native = Native::from(json!({"a": 1, "b": [true, null], "c": 1.5}));
        let Native::Map(map) = native else {
            panic!("expected map");
        };
        assert_eq!(map["a"], Native::Int(1));
        assert_eq!(map["b"], Native::List(vec![Native::Bool(true), Native::Null]));
        assert_eq!(map["c"], Native::Float(1.5));
    }

    #[test]
    fn test_option_none_is_null() {
        let v: Native = Option::<String>::None.into();
        assert!(v.is_null());
        let v: Native = Some("x").into();
        assert_eq!(v.as_str(), Some("x"));
    }
}
